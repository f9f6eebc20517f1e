use tracing::debug;

use crate::errors::ConfigError;
use crate::model::*;
use crate::overrides::{KeyOverrides, StemOverrides};

/// Configuration layers, in the order they must be applied. Later layers
/// win field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Global,
    Base,
    Key,
    Modifier,
}

/// Folds configuration layers into a [`KeyConfig`].
///
/// Layers must arrive in [`Layer`] order. Only `Modifier` may repeat; the
/// others appear at most once.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    merged: KeyOverrides,
    last: Option<Layer>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, layer: Layer, overrides: &KeyOverrides) -> Result<Self, ConfigError> {
        if let Some(after) = self.last {
            let repeatable = layer == Layer::Modifier && after == Layer::Modifier;
            if layer < after || (layer == after && !repeatable) {
                return Err(ConfigError::LayerOrder { layer, after });
            }
        }
        self.merged.overlay(overrides);
        self.last = Some(layer);
        Ok(self)
    }

    /// The merged overlay so far.
    pub fn merged(&self) -> &KeyOverrides {
        &self.merged
    }

    /// Resolve the merged layers, check every value and convert slopes to
    /// radians.
    pub fn build(&self) -> Result<KeyConfig, ConfigError> {
        let m = &self.merged;
        let config = KeyConfig {
            tolerance: require(m.tolerance, "tolerance")?,
            tight_tolerance: require(m.tight_tolerance, "tight_tolerance")?,
            wall: require(m.wall, "wall")?,
            inner_radius: require(m.inner_radius, "inner_radius")?,
            corner_radius: require(m.corner_radius, "corner_radius")?,
            back_slope: slope(m.back_slope, "back_slope")?,
            front_slope: slope(m.front_slope, "front_slope")?,
            side_slope: slope(m.side_slope, "side_slope")?,
            back_curve: require(m.back_curve, "back_curve")?,
            front_curve: require(m.front_curve, "front_curve")?,
            front_rise: require(m.front_rise, "front_rise")?,
            back_rise: require(m.back_rise, "back_rise")?,
            height: require(m.height, "height")?,
            width: require(m.width, "width")?,
            bump: m.bump.unwrap_or(false),
            stem: resolve_stem(m.stem.as_ref())?,
        };
        validate(&config)?;
        debug!(stem = config.stem.kind(), "resolved key configuration");
        Ok(config)
    }
}

fn require(value: Option<f64>, field: &'static str) -> Result<f64, ConfigError> {
    let v = value.ok_or(ConfigError::MissingField { field })?;
    if !v.is_finite() {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("{v} is not finite"),
        });
    }
    Ok(v)
}

fn slope(value: Option<f64>, field: &'static str) -> Result<f64, ConfigError> {
    let degrees = require(value, field)?;
    if degrees.abs() >= 90.0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("{degrees} degrees is not strictly between -90 and 90"),
        });
    }
    Ok(degrees.to_radians())
}

fn positive(value: f64, field: &'static str) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} must be greater than zero"),
        })
    }
}

fn non_negative(value: f64, field: &'static str) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} must not be negative"),
        })
    }
}

fn validate(c: &KeyConfig) -> Result<(), ConfigError> {
    positive(c.height, "height")?;
    positive(c.width, "width")?;
    non_negative(c.wall, "wall")?;
    non_negative(c.inner_radius, "inner_radius")?;
    non_negative(c.corner_radius, "corner_radius")?;
    non_negative(c.tolerance, "tolerance")?;
    non_negative(c.tight_tolerance, "tight_tolerance")?;

    let (length, thickness, reach, corner, tol) = match &c.stem {
        StemSpec::Minimal(s) => (
            s.cross_length,
            s.cross_thickness,
            s.stem_reach,
            s.corner_radius,
            s.tolerance,
        ),
        StemSpec::Formal(s) => (
            s.cross_length,
            s.cross_thickness,
            s.stem_reach,
            s.corner_radius,
            s.tolerance,
        ),
        StemSpec::Reinforced(s) => (
            s.formal.cross_length,
            s.formal.cross_thickness,
            s.formal.stem_reach,
            s.formal.corner_radius,
            s.formal.tolerance,
        ),
    };
    positive(length, "stem.cross_length")?;
    positive(thickness, "stem.cross_thickness")?;
    positive(reach, "stem.stem_reach")?;
    non_negative(corner, "stem.corner_radius")?;
    non_negative(tol, "stem.tolerance")?;
    if thickness >= length {
        return Err(ConfigError::InvalidValue {
            field: "stem.cross_thickness",
            reason: format!("{thickness} must be smaller than cross_length {length}"),
        });
    }
    match &c.stem {
        StemSpec::Formal(s) => positive(s.stem_radius, "stem.stem_radius")?,
        StemSpec::Reinforced(s) => {
            positive(s.formal.stem_radius, "stem.stem_radius")?;
            positive(s.collar_width, "stem.collar_width")?;
            positive(s.collar_height, "stem.collar_height")?;
            non_negative(s.collar_radius, "stem.collar_radius")?;
        }
        StemSpec::Minimal(_) => {}
    }
    Ok(())
}

fn stem_value(value: Option<f64>, default: f64, field: &'static str) -> Result<f64, ConfigError> {
    match value {
        Some(v) => require(Some(v), field),
        None => Ok(default),
    }
}

fn not_applicable(
    value: Option<f64>,
    field: &'static str,
    kind: &'static str,
) -> Result<(), ConfigError> {
    match value {
        Some(_) => Err(ConfigError::StemFieldNotApplicable { field, kind }),
        None => Ok(()),
    }
}

fn resolve_formal(s: &StemOverrides) -> Result<FormalStem, ConfigError> {
    let d = FormalStem::default();
    Ok(FormalStem {
        cross_length: stem_value(s.cross_length, d.cross_length, "stem.cross_length")?,
        cross_thickness: stem_value(s.cross_thickness, d.cross_thickness, "stem.cross_thickness")?,
        stem_reach: stem_value(s.stem_reach, d.stem_reach, "stem.stem_reach")?,
        stem_radius: stem_value(s.stem_radius, d.stem_radius, "stem.stem_radius")?,
        corner_radius: stem_value(s.corner_radius, d.corner_radius, "stem.corner_radius")?,
        tolerance: stem_value(s.tolerance, d.tolerance, "stem.tolerance")?,
    })
}

fn resolve_stem(stem: Option<&StemOverrides>) -> Result<StemSpec, ConfigError> {
    let empty = StemOverrides::default();
    let s = stem.unwrap_or(&empty);
    match s.kind.as_deref().unwrap_or("minimal") {
        "minimal" => {
            not_applicable(s.stem_radius, "stem_radius", "minimal")?;
            not_applicable(s.collar_width, "collar_width", "minimal")?;
            not_applicable(s.collar_height, "collar_height", "minimal")?;
            not_applicable(s.collar_radius, "collar_radius", "minimal")?;
            let d = MinimalStem::default();
            Ok(StemSpec::Minimal(MinimalStem {
                cross_length: stem_value(s.cross_length, d.cross_length, "stem.cross_length")?,
                cross_thickness: stem_value(
                    s.cross_thickness,
                    d.cross_thickness,
                    "stem.cross_thickness",
                )?,
                stem_reach: stem_value(s.stem_reach, d.stem_reach, "stem.stem_reach")?,
                corner_radius: stem_value(s.corner_radius, d.corner_radius, "stem.corner_radius")?,
                tolerance: stem_value(s.tolerance, d.tolerance, "stem.tolerance")?,
            }))
        }
        "formal" => {
            not_applicable(s.collar_width, "collar_width", "formal")?;
            not_applicable(s.collar_height, "collar_height", "formal")?;
            not_applicable(s.collar_radius, "collar_radius", "formal")?;
            Ok(StemSpec::Formal(resolve_formal(s)?))
        }
        "reinforced" => {
            let d = ReinforcedStem::default();
            Ok(StemSpec::Reinforced(ReinforcedStem {
                formal: resolve_formal(s)?,
                collar_width: stem_value(s.collar_width, d.collar_width, "stem.collar_width")?,
                collar_height: stem_value(s.collar_height, d.collar_height, "stem.collar_height")?,
                collar_radius: stem_value(s.collar_radius, d.collar_radius, "stem.collar_radius")?,
            }))
        }
        other => Err(ConfigError::UnknownStemKind {
            kind: other.to_string(),
        }),
    }
}
