use serde::{Deserialize, Serialize};

/// One configuration layer. Every field is optional; unset fields fall
/// through to earlier layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyOverrides {
    pub tolerance: Option<f64>,
    pub tight_tolerance: Option<f64>,
    pub wall: Option<f64>,
    pub inner_radius: Option<f64>,
    pub corner_radius: Option<f64>,
    /// Degrees.
    pub back_slope: Option<f64>,
    /// Degrees.
    pub front_slope: Option<f64>,
    /// Degrees.
    pub side_slope: Option<f64>,
    pub back_curve: Option<f64>,
    pub front_curve: Option<f64>,
    pub front_rise: Option<f64>,
    pub back_rise: Option<f64>,
    pub height: Option<f64>,
    /// Width as a multiple of `height`.
    pub width: Option<f64>,
    pub bump: Option<bool>,
    pub stem: Option<StemOverrides>,
}

/// Stem fields of one layer. `type` selects the variant. A layer that sets
/// `type` drops inherited fields the new variant has no use for; fields a
/// layer sets itself that do not belong to the final variant are rejected
/// when the layers are built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StemOverrides {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub cross_length: Option<f64>,
    pub cross_thickness: Option<f64>,
    pub stem_reach: Option<f64>,
    pub stem_radius: Option<f64>,
    pub corner_radius: Option<f64>,
    pub tolerance: Option<f64>,
    pub collar_width: Option<f64>,
    pub collar_height: Option<f64>,
    pub collar_radius: Option<f64>,
}

fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if src.is_some() {
        dst.clone_from(src);
    }
}

impl KeyOverrides {
    /// Apply `other` on top of `self`, field by field.
    pub fn overlay(&mut self, other: &KeyOverrides) {
        take(&mut self.tolerance, &other.tolerance);
        take(&mut self.tight_tolerance, &other.tight_tolerance);
        take(&mut self.wall, &other.wall);
        take(&mut self.inner_radius, &other.inner_radius);
        take(&mut self.corner_radius, &other.corner_radius);
        take(&mut self.back_slope, &other.back_slope);
        take(&mut self.front_slope, &other.front_slope);
        take(&mut self.side_slope, &other.side_slope);
        take(&mut self.back_curve, &other.back_curve);
        take(&mut self.front_curve, &other.front_curve);
        take(&mut self.front_rise, &other.front_rise);
        take(&mut self.back_rise, &other.back_rise);
        take(&mut self.height, &other.height);
        take(&mut self.width, &other.width);
        take(&mut self.bump, &other.bump);
        match (&mut self.stem, &other.stem) {
            (Some(mine), Some(theirs)) => mine.overlay(theirs),
            (None, Some(theirs)) => self.stem = Some(theirs.clone()),
            _ => {}
        }
    }
}

impl StemOverrides {
    /// Apply `other` on top of `self`, field by field.
    pub fn overlay(&mut self, other: &StemOverrides) {
        if let Some(kind) = other.kind.as_deref() {
            self.retain_for(kind);
        }
        take(&mut self.kind, &other.kind);
        take(&mut self.cross_length, &other.cross_length);
        take(&mut self.cross_thickness, &other.cross_thickness);
        take(&mut self.stem_reach, &other.stem_reach);
        take(&mut self.stem_radius, &other.stem_radius);
        take(&mut self.corner_radius, &other.corner_radius);
        take(&mut self.tolerance, &other.tolerance);
        take(&mut self.collar_width, &other.collar_width);
        take(&mut self.collar_height, &other.collar_height);
        take(&mut self.collar_radius, &other.collar_radius);
    }

    /// Clear the fields that `kind` does not take. Unknown kinds keep
    /// everything so the builder can report them.
    fn retain_for(&mut self, kind: &str) {
        match kind {
            "minimal" => {
                self.stem_radius = None;
                self.clear_collar();
            }
            "formal" => self.clear_collar(),
            _ => {}
        }
    }

    fn clear_collar(&mut self) {
        self.collar_width = None;
        self.collar_height = None;
        self.collar_radius = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_keeps_unset_fields() {
        let mut base = KeyOverrides {
            wall: Some(1.5),
            height: Some(18.0),
            ..Default::default()
        };
        base.overlay(&KeyOverrides {
            height: Some(19.0),
            ..Default::default()
        });
        assert_eq!(base.wall, Some(1.5));
        assert_eq!(base.height, Some(19.0));
    }

    #[test]
    fn test_stem_fields_merge_individually() {
        let mut base = KeyOverrides {
            stem: Some(StemOverrides {
                kind: Some("formal".into()),
                stem_radius: Some(2.75),
                ..Default::default()
            }),
            ..Default::default()
        };
        base.overlay(&KeyOverrides {
            stem: Some(StemOverrides {
                tolerance: Some(0.1),
                ..Default::default()
            }),
            ..Default::default()
        });
        let stem = base.stem.unwrap();
        assert_eq!(stem.kind.as_deref(), Some("formal"));
        assert_eq!(stem.stem_radius, Some(2.75));
        assert_eq!(stem.tolerance, Some(0.1));
    }

    #[test]
    fn test_new_type_drops_fields_of_old_variant() {
        let mut stem = StemOverrides {
            kind: Some("reinforced".into()),
            stem_radius: Some(2.6),
            cross_length: Some(4.2),
            collar_width: Some(7.0),
            ..Default::default()
        };
        stem.overlay(&StemOverrides {
            kind: Some("formal".into()),
            ..Default::default()
        });
        assert_eq!(stem.kind.as_deref(), Some("formal"));
        assert_eq!(stem.collar_width, None);
        assert_eq!(stem.stem_radius, Some(2.6));
        assert_eq!(stem.cross_length, Some(4.2));

        stem.overlay(&StemOverrides {
            kind: Some("minimal".into()),
            ..Default::default()
        });
        assert_eq!(stem.stem_radius, None);
        assert_eq!(stem.cross_length, Some(4.2));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = serde_yaml::from_str::<KeyOverrides>("wal: 1.5\n").unwrap_err();
        assert!(err.to_string().contains("wal"), "{err}");
        assert!(serde_yaml::from_str::<StemOverrides>("kind: formal\n").is_err());
    }
}
