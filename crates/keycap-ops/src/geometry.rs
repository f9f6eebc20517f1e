use keycap_config::KeyConfig;

/// Curvatures at or below this magnitude are treated as flat. Also taken off
/// the interior fillet radius so it never equals the plinth height exactly.
pub const EPS: f64 = 0.001;

/// How far cutting tools start below the mounting face, so the boolean
/// engine never sees coplanar bottoms.
pub const CUT_OVERSHOOT: f64 = 0.1;

/// A key's configuration together with the dimensions derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyGeometry {
    pub config: KeyConfig,
    /// Actual width in millimetres.
    pub width: f64,
    pub max_front_height: f64,
    pub max_back_height: f64,
    pub max_height: f64,
    pub eps: f64,
    /// Depth of the switch cavity below the top filler.
    pub stem_reach: f64,
}

impl KeyGeometry {
    pub fn new(config: &KeyConfig) -> Self {
        let max_front_height = config.front_rise + (-config.front_curve).max(0.0) + 1.0;
        let max_back_height = config.back_rise + (-config.back_curve).max(0.0) + 1.0;
        Self {
            width: config.key_width(),
            max_front_height,
            max_back_height,
            max_height: max_front_height.max(max_back_height),
            eps: EPS,
            stem_reach: config.stem.stem_reach() + config.tolerance,
            config: config.clone(),
        }
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    /// Z of the underside of the top filler.
    pub fn filler_base(&self) -> f64 {
        self.stem_reach + self.config.inner_radius
    }
}
