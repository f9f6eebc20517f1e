use serde::Serialize;

/// Cherry MX stem dimensions, in millimetres.
pub const DEFAULT_CROSS_LENGTH: f64 = 4.1;
pub const DEFAULT_CROSS_THICKNESS: f64 = 1.17;
pub const DEFAULT_STEM_REACH: f64 = 3.8;
pub const DEFAULT_STEM_RADIUS: f64 = 2.75;
pub const DEFAULT_STEM_CORNER_RADIUS: f64 = 0.3;
pub const DEFAULT_STEM_TOLERANCE: f64 = 0.05;
pub const DEFAULT_COLLAR_WIDTH: f64 = 6.0;
pub const DEFAULT_COLLAR_HEIGHT: f64 = 4.0;
pub const DEFAULT_COLLAR_RADIUS: f64 = 0.4;

/// Fully resolved parameters for one key. Lengths in millimetres, slopes
/// in radians.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyConfig {
    pub tolerance: f64,
    pub tight_tolerance: f64,
    pub wall: f64,
    pub inner_radius: f64,
    pub corner_radius: f64,
    pub back_slope: f64,
    pub front_slope: f64,
    pub side_slope: f64,
    pub back_curve: f64,
    pub front_curve: f64,
    pub front_rise: f64,
    pub back_rise: f64,
    pub height: f64,
    /// Width as a multiple of `height`.
    pub width: f64,
    pub bump: bool,
    pub stem: StemSpec,
}

/// The stem variant and its own parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StemSpec {
    Minimal(MinimalStem),
    Formal(FormalStem),
    Reinforced(ReinforcedStem),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimalStem {
    pub cross_length: f64,
    pub cross_thickness: f64,
    pub stem_reach: f64,
    pub corner_radius: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormalStem {
    pub cross_length: f64,
    pub cross_thickness: f64,
    pub stem_reach: f64,
    pub stem_radius: f64,
    pub corner_radius: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReinforcedStem {
    #[serde(flatten)]
    pub formal: FormalStem,
    pub collar_width: f64,
    pub collar_height: f64,
    pub collar_radius: f64,
}

impl Default for MinimalStem {
    fn default() -> Self {
        Self {
            cross_length: DEFAULT_CROSS_LENGTH,
            cross_thickness: DEFAULT_CROSS_THICKNESS,
            stem_reach: DEFAULT_STEM_REACH,
            corner_radius: DEFAULT_STEM_CORNER_RADIUS,
            tolerance: DEFAULT_STEM_TOLERANCE,
        }
    }
}

impl Default for FormalStem {
    fn default() -> Self {
        Self {
            cross_length: DEFAULT_CROSS_LENGTH,
            cross_thickness: DEFAULT_CROSS_THICKNESS,
            stem_reach: DEFAULT_STEM_REACH,
            stem_radius: DEFAULT_STEM_RADIUS,
            corner_radius: DEFAULT_STEM_CORNER_RADIUS,
            tolerance: DEFAULT_STEM_TOLERANCE,
        }
    }
}

impl Default for ReinforcedStem {
    fn default() -> Self {
        Self {
            formal: FormalStem::default(),
            collar_width: DEFAULT_COLLAR_WIDTH,
            collar_height: DEFAULT_COLLAR_HEIGHT,
            collar_radius: DEFAULT_COLLAR_RADIUS,
        }
    }
}

impl Default for StemSpec {
    fn default() -> Self {
        StemSpec::Minimal(MinimalStem::default())
    }
}

impl StemSpec {
    /// Discriminator as written in configuration files.
    pub fn kind(&self) -> &'static str {
        match self {
            StemSpec::Minimal(_) => "minimal",
            StemSpec::Formal(_) => "formal",
            StemSpec::Reinforced(_) => "reinforced",
        }
    }

    /// Depth of the switch slot, before tolerance.
    pub fn stem_reach(&self) -> f64 {
        match self {
            StemSpec::Minimal(s) => s.stem_reach,
            StemSpec::Formal(s) => s.stem_reach,
            StemSpec::Reinforced(s) => s.formal.stem_reach,
        }
    }
}

impl KeyConfig {
    /// Actual key width in millimetres.
    pub fn key_width(&self) -> f64 {
        self.height * self.width
    }
}
