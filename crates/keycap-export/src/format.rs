use std::fmt;
use std::str::FromStr;

use crate::error::ExportError;

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Stl,
    Brep,
    Step,
    ThreeMf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Stl,
        ExportFormat::Brep,
        ExportFormat::Step,
        ExportFormat::ThreeMf,
    ];

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Stl => "stl",
            ExportFormat::Brep => "brep",
            ExportFormat::Step => "step",
            ExportFormat::ThreeMf => "3mf",
        }
    }

    /// Whether the format is a triangle mesh rather than exact geometry.
    pub fn is_mesh(self) -> bool {
        matches!(self, ExportFormat::Stl | ExportFormat::ThreeMf)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == lower || (*f == ExportFormat::Step && lower == "stp"))
            .ok_or_else(|| ExportError::UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for format in ExportFormat::ALL {
            assert_eq!(format.to_string().parse::<ExportFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("STEP".parse::<ExportFormat>().unwrap(), ExportFormat::Step);
        assert_eq!("stp".parse::<ExportFormat>().unwrap(), ExportFormat::Step);
        assert_eq!("3MF".parse::<ExportFormat>().unwrap(), ExportFormat::ThreeMf);
    }

    #[test]
    fn test_unknown_format() {
        let err = "obj".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, ExportError::UnknownFormat(ref s) if s == "obj"));
    }
}
