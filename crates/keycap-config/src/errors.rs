use std::path::PathBuf;

use crate::builder::Layer;

/// Errors while locating, parsing or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("key `{key}` names unknown base `{base}`")]
    UnknownBase { key: String, base: String },

    #[error("key `{key}` names unknown modifier `{modifier}`")]
    UnknownModifier { key: String, modifier: String },

    #[error("unknown stem type `{kind}` (expected minimal, formal or reinforced)")]
    UnknownStemKind { kind: String },

    #[error("stem field `{field}` does not apply to a {kind} stem")]
    StemFieldNotApplicable { field: &'static str, kind: &'static str },

    #[error("required field `{field}` is not set by any layer")]
    MissingField { field: &'static str },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{layer:?} layer cannot be applied after {after:?} layer")]
    LayerOrder { layer: Layer, after: Layer },
}
