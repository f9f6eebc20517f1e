//! Style and layout configuration for keycap generation.
//!
//! A style document holds a global overlay plus named base and modifier
//! overlays; a layout document lists keys, each naming a base, modifiers
//! and its own overrides. [`ConfigBuilder`] folds the layers for one key
//! into an immutable [`KeyConfig`].

pub mod builder;
pub mod document;
pub mod errors;
pub mod model;
pub mod overrides;

pub use builder::{ConfigBuilder, Layer};
pub use document::{locate, DocKind, KeyEntry, LayoutDoc, StyleDoc};
pub use errors::ConfigError;
pub use model::{FormalStem, KeyConfig, MinimalStem, ReinforcedStem, StemSpec};
pub use overrides::{KeyOverrides, StemOverrides};
