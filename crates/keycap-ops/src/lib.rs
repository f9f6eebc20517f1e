//! Keycap construction on top of a geometry kernel.
//!
//! [`Keycap::shape`] composes the outer profile, shell, top filler, stem,
//! interior fillet and bump into one solid; [`Keycap::build`] also reports
//! the fillet passes a kernel could not perform. The building blocks are
//! public so they can be exercised on their own.

pub mod assemble;
pub mod boolean;
pub mod bump;
pub mod extrude;
pub mod fillet;
pub mod geometry;
pub mod profile;
pub mod select;
pub mod shell;
pub mod stem;
pub mod types;

pub use assemble::{BuiltKey, Keycap};
pub use boolean::{combine, union_all, BooleanKind};
pub use fillet::{round_edges, round_edges_if_supported, Rounding};
pub use geometry::{KeyGeometry, CUT_OVERSHOOT, EPS};
pub use profile::{inner_profile, outer_profile, rounded_outer};
pub use shell::{filler_bound, shell, top_filler};
pub use stem::{stem_for, Formal, Minimal, Reinforced, Stem, StemContext};
pub use types::*;
