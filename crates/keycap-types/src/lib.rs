pub mod geometry;
pub mod sketch;
pub mod topo;

pub use geometry::*;
pub use sketch::*;
pub use topo::*;
