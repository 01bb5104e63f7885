//! Compute module - Layout decoding, scoring and search.

mod geometry;
mod layout;
mod mapper;

pub mod evolution;

pub use geometry::*;
pub use layout::*;
pub use mapper::*;
