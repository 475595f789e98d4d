//! Rendering decisions and the mapping from elements to drawing primitives.

pub mod decision;
pub mod mapper;
