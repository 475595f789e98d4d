pub mod colors;
pub mod common;
pub mod dom;
pub mod primitives;
pub mod slide;
pub mod style;
