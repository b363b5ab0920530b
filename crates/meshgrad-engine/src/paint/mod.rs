//! Color model shared between the view layer and the renderer.
//!
//! Colors are straight-alpha, sRGB-encoded. The gradient shader blends in
//! encoded space; conversion to linear happens only at output time when the
//! render target is an sRGB format.

pub mod color;

pub use color::{Color, ColorParseError};
