//! Mesh gradient engine crate.
//!
//! This crate owns the platform + GPU runtime pieces and the shader uniform
//! pipeline that paints the animated mesh gradient.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
