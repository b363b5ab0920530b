//! Geometry types shared by the renderer and the view layer.
//!
//! Canonical space for render targets:
//! - Physical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The mesh gradient shader works in normalized `[0, 1]` texture space and
//! only needs the target resolution, so no logical/physical conversion is
//! performed here.

mod rect;
mod viewport;

pub use rect::Rect;
pub use viewport::Viewport;
