//! GPU rendering subsystem.
//!
//! Each renderer owns its GPU resources (pipeline, buffers, bind groups) and
//! creates them lazily against the target format it is first asked to draw to.
//!
//! Convention:
//! - placement rects are in physical pixels (top-left origin, +Y down)
//! - the vertex shader converts to NDC using the target size uniform
//! - the fragment shader sees `uv` in `[0, 1]²` with `(0, 0)` bottom-left

mod ctx;
pub mod mesh_gradient;
pub mod offscreen;

pub use ctx::{RenderCtx, RenderTarget};
pub use mesh_gradient::{MeshGradientParams, MeshGradientRenderer, MeshGradientUniforms};
pub use offscreen::{render_snapshot, OffscreenTarget, RgbaImage};
