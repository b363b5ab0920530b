//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain) for on-screen rendering
//! - acquiring frames and providing encoders/views for rendering
//! - a surface-less device for offscreen snapshots

mod gpu;
mod headless;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use headless::HeadlessGpu;
