//! Time subsystem.
//!
//! Provides testable frame timing without coupling to the runtime:
//! - one `FrameClock` per window
//! - call `tick()` once per presented frame to obtain `FrameTime`
//! - `FrameTime::elapsed` drives the gradient animation

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
