//! Mesh gradient view layer.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`props`] | `MeshGradientProps`, `Prop`, JSON loading, validation |
//! | [`bridge`] | `PropValue`, `ColorInput`: name-keyed property updates |
//! | [`view`] | `MeshGradientView`: props + renderer |
//! | [`app`] | `Application`: one-window preview builder |
//! | [`error`] | `PropError` |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use meshgrad_ui::{Application, MeshGradientProps};
//!
//! let props = MeshGradientProps::from_json(r##"{ "speed": 5, "colors": ["#769CDF", "#8991A2", "#A288A6", "#FF5449"] }"##)?;
//! Application::new().title("gradient").props(props).run()?;
//! ```

pub mod app;
pub mod bridge;
pub mod error;
pub mod props;
pub mod view;

pub use app::{Application, KeyCtx};
pub use bridge::{ColorInput, PropValue};
pub use error::PropError;
pub use props::{MeshGradientProps, Prop};
pub use view::{MeshGradientView, VIEW_NAME};
