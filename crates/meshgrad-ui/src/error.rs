use std::path::PathBuf;

use meshgrad_engine::paint::ColorParseError;
use thiserror::Error;

/// A rejected property value or props document.
#[derive(Debug, Error)]
pub enum PropError {
    #[error("{prop} must be {expected}, got {value}")]
    OutOfRange {
        prop: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("colors must contain exactly 4 entries, got {0}")]
    ColorCount(usize),

    #[error(transparent)]
    InvalidColor(#[from] ColorParseError),

    #[error("unknown property {0:?}")]
    UnknownProp(String),

    #[error("property {prop} expects {expected}")]
    TypeMismatch {
        prop: &'static str,
        expected: &'static str,
    },

    #[error("invalid props document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read props file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
