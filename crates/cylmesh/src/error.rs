//! Error types shared by the geometry, loader and scene modules.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CylmeshError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Malformed numeric data in {}:{line}: {token:?}", path.display())]
    MalformedNumericData {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("Coordinate columns differ in length: x={x}, y={y}, z={z}")]
    ShapeMismatch { x: usize, y: usize, z: usize },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scene file {}: {source}", path.display())]
    SceneFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CylmeshError>;

impl CylmeshError {
    /// Maps an I/O error on `path`, singling out a missing file.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CylmeshError::FileNotFound { path }
        } else {
            CylmeshError::Io { path, source }
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        CylmeshError::DegenerateGeometry(reason.into())
    }
}
