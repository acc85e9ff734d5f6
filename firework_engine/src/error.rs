//! Engine setup errors.
//!
//! Per-tick operations never fail; only loading an external font can.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The font file could not be read.
    #[error("cannot read font {path}: {source}")]
    FontRead {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a usable TrueType/OpenType font.
    #[error("invalid font data in {0}")]
    InvalidFont(PathBuf),
}

pub type EngineResult<T> = Result<T, EngineError>;
