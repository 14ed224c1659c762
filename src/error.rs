use std::io;

use thiserror::Error;

/// Everything that can go wrong while reading, bounding or exporting tracks.
#[derive(Error, Debug)]
pub enum Error {
    /// No points at all across the given paths, so there is nothing to bound.
    #[error("no points to bound: path collection is empty")]
    EmptyInput,
    #[error("invalid style: {0}")]
    InvalidStyle(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid grid resolution {0}x{1}")]
    InvalidResolution(usize, usize),
    #[error("unsupported track format: {0}")]
    UnsupportedFormat(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image encoding failed: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, Error>;
