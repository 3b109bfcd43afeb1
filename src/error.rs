/// Error type shared by every stage of the pipeline.
use thiserror::Error;

use crate::config::Symbology;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    #[error("unsupported symbology id: {0}")]
    UnsupportedSymbology(i32),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("no result available, draw a symbol first")]
    NoResultAvailable,

    #[error("barcode instance has been disposed")]
    InvalidHandle,

    #[error("{call} cannot draw {symbology:?}")]
    UnsupportedDrawCall { call: &'static str, symbology: Symbology },

    #[error("image encoding failed: {0}")]
    ImageEncoding(String),
}

impl From<image::ImageError> for BarcodeError {
    fn from(err: image::ImageError) -> Self {
        BarcodeError::ImageEncoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BarcodeError>;

pub(crate) fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(BarcodeError::InvalidPayload(msg.into()))
}

pub(crate) fn too_large<T>(msg: impl Into<String>) -> Result<T> {
    Err(BarcodeError::PayloadTooLarge(msg.into()))
}

pub(crate) fn geometry<T>(msg: impl Into<String>) -> Result<T> {
    Err(BarcodeError::InvalidGeometry(msg.into()))
}

/// Writes into in-memory bit buffers cannot fail in practice; map the io error anyway.
pub(crate) fn bit_io(err: std::io::Error) -> BarcodeError {
    BarcodeError::InvalidPayload(format!("bit stream: {}", err))
}
