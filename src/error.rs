//! Error taxonomy for the picker.
//!
//! Every variant is recoverable: the controller records or returns these and
//! keeps running. None of them should tear down an open picker.

use crate::raster::codec::PackedColorId;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PickerError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PickerError {
    /// The pick raster could not be fetched or decoded.
    #[error("failed to load pick image: {0}")]
    ImageLoad(String),

    /// Manifest or already-excluded list was not supplied.
    #[error("object manifest or exclusion list is missing")]
    ManifestMissing,

    /// The remote submit action rejected the exclusion list.
    #[error("submit rejected: {0}")]
    Submit(String),

    /// A sampled pixel resolved to an id with no registry entry.
    #[error("pixel id {0} is not a registered object")]
    UnregisteredSample(PackedColorId),

    /// Raw pixel data does not match the declared dimensions.
    #[error("raster is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    InvalidRaster {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// A submit is already outstanding.
    #[error("a submit is already in flight")]
    CommitInFlight,

    /// The picker cannot perform the request in its current state.
    #[error("picker not ready: {0}")]
    NotReady(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<image::ImageError> for PickerError {
    fn from(err: image::ImageError) -> Self {
        PickerError::ImageLoad(err.to_string())
    }
}

impl From<serde_json::Error> for PickerError {
    fn from(err: serde_json::Error) -> Self {
        PickerError::Config(err.to_string())
    }
}
