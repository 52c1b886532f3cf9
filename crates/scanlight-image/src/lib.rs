#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image representation for the reconstruction pipeline.
pub mod image;

/// Error types for the image module.
pub mod error;

/// Pixel-wise operations on images.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
