use scanlight_calib::CalibError;
use scanlight_image::ImageError;

/// An error type for the reconstruction module.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Error when the current frame does not match the reference frame shape.
    #[error("Frame shape does not match the reference frame")]
    FrameMismatch,

    /// Error produced by an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error produced by an invalid calibration.
    #[error(transparent)]
    Calib(#[from] CalibError),

    /// Error when a color model covariance matrix cannot be inverted.
    #[error("Color model covariance matrix is singular")]
    SingularCovariance,
}
