/// An error type for the calibration module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CalibError {
    /// Error when the visible scan band contains no rows.
    #[error("Scan band is empty (top_line {0}, bottom_line {1})")]
    EmptyScanBand(usize, usize),

    /// Error when the projector resolution is zero in either dimension.
    #[error("Invalid projector size ({0}x{1})")]
    InvalidProjectorSize(usize, usize),
}
