#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Polynomial lens distortion model.
pub mod distortion;

/// Error types for the calibration module.
pub mod error;

use serde::{Deserialize, Serialize};

pub use crate::distortion::{
    distort_point_polynomial, undistort_point_polynomial, PolynomialDistortion,
};
pub use crate::error::CalibError;

/// Represents the intrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

/// Represents the extrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `rotation` - The rotation matrix of the camera 3x3
/// * `translation` - The translation vector of the camera 3x1
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraExtrinsic {
    /// The rotation matrix of the camera 3x3
    pub rotation: [[f64; 3]; 3],
    /// The translation vector of the camera 3x1
    pub translation: [f64; 3],
}

/// Intrinsic and distortion parameters of a single imaging device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceModel {
    /// The intrinsic parameters of the device.
    pub intrinsic: CameraIntrinsic,
    /// The polynomial distortion parameters of the device.
    pub distortion: PolynomialDistortion,
}

/// Full calibration of a camera-projector scanning rig.
///
/// The extrinsic maps camera coordinates into projector coordinates, i.e.
/// `p_proj = R * p_cam + T`. `top_line` and `bottom_line` bound the camera
/// rows in which the projector sweep is visible and define the linear map
/// from a detected camera row to a projector row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannerCalibration {
    /// The camera model.
    pub camera: DeviceModel,
    /// The projector model.
    pub projector: DeviceModel,
    /// The camera-to-projector extrinsic transform.
    pub extrinsic: CameraExtrinsic,
    /// First camera row in which the projector sweep is visible.
    pub top_line: usize,
    /// One past the last camera row in which the projector sweep is visible.
    pub bottom_line: usize,
    /// Width of the projector image in pixels.
    pub projector_width: usize,
    /// Height of the projector image in pixels.
    pub projector_height: usize,
}

impl ScannerCalibration {
    /// Check the calibration for internally inconsistent values.
    ///
    /// # Errors
    ///
    /// Returns an error if the visible scan band is empty or the projector
    /// resolution is zero.
    pub fn validate(&self) -> Result<(), CalibError> {
        if self.bottom_line <= self.top_line {
            return Err(CalibError::EmptyScanBand(self.top_line, self.bottom_line));
        }
        if self.projector_width == 0 || self.projector_height == 0 {
            return Err(CalibError::InvalidProjectorSize(
                self.projector_width,
                self.projector_height,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_device() -> DeviceModel {
        DeviceModel {
            intrinsic: CameraIntrinsic {
                fx: 1.0,
                fy: 1.0,
                cx: 0.0,
                cy: 0.0,
            },
            distortion: PolynomialDistortion::default(),
        }
    }

    fn rig() -> ScannerCalibration {
        ScannerCalibration {
            camera: identity_device(),
            projector: identity_device(),
            extrinsic: CameraExtrinsic {
                rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                translation: [0.0, 0.0, 0.0],
            },
            top_line: 10,
            bottom_line: 400,
            projector_width: 800,
            projector_height: 600,
        }
    }

    #[test]
    fn validate_accepts_consistent_rig() {
        assert!(rig().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_band() {
        let mut calib = rig();
        calib.bottom_line = calib.top_line;
        assert!(calib.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_projector() {
        let mut calib = rig();
        calib.projector_height = 0;
        assert!(calib.validate().is_err());
    }
}
