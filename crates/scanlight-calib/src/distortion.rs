use serde::{Deserialize, Serialize};

use crate::CameraIntrinsic;

/// Number of fixed-point iterations used to invert the distortion model.
const UNDISTORT_ITERATIONS: usize = 5;

/// Represents the polynomial distortion parameters of a camera
///
/// # Fields
///
/// * `k1` - The first radial distortion coefficient
/// * `k2` - The second radial distortion coefficient
/// * `k3` - The third radial distortion coefficient
/// * `k4` - The fourth radial distortion coefficient
/// * `k5` - The fifth radial distortion coefficient
/// * `k6` - The sixth radial distortion coefficient
/// * `p1` - The first tangential distortion coefficient
/// * `p2` - The second tangential distortion coefficient
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The fourth radial distortion coefficient
    pub k4: f64,
    /// The fifth radial distortion coefficient
    pub k5: f64,
    /// The sixth radial distortion coefficient
    pub k6: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
}

/// Distort a point using polynomial distortion
///
/// # Arguments
///
/// * `x` - The x coordinate of the point in pixels
/// * `y` - The y coordinate of the point in pixels
///
/// # Returns
///
/// The pixel coordinates of the distorted point.
pub fn distort_point_polynomial(
    x: f64,
    y: f64,
    intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    let (fx, fy, cx, cy) = (intrinsic.fx, intrinsic.fy, intrinsic.cx, intrinsic.cy);
    let (k1, k2, k3, k4, k5, k6, p1, p2) = (
        distortion.k1,
        distortion.k2,
        distortion.k3,
        distortion.k4,
        distortion.k5,
        distortion.k6,
        distortion.p1,
        distortion.p2,
    );

    // normalize the coordinates
    let x = (x - cx) / fx;
    let y = (y - cy) / fy;

    // calculate the radial distance
    let r2 = x * x + y * y;

    // radial distortion
    let kr = (1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2)
        / (1.0 + k4 * r2 + k5 * r2 * r2 + k6 * r2 * r2 * r2);

    // tangential distortion
    let xd = x * kr + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let yd = y * kr + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

    // denormalize the coordinates
    let xdst = fx * xd + cx;
    let ydst = fy * yd + cy;

    (xdst, ydst)
}

/// Undistort a pixel into normalized image coordinates.
///
/// Inverts the polynomial distortion model by fixed-point iteration and
/// returns the ideal normalized coordinates `(xn, yn)` such that the ray
/// `(xn, yn, 1)` passes through the observed pixel after distortion.
///
/// # Arguments
///
/// * `x` - The x coordinate of the observed pixel
/// * `y` - The y coordinate of the observed pixel
///
/// # Returns
///
/// The normalized image coordinates of the undistorted point.
pub fn undistort_point_polynomial(
    x: f64,
    y: f64,
    intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    let (k1, k2, k3, k4, k5, k6, p1, p2) = (
        distortion.k1,
        distortion.k2,
        distortion.k3,
        distortion.k4,
        distortion.k5,
        distortion.k6,
        distortion.p1,
        distortion.p2,
    );

    let x0 = (x - intrinsic.cx) / intrinsic.fx;
    let y0 = (y - intrinsic.cy) / intrinsic.fy;

    let (mut xn, mut yn) = (x0, y0);
    for _ in 0..UNDISTORT_ITERATIONS {
        let r2 = xn * xn + yn * yn;
        // inverse of the radial factor applied at the current estimate
        let icdist = (1.0 + k4 * r2 + k5 * r2 * r2 + k6 * r2 * r2 * r2)
            / (1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2);
        let dx = 2.0 * p1 * xn * yn + p2 * (r2 + 2.0 * xn * xn);
        let dy = p1 * (r2 + 2.0 * yn * yn) + 2.0 * p2 * xn * yn;
        xn = (x0 - dx) * icdist;
        yn = (y0 - dy) * icdist;
    }

    (xn, yn)
}
