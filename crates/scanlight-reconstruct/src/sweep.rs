use rayon::prelude::*;

use scanlight_3d::cloud::PointCloudGrid;
use scanlight_3d::ops::{rotate_transposed, sub};
use scanlight_3d::ray::approximate_ray_plane_intersection;
use scanlight_calib::{undistort_point_polynomial, ScannerCalibration};
use scanlight_image::{ops, Image};

use crate::error::ScanError;

/// Parameters of the sweep-line peak detector.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Minimum smoothed intensity for a row to count as illuminated.
    pub intensity_threshold: u8,
    /// The reference row is taken from the rightmost peak inside the final
    /// `width / flat_band_divisor` columns, where the surface is assumed
    /// flat.
    pub flat_band_divisor: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            intensity_threshold: 78,
            flat_band_divisor: 6,
        }
    }
}

/// Result of feeding one frame to the triangulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The frame contributed this many points to the cloud.
    Points(usize),
    /// No column in the flat band produced a valid peak.
    NoLine,
    /// The mapped projector row fell outside the projector, so the whole
    /// frame was discarded.
    RowOutOfRange(i64),
}

/// Per-column peak of the smoothed difference intensity.
#[derive(Debug, Clone, Copy)]
struct ColumnPeak {
    row: usize,
}

/// Find the illuminated row of each column inside the scan band.
///
/// For every column, the gray difference intensity is smoothed with a
/// centered 3-tap moving average over the rows in `[top, bottom)`; the peak
/// is the row with the maximal average strictly above the threshold.
fn detect_column_peaks(
    gray: &Image<u8, 1>,
    top: usize,
    bottom: usize,
    threshold: u8,
) -> Vec<Option<ColumnPeak>> {
    let (width, height) = (gray.width(), gray.height());
    let data = gray.as_slice();

    // the 3-tap window needs one row on each side
    let row_start = top.max(1);
    let row_end = bottom.min(height.saturating_sub(1));

    (0..width)
        .into_par_iter()
        .map(|col| {
            let mut best: Option<(usize, f64)> = None;
            for row in row_start..row_end {
                let sum = u32::from(data[(row - 1) * width + col])
                    + u32::from(data[row * width + col])
                    + u32::from(data[(row + 1) * width + col]);
                let average = f64::from(sum) / 3.0;
                let improves = match best {
                    Some((_, best_avg)) => average > best_avg,
                    None => true,
                };
                if average > f64::from(threshold) && improves {
                    best = Some((row, average));
                }
            }
            best.map(|(row, _)| ColumnPeak { row })
        })
        .collect()
}

/// Detect the sweep line in a frame and triangulate it into the cloud.
///
/// Computes the saturating difference against the reference frame, finds the
/// per-column intensity peaks, maps the reference row (from the flat band at
/// the image border) to a projector row, and intersects each peak pixel's
/// camera ray with the plane of the illuminated projector row. Valid points
/// are written into the cloud at their pixel position together with a
/// denoised BGR sample of the difference image.
///
/// # Arguments
///
/// * `cloud` - The accumulating point cloud, camera resolution.
/// * `reference` - The reference (background) frame.
/// * `current` - The current frame.
/// * `calib` - The scanner calibration.
/// * `config` - Peak detector parameters.
///
/// # Returns
///
/// How the frame contributed to the cloud; a rejected frame emits no points
/// but is not an error.
///
/// # Errors
///
/// Returns an error if the frame shapes do not agree with the reference
/// frame or the cloud grid.
pub fn sweep_frame(
    cloud: &mut PointCloudGrid,
    reference: &Image<u8, 3>,
    current: &Image<u8, 3>,
    calib: &ScannerCalibration,
    config: &SweepConfig,
) -> Result<SweepOutcome, ScanError> {
    if current.size() != reference.size()
        || cloud.width() != current.width()
        || cloud.height() != current.height()
    {
        return Err(ScanError::FrameMismatch);
    }

    let mut diff = Image::<u8, 3>::from_size_val(current.size(), 0)?;
    ops::saturating_diff(current, reference, &mut diff)?;
    let mut gray = Image::<u8, 1>::from_size_val(current.size(), 0)?;
    ops::gray_from_bgr(&diff, &mut gray)?;

    let peaks = detect_column_peaks(
        &gray,
        calib.top_line,
        calib.bottom_line,
        config.intensity_threshold,
    );

    // the rightmost valid peak in the flat band supplies the reference row
    let width = current.width();
    let band_start = width - width / config.flat_band_divisor.max(1);
    let reference_row = peaks[band_start..]
        .iter()
        .rev()
        .find_map(|peak| peak.map(|p| p.row));
    let Some(reference_row) = reference_row else {
        log::debug!("no valid peak in the flat band, frame skipped");
        return Ok(SweepOutcome::NoLine);
    };

    // one frame carries exactly one projector row; a bad mapping discards
    // the whole frame
    let row = projector_row(reference_row, calib);
    if row <= 0 || row > calib.projector_height as i64 {
        log::debug!("projector row {row} out of range, frame skipped");
        return Ok(SweepOutcome::RowOutOfRange(row));
    }

    // plane of the illuminated projector row, in camera coordinates
    let (xn, yn) = undistort_point_polynomial(
        calib.projector_width as f64,
        row as f64,
        &calib.projector.intrinsic,
        &calib.projector.distortion,
    );
    let u = [xn, yn, 1.0];
    let rotation = &calib.extrinsic.rotation;
    let vp = rotate_transposed(rotation, &u);
    let qp = rotate_transposed(rotation, &sub(&u, &calib.extrinsic.translation));

    let qc = [0.0f64; 3];
    let mut committed = 0usize;
    for (col, peak) in peaks.iter().enumerate() {
        let Some(peak) = peak else {
            continue;
        };
        let (xn, yn) = undistort_point_polynomial(
            col as f64,
            peak.row as f64,
            &calib.camera.intrinsic,
            &calib.camera.distortion,
        );
        let vc = [xn, yn, 1.0];
        let Some(point) = approximate_ray_plane_intersection(&vc, &qc, &vp, &qp) else {
            // ray near-parallel to the sweep plane, pixel unreconstructable
            continue;
        };

        cloud.set(peak.row, col, point, denoised_color(&diff, peak.row, col));
        committed += 1;
    }

    Ok(SweepOutcome::Points(committed))
}

/// Map a detected camera row into a projector row by linearly rescaling the
/// calibrated visible band onto the projector height. The result is valid
/// only inside `(0, projector_height]`.
fn projector_row(reference_row: usize, calib: &ScannerCalibration) -> i64 {
    (reference_row as i64 - calib.top_line as i64) * calib.projector_height as i64
        / (calib.bottom_line as i64 - calib.top_line as i64)
}

/// Mean BGR of the difference image over the 3 rows centered on a pixel.
fn denoised_color(diff: &Image<u8, 3>, row: usize, col: usize) -> [u8; 3] {
    let mut sums = [0u32; 3];
    for r in row - 1..=row + 1 {
        let bgr = diff.pixel(r, col);
        for (sum, &v) in sums.iter_mut().zip(bgr) {
            *sum += u32::from(v);
        }
    }
    [
        (sums[0] / 3) as u8,
        (sums[1] / 3) as u8,
        (sums[2] / 3) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanlight_calib::{
        CameraExtrinsic, CameraIntrinsic, DeviceModel, PolynomialDistortion, ScannerCalibration,
    };
    use scanlight_image::ImageSize;

    const WIDTH: usize = 60;
    const HEIGHT: usize = 48;

    fn test_calib() -> ScannerCalibration {
        let device = DeviceModel {
            intrinsic: CameraIntrinsic {
                fx: 50.0,
                fy: 50.0,
                cx: WIDTH as f64 / 2.0,
                cy: HEIGHT as f64 / 2.0,
            },
            distortion: PolynomialDistortion::default(),
        };
        ScannerCalibration {
            camera: device.clone(),
            projector: device,
            extrinsic: CameraExtrinsic {
                rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                translation: [0.2, 0.0, 0.0],
            },
            top_line: 4,
            bottom_line: 44,
            projector_width: 60,
            projector_height: 40,
        }
    }

    fn black_frame() -> Image<u8, 3> {
        Image::from_size_val(
            ImageSize {
                width: WIDTH,
                height: HEIGHT,
            },
            0,
        )
        .unwrap()
    }

    /// A frame with a bright horizontal stripe, 3 rows thick so the 3-tap
    /// average peaks at the center row.
    fn stripe_frame(center_row: usize) -> Image<u8, 3> {
        let mut frame = black_frame();
        let width = frame.width();
        let slice = frame.as_slice_mut();
        for row in center_row - 1..=center_row + 1 {
            for col in 0..width {
                let offset = (row * width + col) * 3;
                slice[offset] = 255;
                slice[offset + 1] = 255;
                slice[offset + 2] = 255;
            }
        }
        frame
    }

    #[test]
    fn stripe_emits_points_at_stripe_row() {
        let calib = test_calib();
        let reference = black_frame();
        let current = stripe_frame(24);
        let mut cloud = PointCloudGrid::new(WIDTH, HEIGHT);

        let outcome =
            sweep_frame(&mut cloud, &reference, &current, &calib, &SweepConfig::default())
                .unwrap();
        match outcome {
            SweepOutcome::Points(n) => assert!(n > 0),
            other => panic!("expected points, got {other:?}"),
        }
        // all emitted points sit on the stripe row
        for (row, _, _, _) in cloud.iter_valid() {
            assert_eq!(row, 24);
        }
    }

    #[test]
    fn dark_frame_has_no_line() {
        let calib = test_calib();
        let reference = black_frame();
        let current = black_frame();
        let mut cloud = PointCloudGrid::new(WIDTH, HEIGHT);

        let outcome =
            sweep_frame(&mut cloud, &reference, &current, &calib, &SweepConfig::default())
                .unwrap();
        assert_eq!(outcome, SweepOutcome::NoLine);
        assert_eq!(cloud.valid_count(), 0);
    }

    #[test]
    fn row_mapping_boundaries() {
        let calib = test_calib();
        let reference = black_frame();
        let mut cloud = PointCloudGrid::new(WIDTH, HEIGHT);

        // stripe exactly at top_line maps to projector row 0: rejected
        let outcome = sweep_frame(
            &mut cloud,
            &reference,
            &stripe_frame(calib.top_line),
            &calib,
            &SweepConfig::default(),
        )
        .unwrap();
        assert_eq!(outcome, SweepOutcome::RowOutOfRange(0));
        assert_eq!(cloud.valid_count(), 0);

        // an interior stripe maps inside the projector: accepted
        let outcome = sweep_frame(
            &mut cloud,
            &reference,
            &stripe_frame(24),
            &calib,
            &SweepConfig::default(),
        )
        .unwrap();
        assert!(matches!(outcome, SweepOutcome::Points(n) if n > 0));
    }

    #[test]
    fn projector_row_mapping_range() {
        let calib = test_calib();
        let height = calib.projector_height as i64;

        // top of the band maps to row 0, which is invalid
        let row = projector_row(calib.top_line, &calib);
        assert_eq!(row, 0);
        assert!(row <= 0);

        // interior rows map inside the projector
        let row = projector_row(24, &calib);
        assert!(row > 0 && row <= height);

        // rows beyond the band overshoot the projector height
        let row = projector_row(calib.bottom_line + 1, &calib);
        assert!(row > height);
    }

    #[test]
    fn mismatched_frame_is_an_error() {
        let calib = test_calib();
        let reference = black_frame();
        let small = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: WIDTH / 2,
                height: HEIGHT,
            },
            0,
        )
        .unwrap();
        let mut cloud = PointCloudGrid::new(WIDTH, HEIGHT);

        let result = sweep_frame(&mut cloud, &reference, &small, &calib, &SweepConfig::default());
        assert!(matches!(result, Err(ScanError::FrameMismatch)));
    }
}
