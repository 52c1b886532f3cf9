use rand::rngs::StdRng;
use rand::SeedableRng;

use scanlight_3d::cloud::PointCloudGrid;
use scanlight_3d::ops::euclidean_distance;
use scanlight_3d::plane::{intersect_three_planes, PlaneModel};
use scanlight_3d::ransac::{fit_plane_ransac, PlaneRansacConfig};
use scanlight_calib::ScannerCalibration;
use scanlight_image::Image;

use crate::classify::{classify_cloud, ClassifiedCloud};
use crate::color_model::{ColorModelSet, MarkerColor};
use crate::error::ScanError;
use crate::histogram::{histogram_mode, Axis};
use crate::refine::{refine_centers, MarkerCenters, RefinementSchedule};
use crate::sweep::{sweep_frame, SweepConfig, SweepOutcome};

/// Parameters of the landmark localization stage.
#[derive(Debug, Clone)]
pub struct LandmarkConfig {
    /// Minimum Gaussian density for a point to be classified.
    pub density_threshold: f64,
    /// Variance of the histogram smoothing kernel, in bins.
    pub histogram_variance: f64,
    /// Shrinking schedule of the center refinement.
    pub schedule: RefinementSchedule,
    /// Selection radius around each center for the full-region estimator.
    pub full_region_radius: f64,
    /// Selection radius around each center for the center-disk estimator.
    pub center_disk_radius: f64,
    /// Plane fit parameters of the full-region estimator.
    pub full_region_ransac: PlaneRansacConfig,
    /// Plane fit parameters of the first center-disk fit.
    pub center_disk_first_ransac: PlaneRansacConfig,
    /// Plane fit parameters of the remaining center-disk fits.
    pub center_disk_rest_ransac: PlaneRansacConfig,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            density_threshold: 1e-9,
            histogram_variance: 3.0,
            schedule: RefinementSchedule::FULL_TARGET,
            full_region_radius: 0.03,
            center_disk_radius: 0.008,
            full_region_ransac: PlaneRansacConfig {
                iterations: 100,
                inlier_threshold: 0.01,
                min_inliers: 10,
                orthogonality_tolerance: 1e-3,
            },
            center_disk_first_ransac: PlaneRansacConfig {
                iterations: 200,
                inlier_threshold: 0.002,
                min_inliers: 10,
                orthogonality_tolerance: 1e-3,
            },
            center_disk_rest_ransac: PlaneRansacConfig {
                iterations: 100,
                inlier_threshold: 0.005,
                min_inliers: 10,
                orthogonality_tolerance: 1e-3,
            },
        }
    }
}

/// Parameters of a full acquisition session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Sweep detector parameters.
    pub sweep: SweepConfig,
    /// Landmark localization parameters.
    pub landmark: LandmarkConfig,
}

/// The two landmark estimates of one session.
///
/// `None` marks an estimator that failed (empty cluster, failed fit or
/// degenerate intersection); a session with a failed estimator is still
/// usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkEstimates {
    /// Estimate from the full classified regions.
    pub full_region: Option<[f64; 3]>,
    /// Estimate from the disks around the refined centers.
    pub center_disk: Option<[f64; 3]>,
}

/// Locate the marker corner landmark in an accumulated cloud.
///
/// Runs the full localization chain: classification, histogram bootstrap of
/// the three centers, Gauss-Seidel center refinement, then the two
/// estimators (full-region and center-disk), each fitting three
/// orthogonality-constrained planes and intersecting them.
///
/// # Arguments
///
/// * `cloud` - The accumulated point cloud.
/// * `models` - Color models of the three markers.
/// * `config` - Localization parameters.
/// * `seed` - Seed for the plane fitter's random sampling; equal seeds on
///   equal clouds give identical results.
pub fn locate_landmarks(
    cloud: &PointCloudGrid,
    models: &ColorModelSet,
    config: &LandmarkConfig,
    seed: u64,
) -> LandmarkEstimates {
    let failed = LandmarkEstimates {
        full_region: None,
        center_disk: None,
    };

    let classified = classify_cloud(cloud, models, config.density_threshold);
    let Some(mut centers) = bootstrap_centers(&classified, config) else {
        log::warn!("center bootstrap failed, no landmark");
        return failed;
    };
    refine_centers(&classified, &mut centers, &config.schedule);

    let mut rng = StdRng::seed_from_u64(seed);
    LandmarkEstimates {
        full_region: full_region_estimate(&classified, &centers, config, &mut rng),
        center_disk: center_disk_estimate(cloud, &centers, config, &mut rng),
    }
}

/// Initial centers from the per-axis histogram modes of each color class.
///
/// The x mode is estimated first over the full x range of the cloud; the y
/// and z modes are then restricted to points whose x lies within a kernel
/// width of the x mode.
fn bootstrap_centers(classified: &ClassifiedCloud, config: &LandmarkConfig) -> Option<MarkerCenters> {
    let bounds = &classified.bounds;
    if bounds.is_empty() {
        return None;
    }
    let variance = config.histogram_variance;

    let mut centers = [[0.0f64; 3]; 3];
    for (center, color) in centers.iter_mut().zip([
        MarkerColor::Blue,
        MarkerColor::Green,
        MarkerColor::Red,
    ]) {
        let points = classified.points(color);
        let x = histogram_mode(points, Axis::X, bounds.min[0], bounds.max[0], variance, None)?;
        let window = (x - variance / 100.0, x + variance / 100.0);
        let y = histogram_mode(
            points,
            Axis::Y,
            bounds.min[1],
            bounds.max[1],
            variance,
            Some(window),
        )?;
        let z = histogram_mode(
            points,
            Axis::Z,
            bounds.min[2],
            bounds.max[2],
            variance,
            Some(window),
        )?;
        *center = [x, y, z];
    }

    Some(MarkerCenters {
        blue: centers[0],
        green: centers[1],
        red: centers[2],
    })
}

/// The constrained fit order shared by both estimators.
const FIT_ORDER: [MarkerColor; 3] = [MarkerColor::Blue, MarkerColor::Red, MarkerColor::Green];

/// Fit the three marker planes in order, each constrained against the
/// normals fitted before it, and intersect them.
fn fit_and_intersect(
    select: impl Fn(MarkerColor) -> Vec<[f64; 3]>,
    config_for: impl Fn(usize) -> PlaneRansacConfig,
    rng: &mut StdRng,
) -> Option<[f64; 3]> {
    let mut planes: Vec<PlaneModel> = Vec::with_capacity(3);
    for (i, color) in FIT_ORDER.into_iter().enumerate() {
        let points = select(color);
        let mut fit_config = config_for(i);
        if i > 0 {
            // later fits on small disks relax the inlier demand
            fit_config.min_inliers = fit_config.min_inliers.min(points.len().saturating_sub(2));
        }
        let priors: Vec<[f64; 3]> = planes.iter().map(|p| p.normal).collect();
        let plane = fit_plane_ransac(&points, &fit_config, &priors, rng)?;
        planes.push(plane);
    }
    intersect_three_planes(&planes[0], &planes[1], &planes[2])
}

/// Landmark from the full classified regions around each center.
fn full_region_estimate(
    classified: &ClassifiedCloud,
    centers: &MarkerCenters,
    config: &LandmarkConfig,
    rng: &mut StdRng,
) -> Option<[f64; 3]> {
    fit_and_intersect(
        |color| {
            classified
                .points(color)
                .iter()
                .filter(|p| euclidean_distance(p, &centers.center(color)) < config.full_region_radius)
                .copied()
                .collect()
        },
        |_| config.full_region_ransac.clone(),
        rng,
    )
}

/// Landmark from small disks of the raw cloud around each center.
///
/// Unlike the full-region estimator this scans the whole cloud grid, so
/// valid points the classifier left unassigned still participate.
fn center_disk_estimate(
    cloud: &PointCloudGrid,
    centers: &MarkerCenters,
    config: &LandmarkConfig,
    rng: &mut StdRng,
) -> Option<[f64; 3]> {
    fit_and_intersect(
        |color| {
            cloud
                .iter_valid()
                .map(|(_, _, p, _)| p)
                .filter(|p| {
                    euclidean_distance(p, &centers.center(color)) < config.center_disk_radius
                })
                .collect()
        },
        |i| {
            if i == 0 {
                config.center_disk_first_ransac.clone()
            } else {
                config.center_disk_rest_ransac.clone()
            }
        },
        rng,
    )
}

/// One acquisition session: a reference frame, the accumulating cloud and
/// the calibration it was captured under.
#[derive(Debug)]
pub struct ScanSession {
    calib: ScannerCalibration,
    config: SessionConfig,
    models: ColorModelSet,
    reference: Image<u8, 3>,
    cloud: PointCloudGrid,
}

impl ScanSession {
    /// Start a session from a calibration and a reference (background) frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the calibration is internally inconsistent.
    pub fn new(
        calib: ScannerCalibration,
        reference: Image<u8, 3>,
        models: ColorModelSet,
        config: SessionConfig,
    ) -> Result<Self, ScanError> {
        calib.validate()?;
        let cloud = PointCloudGrid::new(reference.width(), reference.height());
        Ok(Self {
            calib,
            config,
            models,
            reference,
            cloud,
        })
    }

    /// Feed the next captured frame into the cloud.
    ///
    /// Frames must be processed in arrival order; later frames may overwrite
    /// cloud cells written by earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame shape does not match the reference.
    pub fn process_frame(&mut self, frame: &Image<u8, 3>) -> Result<SweepOutcome, ScanError> {
        sweep_frame(
            &mut self.cloud,
            &self.reference,
            frame,
            &self.calib,
            &self.config.sweep,
        )
    }

    /// Read access to the accumulated cloud.
    pub fn cloud(&self) -> &PointCloudGrid {
        &self.cloud
    }

    /// Run the landmark localization on the accumulated cloud.
    pub fn locate_landmarks(&self, seed: u64) -> LandmarkEstimates {
        locate_landmarks(&self.cloud, &self.models, &self.config.landmark, seed)
    }
}

/// Per-component mean and standard deviation of a landmark stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamStats {
    /// Number of successful estimates in the stream.
    pub count: usize,
    /// Component-wise mean of the estimates.
    pub mean: [f64; 3],
    /// Component-wise standard deviation of the estimates.
    pub stddev: [f64; 3],
}

/// Accumulates landmark estimates over repeated sessions and summarizes the
/// spread of each estimator stream.
#[derive(Debug, Clone, Default)]
pub struct LandmarkStats {
    full_region: Vec<[f64; 3]>,
    center_disk: Vec<[f64; 3]>,
}

impl LandmarkStats {
    /// Record the estimates of one session; failed estimators are skipped.
    pub fn record(&mut self, estimates: &LandmarkEstimates) {
        if let Some(p) = estimates.full_region {
            self.full_region.push(p);
        }
        if let Some(p) = estimates.center_disk {
            self.center_disk.push(p);
        }
    }

    /// Statistics of the full-region stream, or `None` when empty.
    pub fn full_region(&self) -> Option<StreamStats> {
        stream_stats(&self.full_region)
    }

    /// Statistics of the center-disk stream, or `None` when empty.
    pub fn center_disk(&self) -> Option<StreamStats> {
        stream_stats(&self.center_disk)
    }
}

fn stream_stats(stream: &[[f64; 3]]) -> Option<StreamStats> {
    if stream.is_empty() {
        return None;
    }
    let count = stream.len() as f64;
    let mut mean = [0.0f64; 3];
    for p in stream {
        for axis in 0..3 {
            mean[axis] += p[axis];
        }
    }
    mean.iter_mut().for_each(|m| *m /= count);

    let mut var = [0.0f64; 3];
    for p in stream {
        for axis in 0..3 {
            var[axis] += (p[axis] - mean[axis]).powi(2);
        }
    }
    let stddev = [
        (var[0] / count).sqrt(),
        (var[1] / count).sqrt(),
        (var[2] / count).sqrt(),
    ];

    Some(StreamStats {
        count: stream.len(),
        mean,
        stddev,
    })
}
