use argh::FromArgs;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scanlight::reconstruct::{
    locate_landmarks, ColorModelSet, LandmarkConfig, LandmarkStats, MarkerColor,
    RefinementSchedule,
};
use scanlight::threed::cloud::PointCloudGrid;
use scanlight::threed::ops::euclidean_distance;
use scanlight::threed::ransac::PlaneRansacConfig;

#[derive(FromArgs)]
/// Run the landmark localization pipeline on a synthetic corner target and
/// compare both estimators against the ground truth.
struct Args {
    /// rng seed for the synthetic noise and the plane fits
    #[argh(option, short = 's', default = "1234")]
    seed: u64,

    /// bound of the uniform coordinate noise in scene units
    #[argh(option, short = 'n', default = "0.15")]
    noise: f64,

    /// number of localization runs to aggregate
    #[argh(option, short = 'r', default = "10")]
    runs: u64,
}

/// The corner of the synthetic target.
const CORNER: [f64; 3] = [10.0, 20.0, 30.0];
/// Edge length of one marker patch.
const PATCH_EXTENT: f64 = 6.0;
/// Samples per patch side.
const STEPS: usize = 41;

fn mean_bgr(models: &ColorModelSet, color: MarkerColor) -> [u8; 3] {
    let mean = models.model(color).mean();
    [
        mean[0].round() as u8,
        mean[1].round() as u8,
        mean[2].round() as u8,
    ]
}

/// Three noisy marker patches on the axis-aligned planes through `CORNER`.
fn corner_target_cloud(models: &ColorModelSet, noise: f64, rng: &mut StdRng) -> PointCloudGrid {
    let width = STEPS + 4;
    let height = 3 * (STEPS + 4);
    let mut cloud = PointCloudGrid::new(width, height);

    for (block, color) in [MarkerColor::Blue, MarkerColor::Red, MarkerColor::Green]
        .into_iter()
        .enumerate()
    {
        let bgr = mean_bgr(models, color);
        for i in 0..STEPS {
            for j in 0..STEPS {
                let s = PATCH_EXTENT * i as f64 / (STEPS - 1) as f64;
                let t = PATCH_EXTENT * j as f64 / (STEPS - 1) as f64;
                let ideal = match color {
                    MarkerColor::Blue => [CORNER[0], CORNER[1] + s, CORNER[2] + t],
                    MarkerColor::Red => [CORNER[0] + s, CORNER[1], CORNER[2] + t],
                    MarkerColor::Green => [CORNER[0] + s, CORNER[1] + t, CORNER[2]],
                };
                let point = [
                    ideal[0] + rng.random_range(-noise..noise),
                    ideal[1] + rng.random_range(-noise..noise),
                    ideal[2] + rng.random_range(-noise..noise),
                ];
                cloud.set(block * (STEPS + 4) + 2 + i, 2 + j, point, bgr);
            }
        }
    }
    cloud
}

/// Localization parameters scaled to the synthetic scene units.
fn scene_config() -> LandmarkConfig {
    let fit = PlaneRansacConfig {
        iterations: 500,
        inlier_threshold: 0.25,
        min_inliers: 10,
        orthogonality_tolerance: 0.05,
    };
    LandmarkConfig {
        density_threshold: 1e-9,
        histogram_variance: 3.0,
        schedule: RefinementSchedule {
            start: 12.0,
            stop: 0.6,
            step: 0.3,
            order: [MarkerColor::Blue, MarkerColor::Red, MarkerColor::Green],
        },
        full_region_radius: 3.0,
        center_disk_radius: 0.8,
        full_region_ransac: fit.clone(),
        center_disk_first_ransac: fit.clone(),
        center_disk_rest_ransac: fit,
    }
}

fn main() {
    env_logger::init();
    let args: Args = argh::from_env();

    let models = ColorModelSet::reference_rig();
    let config = scene_config();
    let mut stats = LandmarkStats::default();

    for run in 0..args.runs {
        let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(run));
        let cloud = corner_target_cloud(&models, args.noise, &mut rng);
        let estimates = locate_landmarks(&cloud, &models, &config, args.seed.wrapping_add(run));

        match estimates.full_region {
            Some(p) => log::info!(
                "run {run}: full-region landmark {p:?} (error {:.4})",
                euclidean_distance(&p, &CORNER)
            ),
            None => log::warn!("run {run}: full-region estimator failed"),
        }
        match estimates.center_disk {
            Some(p) => log::info!(
                "run {run}: center-disk landmark {p:?} (error {:.4})",
                euclidean_distance(&p, &CORNER)
            ),
            None => log::warn!("run {run}: center-disk estimator failed"),
        }
        stats.record(&estimates);
    }

    println!("ground truth corner: {CORNER:?}");
    match stats.full_region() {
        Some(s) => println!(
            "full-region  ({} runs): mean {:?}, stddev {:?}",
            s.count, s.mean, s.stddev
        ),
        None => println!("full-region  estimator never succeeded"),
    }
    match stats.center_disk() {
        Some(s) => println!(
            "center-disk  ({} runs): mean {:?}, stddev {:?}",
            s.count, s.mean, s.stddev
        ),
        None => println!("center-disk  estimator never succeeded"),
    }
}
