use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scanlight_3d::cloud::PointCloudGrid;
use scanlight_3d::ops::euclidean_distance;
use scanlight_3d::ransac::PlaneRansacConfig;
use scanlight_reconstruct::{
    locate_landmarks, ColorModelSet, LandmarkConfig, MarkerColor, RefinementSchedule,
};

/// Edge length of one marker patch in scene units (centimeters).
const PATCH_EXTENT: f64 = 6.0;
/// Samples per patch side.
const STEPS: usize = 41;
/// Bound of the uniform coordinate noise (roughly sigma = 0.1).
const NOISE: f64 = 0.15;

/// The corner the three marker planes meet at.
const CORNER: [f64; 3] = [10.0, 20.0, 30.0];

fn mean_bgr(models: &ColorModelSet, color: MarkerColor) -> [u8; 3] {
    let mean = models.model(color).mean();
    [
        mean[0].round() as u8,
        mean[1].round() as u8,
        mean[2].round() as u8,
    ]
}

/// Build a cloud holding three noisy square patches, one per marker color,
/// lying on the three axis-aligned planes through `CORNER`.
fn corner_target_cloud(models: &ColorModelSet, rng: &mut StdRng) -> PointCloudGrid {
    // each patch occupies its own block of rows, away from the 2-pixel border
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
                // blue spans the x = const plane, red y = const, green z = const
                let ideal = match color {
                    MarkerColor::Blue => [CORNER[0], CORNER[1] + s, CORNER[2] + t],
                    MarkerColor::Red => [CORNER[0] + s, CORNER[1], CORNER[2] + t],
                    MarkerColor::Green => [CORNER[0] + s, CORNER[1] + t, CORNER[2]],
                };
                let point = [
                    ideal[0] + rng.random_range(-NOISE..NOISE),
                    ideal[1] + rng.random_range(-NOISE..NOISE),
                    ideal[2] + rng.random_range(-NOISE..NOISE),
                ];
                cloud.set(block * (STEPS + 4) + 2 + i, 2 + j, point, bgr);
            }
        }
    }
    cloud
}

/// Localization parameters scaled to the centimeter-unit synthetic scene;
/// the defaults target the meter-unit scanning rig.
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

#[test]
fn recovers_corner_landmark_from_synthetic_target() {
    let models = ColorModelSet::reference_rig();
    let mut rng = StdRng::seed_from_u64(1234);
    let cloud = corner_target_cloud(&models, &mut rng);

    let estimates = locate_landmarks(&cloud, &models, &scene_config(), 99);

    let full = estimates
        .full_region
        .expect("full-region estimator must produce a landmark");
    assert!(
        euclidean_distance(&full, &CORNER) < 1.0,
        "full-region landmark {full:?} too far from {CORNER:?}"
    );

    let disk = estimates
        .center_disk
        .expect("center-disk estimator must produce a landmark");
    assert!(
        euclidean_distance(&disk, &CORNER) < 1.0,
        "center-disk landmark {disk:?} too far from {CORNER:?}"
    );
}

#[test]
fn landmark_localization_is_deterministic_for_a_seed() {
    let models = ColorModelSet::reference_rig();
    let mut rng = StdRng::seed_from_u64(1234);
    let cloud = corner_target_cloud(&models, &mut rng);
    let config = scene_config();

    let a = locate_landmarks(&cloud, &models, &config, 7);
    let b = locate_landmarks(&cloud, &models, &config, 7);
    assert_eq!(a, b);
}
