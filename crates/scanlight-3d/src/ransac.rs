use rand::Rng;

use crate::ops::{cross, dot, normalized, sub};
use crate::plane::PlaneModel;

/// Minimal number of points needed to define a plane.
const MIN_SAMPLE_SIZE: usize = 3;

/// Parameters of the robust plane fit.
#[derive(Debug, Clone)]
pub struct PlaneRansacConfig {
    /// Number of sampling rounds.
    pub iterations: usize,
    /// Maximum perpendicular distance for a point to count as an inlier.
    pub inlier_threshold: f64,
    /// Minimum number of inliers required to accept a candidate.
    pub min_inliers: usize,
    /// Maximum absolute dot product between the unit candidate normal and
    /// each unit prior normal for the candidate to be accepted.
    pub orthogonality_tolerance: f64,
}

impl Default for PlaneRansacConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            inlier_threshold: 0.01,
            min_inliers: 10,
            orthogonality_tolerance: 1e-3,
        }
    }
}

/// Fit a plane to a point set with RANSAC, constrained to be near-orthogonal
/// to previously fitted planes.
///
/// Each round samples 3 distinct points, forms the candidate normal as the
/// cross product of two triangle edges, and counts inliers by perpendicular
/// distance. A candidate replaces the current best only if it meets the
/// minimum inlier count, improves on the best count, and its unit normal is
/// near-orthogonal to every prior normal. Fitting the three marker planes in
/// a fixed order (first unconstrained, second orthogonal to the first, third
/// orthogonal to both) keeps the fitter from re-detecting the same dominant
/// plane.
///
/// # Arguments
///
/// * `points` - The candidate point set.
/// * `config` - Fit parameters.
/// * `prior_normals` - Normals of previously fitted planes the result must be
///   near-orthogonal to (may be empty).
/// * `rng` - Random source for sampling; seed it for reproducible fits.
///
/// # Returns
///
/// The best-supported plane, or `None` when fewer than 3 points were given
/// or no candidate satisfied the constraints.
pub fn fit_plane_ransac<R: Rng + ?Sized>(
    points: &[[f64; 3]],
    config: &PlaneRansacConfig,
    prior_normals: &[[f64; 3]],
    rng: &mut R,
) -> Option<PlaneModel> {
    let n = points.len();
    if n < MIN_SAMPLE_SIZE {
        log::warn!("plane fit needs at least 3 points, got {n}");
        return None;
    }

    let unit_priors: Vec<[f64; 3]> = prior_normals.iter().filter_map(normalized).collect();

    let mut best: Option<PlaneModel> = None;
    let mut best_inliers = 0usize;

    for _ in 0..config.iterations {
        let sample = sample_indices(rng, n, MIN_SAMPLE_SIZE);
        let a = points[sample[0]];
        let b = points[sample[1]];
        let c = points[sample[2]];

        let normal = cross(&sub(&b, &a), &sub(&c, &a));
        let Some(unit_normal) = normalized(&normal) else {
            // collinear sample
            continue;
        };

        let candidate = PlaneModel { normal, point: a };
        let inliers = points
            .iter()
            .filter(|p| candidate.distance_to_point(p) < config.inlier_threshold)
            .count();

        let orthogonal = unit_priors
            .iter()
            .all(|prior| dot(&unit_normal, prior).abs() < config.orthogonality_tolerance);

        if inliers >= config.min_inliers && inliers > best_inliers && orthogonal {
            best_inliers = inliers;
            best = Some(candidate);
        }
    }

    if best.is_none() {
        log::warn!(
            "no plane candidate met the constraints ({} points, {} priors)",
            n,
            prior_normals.len()
        );
    }
    best
}

/// Sample `k` distinct indices from `0..n` using a partial Fisher-Yates shuffle.
fn sample_indices<R: Rng + ?Sized>(rng: &mut R, n: usize, k: usize) -> Vec<usize> {
    debug_assert!(k <= n);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.random_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}
