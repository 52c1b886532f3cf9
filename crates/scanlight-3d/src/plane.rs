use glam::DVec3;

use crate::ops::{cross, dot, norm, sub};

/// Determinant magnitude below which three planes are considered degenerate.
const DEGENERATE_DETERMINANT: f64 = 1e-20;

/// A plane described by a normal vector and a point on the plane.
///
/// The normal is not normalized; only its direction carries meaning and
/// callers must normalize before interpreting magnitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneModel {
    /// Normal vector of the plane (unnormalized).
    pub normal: [f64; 3],
    /// A point on the plane.
    pub point: [f64; 3],
}

impl PlaneModel {
    /// Perpendicular distance from a point to the plane.
    ///
    /// Returns `f64::INFINITY` for a degenerate (zero-normal) plane so that a
    /// broken model never claims inliers.
    pub fn distance_to_point(&self, p: &[f64; 3]) -> f64 {
        let n = norm(&self.normal);
        if n < f64::EPSILON {
            return f64::INFINITY;
        }
        dot(&self.normal, &sub(p, &self.point)).abs() / n
    }
}

/// Intersect three planes into a single point.
///
/// Solves the 3x3 linear system whose rows are the plane equations via
/// Cramer's rule on the matrix formed by the three normals:
///
/// `p = (1/det) * [(x1.n1)(n2 x n3) + (x2.n2)(n3 x n1) + (x3.n3)(n1 x n2)]`
///
/// # Arguments
///
/// * `p1`, `p2`, `p3` - The three planes.
///
/// # Returns
///
/// The unique intersection point, or `None` when at least two planes are
/// (near-)parallel and the system is degenerate.
pub fn intersect_three_planes(
    p1: &PlaneModel,
    p2: &PlaneModel,
    p3: &PlaneModel,
) -> Option<[f64; 3]> {
    let det = glam::DMat3::from_cols(
        DVec3::from_array(p1.normal),
        DVec3::from_array(p2.normal),
        DVec3::from_array(p3.normal),
    )
    .determinant();
    if det.abs() < DEGENERATE_DETERMINANT {
        log::debug!("three-plane intersection is degenerate (det = {det})");
        return None;
    }

    let a = dot(&p1.point, &p1.normal);
    let b = dot(&p2.point, &p2.normal);
    let c = dot(&p3.point, &p3.normal);

    let n23 = cross(&p2.normal, &p3.normal);
    let n31 = cross(&p3.normal, &p1.normal);
    let n12 = cross(&p1.normal, &p2.normal);

    Some([
        (a * n23[0] + b * n31[0] + c * n12[0]) / det,
        (a * n23[1] + b * n31[1] + c * n12[1]) / det,
        (a * n23[2] + b * n31[2] + c * n12[2]) / det,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_to_point() {
        let plane = PlaneModel {
            normal: [0.0, 0.0, 2.0],
            point: [5.0, 5.0, 1.0],
        };
        assert_relative_eq!(plane.distance_to_point(&[0.0, 0.0, 4.0]), 3.0);
        assert_relative_eq!(plane.distance_to_point(&[9.0, -3.0, 1.0]), 0.0);
    }

    #[test]
    fn degenerate_plane_has_infinite_distance() {
        let plane = PlaneModel {
            normal: [0.0, 0.0, 0.0],
            point: [0.0, 0.0, 0.0],
        };
        assert_eq!(plane.distance_to_point(&[1.0, 1.0, 1.0]), f64::INFINITY);
    }

    #[test]
    fn axis_aligned_corner() {
        let p1 = PlaneModel {
            normal: [1.0, 0.0, 0.0],
            point: [1.0, 7.0, -2.0],
        };
        let p2 = PlaneModel {
            normal: [0.0, 1.0, 0.0],
            point: [0.0, 2.0, 11.0],
        };
        let p3 = PlaneModel {
            normal: [0.0, 0.0, 1.0],
            point: [4.0, 4.0, 3.0],
        };

        let p = intersect_three_planes(&p1, &p2, &p3).unwrap();
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(p[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn oblique_planes() {
        // three planes through (2, -1, 5) with linearly independent normals
        let target = [2.0, -1.0, 5.0];
        let normals = [[1.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 0.0, 1.0]];
        let planes: Vec<PlaneModel> = normals
            .iter()
            .map(|n| PlaneModel {
                normal: *n,
                point: target,
            })
            .collect();

        let p = intersect_three_planes(&planes[0], &planes[1], &planes[2]).unwrap();
        assert_relative_eq!(p[0], target[0], epsilon = 1e-9);
        assert_relative_eq!(p[1], target[1], epsilon = 1e-9);
        assert_relative_eq!(p[2], target[2], epsilon = 1e-9);
    }

    #[test]
    fn parallel_planes_are_degenerate() {
        let p1 = PlaneModel {
            normal: [0.0, 0.0, 1.0],
            point: [0.0, 0.0, 0.0],
        };
        let p2 = PlaneModel {
            normal: [0.0, 0.0, 1.0],
            point: [0.0, 0.0, 5.0],
        };
        let p3 = PlaneModel {
            normal: [1.0, 0.0, 0.0],
            point: [0.0, 0.0, 0.0],
        };

        assert!(intersect_three_planes(&p1, &p2, &p3).is_none());
    }
}
