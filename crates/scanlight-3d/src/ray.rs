use crate::ops::{add, dot, scale, sub};

/// Denominator threshold below which a ray is considered parallel to the plane.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Approximate the intersection of a camera ray with a projector plane.
///
/// The plane is described in affine form by a direction vector `vp` and a
/// point `qp` on the plane; no explicit unit normal is required. The solve
/// finds the point on the ray `qc + lambda * vc` whose displacement from
/// `qp` is orthogonal to `vp`:
///
/// `lambda = vp . (qp - qc) / (vp . vc)`
///
/// # Arguments
///
/// * `vc` - Direction of the camera ray.
/// * `qc` - Origin of the camera ray.
/// * `vp` - Direction describing the projector plane.
/// * `qp` - A point on the projector plane.
///
/// # Returns
///
/// The intersection point, or `None` when the ray is (near-)parallel to the
/// plane and the pixel cannot be reconstructed.
pub fn approximate_ray_plane_intersection(
    vc: &[f64; 3],
    qc: &[f64; 3],
    vp: &[f64; 3],
    qp: &[f64; 3],
) -> Option<[f64; 3]> {
    let denom = dot(vp, vc);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let lambda = dot(vp, &sub(qp, qc)) / denom;

    Some(add(qc, &scale(vc, lambda)))
}
