#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Grid-aligned colored point cloud.
pub mod cloud;

/// Vector helpers on `[f64; 3]`.
pub mod ops;

/// Plane model and multi-plane intersection.
pub mod plane;

/// Robust plane fitting with an orthogonality constraint.
pub mod ransac;

/// Ray and plane intersection.
pub mod ray;

pub use crate::cloud::PointCloudGrid;
pub use crate::plane::{intersect_three_planes, PlaneModel};
pub use crate::ransac::{fit_plane_ransac, PlaneRansacConfig};
pub use crate::ray::approximate_ray_plane_intersection;
