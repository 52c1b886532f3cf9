#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Statistical color classification of cloud points.
pub mod classify;

/// Gaussian color models of the three target markers.
pub mod color_model;

/// Error types for the reconstruction module.
pub mod error;

/// Smoothed histogram mode estimation.
pub mod histogram;

/// Iterative refinement of the three marker centers.
pub mod refine;

/// Acquisition session and landmark localization.
pub mod session;

/// Sweep-line detection and triangulation.
pub mod sweep;

pub use crate::classify::{classify_cloud, ClassifiedCloud, CloudBounds};
pub use crate::color_model::{ColorModelSet, GaussianColorModel, MarkerColor};
pub use crate::error::ScanError;
pub use crate::histogram::{histogram_mode, Axis};
pub use crate::refine::{refine_centers, MarkerCenters, RefinementSchedule};
pub use crate::session::{
    locate_landmarks, LandmarkConfig, LandmarkEstimates, LandmarkStats, ScanSession,
    SessionConfig, StreamStats,
};
pub use crate::sweep::{sweep_frame, SweepConfig, SweepOutcome};
