use rayon::prelude::*;

use scanlight_3d::cloud::PointCloudGrid;

use crate::color_model::{ColorModelSet, MarkerColor};

/// Number of border pixels excluded from classification.
const BORDER: usize = 2;

/// Axis-aligned bounding box accumulated over the valid cloud points.
///
/// Passed explicitly to the histogram stage instead of living as ambient
/// state next to the cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudBounds {
    /// Minimum observed coordinate per axis.
    pub min: [f64; 3],
    /// Maximum observed coordinate per axis.
    pub max: [f64; 3],
}

impl CloudBounds {
    /// An empty bounding box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Expand the box to include a point.
    pub fn include(&mut self, p: &[f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Merge another bounding box into this one.
    pub fn merge(&mut self, other: &CloudBounds) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
    }

    /// Check whether any point was included.
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }
}

impl Default for CloudBounds {
    fn default() -> Self {
        Self::empty()
    }
}

/// The cloud split into per-marker point sequences, plus the bounding box of
/// every valid point (classified or not).
#[derive(Debug, Clone, Default)]
pub struct ClassifiedCloud {
    /// Points assigned to the blue marker.
    pub blue: Vec<[f64; 3]>,
    /// Points assigned to the green marker.
    pub green: Vec<[f64; 3]>,
    /// Points assigned to the red marker.
    pub red: Vec<[f64; 3]>,
    /// Bounding box over all valid cloud points.
    pub bounds: CloudBounds,
}

impl ClassifiedCloud {
    /// Get the point sequence of a marker color.
    pub fn points(&self, color: MarkerColor) -> &[[f64; 3]] {
        match color {
            MarkerColor::Blue => &self.blue,
            MarkerColor::Green => &self.green,
            MarkerColor::Red => &self.red,
        }
    }
}

/// Per-row partial result of the parallel classification pass.
#[derive(Default)]
struct RowPartial {
    assigned: Vec<(MarkerColor, [f64; 3])>,
    bounds: CloudBounds,
}

/// Classify the valid cloud points by marker color.
///
/// Every valid point outside a 2-pixel border is evaluated under the three
/// Gaussian color models in fixed order (Green, Blue, Red); the point joins
/// the class of the first maximal density, provided that density exceeds
/// `density_threshold`. Points below the threshold join no class. The rows
/// are processed in parallel; the output sequences preserve row-major cloud
/// order.
///
/// # Arguments
///
/// * `cloud` - The accumulated point cloud.
/// * `models` - The three marker color models.
/// * `density_threshold` - Minimum density for a point to be classified.
pub fn classify_cloud(
    cloud: &PointCloudGrid,
    models: &ColorModelSet,
    density_threshold: f64,
) -> ClassifiedCloud {
    let (width, height) = (cloud.width(), cloud.height());
    if height <= 2 * BORDER || width <= 2 * BORDER {
        return ClassifiedCloud::default();
    }

    let partials: Vec<RowPartial> = (BORDER..height - BORDER)
        .into_par_iter()
        .map(|row| {
            let mut partial = RowPartial::default();
            for col in BORDER..width - BORDER {
                if !cloud.is_valid(row, col) {
                    continue;
                }
                let point = cloud.point(row, col);
                partial.bounds.include(&point);

                let bgr = cloud.color(row, col);
                if let Some(color) = classify_sample(models, bgr, density_threshold) {
                    partial.assigned.push((color, point));
                }
            }
            partial
        })
        .collect();

    let mut out = ClassifiedCloud::default();
    for partial in partials {
        out.bounds.merge(&partial.bounds);
        for (color, point) in partial.assigned {
            match color {
                MarkerColor::Blue => out.blue.push(point),
                MarkerColor::Green => out.green.push(point),
                MarkerColor::Red => out.red.push(point),
            }
        }
    }
    out
}

/// Classify a single BGR sample, or `None` when no model clears the
/// threshold. Ties resolve to the first evaluated model (Green, Blue, Red).
fn classify_sample(
    models: &ColorModelSet,
    bgr: [u8; 3],
    density_threshold: f64,
) -> Option<MarkerColor> {
    let mut best_color = None;
    let mut best_density = f64::NEG_INFINITY;
    for color in MarkerColor::ALL {
        let density = models.model(color).evaluate(bgr);
        if density > best_density {
            best_density = density;
            best_color = Some(color);
        }
    }
    if best_density > density_threshold {
        best_color
    } else {
        None
    }
}
