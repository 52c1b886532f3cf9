use scanlight_3d::ops::euclidean_distance;

use crate::classify::ClassifiedCloud;
use crate::color_model::MarkerColor;

/// The current center estimate of each marker cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerCenters {
    /// Center of the blue cluster.
    pub blue: [f64; 3],
    /// Center of the green cluster.
    pub green: [f64; 3],
    /// Center of the red cluster.
    pub red: [f64; 3],
}

impl MarkerCenters {
    /// Get the center of a marker color.
    pub fn center(&self, color: MarkerColor) -> [f64; 3] {
        match color {
            MarkerColor::Blue => self.blue,
            MarkerColor::Green => self.green,
            MarkerColor::Red => self.red,
        }
    }

    fn center_mut(&mut self, color: MarkerColor) -> &mut [f64; 3] {
        match color {
            MarkerColor::Blue => &mut self.blue,
            MarkerColor::Green => &mut self.green,
            MarkerColor::Red => &mut self.red,
        }
    }

    /// The two colors other than `color`.
    fn others(color: MarkerColor) -> [MarkerColor; 2] {
        match color {
            MarkerColor::Blue => [MarkerColor::Green, MarkerColor::Red],
            MarkerColor::Green => [MarkerColor::Blue, MarkerColor::Red],
            MarkerColor::Red => [MarkerColor::Blue, MarkerColor::Green],
        }
    }
}

/// A monotonically shrinking distance schedule for center refinement.
///
/// At each threshold step, each color's center is recomputed as the mean of
/// that color's points lying within the threshold of BOTH other colors'
/// current centers; the thresholds then shrink by `step`. Updates within a
/// step run in `order` and later colors see the centers already updated in
/// the same step (Gauss-Seidel, not Jacobi), which couples the three centers
/// and pulls them toward the common corner of the target.
#[derive(Debug, Clone, Copy)]
pub struct RefinementSchedule {
    /// First (largest) distance threshold.
    pub start: f64,
    /// The loop stops once the threshold is no longer above this value.
    pub stop: f64,
    /// Amount the threshold shrinks after each step.
    pub step: f64,
    /// Update order of the three centers within a step.
    pub order: [MarkerColor; 3],
}

impl RefinementSchedule {
    /// Tight schedule used when the cloud covers little beyond the target.
    pub const FULL_TARGET: Self = Self {
        start: 0.08,
        stop: 0.03,
        step: 0.01,
        order: [MarkerColor::Blue, MarkerColor::Red, MarkerColor::Green],
    };

    /// Wide schedule that first gathers the whole scene, for clouds with
    /// large background regions.
    pub const WIDE: Self = Self {
        start: 1.5,
        stop: 0.05,
        step: 0.02,
        order: [MarkerColor::Green, MarkerColor::Blue, MarkerColor::Red],
    };
}

impl Default for RefinementSchedule {
    fn default() -> Self {
        Self::FULL_TARGET
    }
}

/// Refine the three marker centers over a shrinking distance schedule.
///
/// A step that leaves a color with zero qualifying points keeps that color's
/// previous center and continues; the refinement never fails outright.
///
/// # Arguments
///
/// * `classified` - The per-color point sequences.
/// * `centers` - Initial centers (from the histogram bootstrap); refined in
///   place.
/// * `schedule` - The shrinking threshold schedule.
pub fn refine_centers(
    classified: &ClassifiedCloud,
    centers: &mut MarkerCenters,
    schedule: &RefinementSchedule,
) {
    let mut dist = schedule.start;
    while dist > schedule.stop {
        for color in schedule.order {
            let [other_a, other_b] = MarkerCenters::others(color);
            let (center_a, center_b) = (centers.center(other_a), centers.center(other_b));

            let mut sum = [0.0f64; 3];
            let mut count = 0usize;
            for p in classified.points(color) {
                if euclidean_distance(p, &center_a) < dist
                    && euclidean_distance(p, &center_b) < dist
                {
                    sum[0] += p[0];
                    sum[1] += p[1];
                    sum[2] += p[2];
                    count += 1;
                }
            }

            if count == 0 {
                log::debug!("no {:?} points within {dist} of the other centers", color);
                continue;
            }
            *centers.center_mut(color) = [
                sum[0] / count as f64,
                sum[1] / count as f64,
                sum[2] / count as f64,
            ];
        }
        dist -= schedule.step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassifiedCloud, CloudBounds};
    use approx::assert_relative_eq;

    /// Three small clusters meeting near the origin plus far-away strays.
    fn corner_cloud() -> ClassifiedCloud {
        let mut blue = Vec::new();
        let mut green = Vec::new();
        let mut red = Vec::new();
        for i in 0..10 {
            let t = 0.005 + i as f64 * 0.002;
            blue.push([t, 0.0, 0.0]);
            green.push([0.0, t, 0.0]);
            red.push([0.0, 0.0, t]);
        }
        // strays outside every threshold of the schedule
        blue.push([0.5, 0.0, 0.0]);
        green.push([0.0, 0.5, 0.0]);

        ClassifiedCloud {
            blue,
            green,
            red,
            bounds: CloudBounds::empty(),
        }
    }

    #[test]
    fn centers_contract_toward_corner() {
        let classified = corner_cloud();
        let mut centers = MarkerCenters {
            blue: [0.03, 0.0, 0.0],
            green: [0.0, 0.03, 0.0],
            red: [0.0, 0.0, 0.03],
        };

        refine_centers(&classified, &mut centers, &RefinementSchedule::FULL_TARGET);

        // strays at 0.5 are outside every threshold, so each center is the
        // mean of its near-corner points
        assert!(centers.blue[0] < 0.05);
        assert!(centers.green[1] < 0.05);
        assert!(centers.red[2] < 0.05);
        assert_relative_eq!(centers.blue[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(centers.red[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_class_keeps_previous_center() {
        let classified = ClassifiedCloud {
            blue: vec![],
            green: vec![[0.0, 0.01, 0.0]; 5],
            red: vec![[0.0, 0.0, 0.01]; 5],
            bounds: CloudBounds::empty(),
        };
        let initial = MarkerCenters {
            blue: [1.0, 2.0, 3.0],
            green: [0.0, 0.01, 0.0],
            red: [0.0, 0.0, 0.01],
        };
        let mut centers = initial;

        refine_centers(&classified, &mut centers, &RefinementSchedule::FULL_TARGET);
        assert_eq!(centers.blue, initial.blue);
    }
}
