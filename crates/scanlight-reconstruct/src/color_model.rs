use glam::{DMat3, DVec3};

use crate::error::ScanError;

/// The three painted marker colors of the calibration target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerColor {
    /// The blue marker plane.
    Blue,
    /// The green marker plane.
    Green,
    /// The red marker plane.
    Red,
}

impl MarkerColor {
    /// All marker colors, in classifier evaluation order.
    pub const ALL: [MarkerColor; 3] = [MarkerColor::Green, MarkerColor::Blue, MarkerColor::Red];
}

/// A multivariate Gaussian density model over BGR color samples.
///
/// The inverse covariance and the normalization factor are precomputed at
/// construction, so evaluating a sample is a handful of multiplications.
#[derive(Debug, Clone)]
pub struct GaussianColorModel {
    mean: DVec3,
    inv_covariance: DMat3,
    norm_factor: f64,
}

impl GaussianColorModel {
    /// Create a model from a mean BGR vector and a 3x3 covariance matrix.
    ///
    /// # Arguments
    ///
    /// * `mean` - Mean BGR vector of the color distribution.
    /// * `covariance` - Symmetric 3x3 covariance matrix, row-major.
    ///
    /// # Errors
    ///
    /// Returns an error if the covariance matrix is singular or not positive
    /// definite.
    pub fn new(mean: [f64; 3], covariance: [[f64; 3]; 3]) -> Result<Self, ScanError> {
        // symmetric matrix, rows and columns coincide
        let cov = DMat3::from_cols(
            DVec3::from_array(covariance[0]),
            DVec3::from_array(covariance[1]),
            DVec3::from_array(covariance[2]),
        );
        let det = cov.determinant();
        if !det.is_finite() || det <= f64::EPSILON {
            return Err(ScanError::SingularCovariance);
        }

        let two_pi_cubed = (2.0 * std::f64::consts::PI).powi(3);
        Ok(Self {
            mean: DVec3::from_array(mean),
            inv_covariance: cov.inverse(),
            norm_factor: 1.0 / (two_pi_cubed * det).sqrt(),
        })
    }

    /// Evaluate the Gaussian density of a BGR sample under this model.
    pub fn evaluate(&self, bgr: [u8; 3]) -> f64 {
        let d = DVec3::new(f64::from(bgr[0]), f64::from(bgr[1]), f64::from(bgr[2])) - self.mean;
        let mahalanobis_sq = d.dot(self.inv_covariance * d);
        self.norm_factor * (-0.5 * mahalanobis_sq).exp()
    }

    /// The mean BGR vector of the model.
    pub fn mean(&self) -> [f64; 3] {
        self.mean.to_array()
    }
}

/// The fixed color models of the three markers, estimated offline from
/// painted-target calibration shots.
#[derive(Debug, Clone)]
pub struct ColorModelSet {
    /// Model of the blue marker paint.
    pub blue: GaussianColorModel,
    /// Model of the green marker paint.
    pub green: GaussianColorModel,
    /// Model of the red marker paint.
    pub red: GaussianColorModel,
}

impl ColorModelSet {
    /// The models measured on the reference scanning rig.
    pub fn reference_rig() -> Self {
        let green = GaussianColorModel::new(
            [89.98476454293629, 113.5203139427516, 69.0803324099723],
            [
                [159.8986598476079, 120.4950001662561, 89.770845322959],
                [120.4950001662561, 166.0926159679223, 111.4628187322072],
                [89.770845322959, 111.4628187322072, 109.2779419024306],
            ],
        );
        let blue = GaussianColorModel::new(
            [162.790273556231, 69.31408308004053, 59.89260385005066],
            [
                [247.0512529140221, 23.33132238862042, 9.271295842918425],
                [23.33132238862042, 18.81523226462756, 5.455210543550453],
                [9.271295842918425, 5.455210543550453, 26.2255481338454],
            ],
        );
        let red = GaussianColorModel::new(
            [55.29753265602322, 65.80188679245283, 210.0304789550073],
            [
                [88.49347722135754, 27.61482323301476, 44.47569203806028],
                [27.61482323301476, 41.77134622230733, 70.2651094011009],
                [44.47569203806028, 70.2651094011009, 343.3067633409943],
            ],
        );

        // the rig covariances are fixed and well conditioned
        Self {
            green: green.expect("reference rig green covariance is positive definite"),
            blue: blue.expect("reference rig blue covariance is positive definite"),
            red: red.expect("reference rig red covariance is positive definite"),
        }
    }

    /// Get the model for a marker color.
    pub fn model(&self, color: MarkerColor) -> &GaussianColorModel {
        match color {
            MarkerColor::Blue => &self.blue,
            MarkerColor::Green => &self.green,
            MarkerColor::Red => &self.red,
        }
    }
}

impl Default for ColorModelSet {
    fn default() -> Self {
        Self::reference_rig()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_peaks_at_mean() {
        let models = ColorModelSet::reference_rig();
        for color in MarkerColor::ALL {
            let model = models.model(color);
            let mean = model.mean();
            let at_mean = model.evaluate([
                mean[0].round() as u8,
                mean[1].round() as u8,
                mean[2].round() as u8,
            ]);
            let away = model.evaluate([255, 255, 255]);
            assert!(at_mean > away);
            assert!(at_mean > 1e-9);
        }
    }

    #[test]
    fn singular_covariance_is_rejected() {
        let model = GaussianColorModel::new(
            [0.0, 0.0, 0.0],
            [[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        );
        assert!(model.is_err());
    }

    #[test]
    fn isotropic_density_matches_closed_form() {
        use approx::assert_relative_eq;

        let sigma_sq = 4.0;
        let model = GaussianColorModel::new(
            [10.0, 20.0, 30.0],
            [
                [sigma_sq, 0.0, 0.0],
                [0.0, sigma_sq, 0.0],
                [0.0, 0.0, sigma_sq],
            ],
        )
        .unwrap();

        let expected_peak = 1.0 / ((2.0 * std::f64::consts::PI).powi(3) * sigma_sq.powi(3)).sqrt();
        assert_relative_eq!(model.evaluate([10, 20, 30]), expected_peak, epsilon = 1e-12);

        // one standard deviation along B
        let expected = expected_peak * (-0.5f64).exp();
        assert_relative_eq!(model.evaluate([12, 20, 30]), expected, epsilon = 1e-12);
    }
}
