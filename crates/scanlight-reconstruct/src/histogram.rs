/// Fixed quantization of coordinates into histogram bins (bins per unit).
const HISTOGRAM_SCALE: f64 = 100.0;

/// A coordinate axis of a 3D point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    #[inline]
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Create a gaussian smoothing kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel, normalized to sum to one.
fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f64> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size - 1) as f64 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f64 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f64>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Convolve a histogram with a 1D kernel, zero-padded at the borders.
fn convolve_1d(hist: &[f64], kernel: &[f64]) -> Vec<f64> {
    let radius = kernel.len() / 2;
    let mut out = vec![0.0; hist.len()];
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let j = i as isize + k as isize - radius as isize;
            if j >= 0 && (j as usize) < hist.len() {
                acc += w * hist[j as usize];
            }
        }
        *o = acc;
    }
    out
}

/// Locate the mode of a coordinate distribution by a smoothed histogram.
///
/// The coordinates of the given axis are quantized to centimeter-scale bins
/// spanning `[min, max]`, counted, smoothed with a gaussian of the given
/// variance, and the coordinate of the maximal smoothed bin is returned in
/// original units. A smoothed mode is used instead of the raw mean because
/// the mean is contaminated by stray misclassified points.
///
/// # Arguments
///
/// * `points` - The point set of one color class.
/// * `axis` - The coordinate axis whose mode is estimated.
/// * `min`, `max` - Domain of the axis values (from the cloud bounds).
/// * `variance` - Variance of the gaussian smoothing kernel, in bins.
/// * `x_interval` - Optional `[lo, hi]` restriction on the *x* coordinate of
///   counted points, used to condition the y and z modes on the x mode.
///
/// # Returns
///
/// The axis value of the smoothed histogram peak, or `None` when the domain
/// is empty or no point fell inside the restriction interval.
pub fn histogram_mode(
    points: &[[f64; 3]],
    axis: Axis,
    min: f64,
    max: f64,
    variance: f64,
    x_interval: Option<(f64, f64)>,
) -> Option<f64> {
    if !min.is_finite() || !max.is_finite() || max < min {
        return None;
    }

    let min_scaled = (min * HISTOGRAM_SCALE).round();
    let max_scaled = (max * HISTOGRAM_SCALE).round();
    let num_bins = (max_scaled - min_scaled) as usize + 1;

    let mut hist = vec![0.0f64; num_bins];
    let mut counted = 0usize;
    for p in points {
        if let Some((lo, hi)) = x_interval {
            if p[0] < lo || p[0] > hi {
                continue;
            }
        }
        let bin = (p[axis.index()] * HISTOGRAM_SCALE - min_scaled).floor();
        if bin >= 0.0 && (bin as usize) < num_bins {
            hist[bin as usize] += 1.0;
            counted += 1;
        }
    }
    if counted == 0 {
        log::warn!("histogram over {:?} axis counted no points", axis);
        return None;
    }

    let smoothed = if variance > 0.0 {
        let sigma = variance.sqrt();
        let radius = (4.0 * sigma).ceil() as usize;
        convolve_1d(&hist, &gaussian_kernel_1d(2 * radius + 1, sigma))
    } else {
        hist
    };

    // first maximal bin wins
    let mut peak = 0usize;
    for (i, v) in smoothed.iter().enumerate() {
        if *v > smoothed[peak] {
            peak = i;
        }
    }

    Some((peak as f64 + min_scaled) / HISTOGRAM_SCALE)
}
