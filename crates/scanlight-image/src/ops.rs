use rayon::prelude::*;

use crate::error::ImageError;
use crate::image::Image;

fn check_same_size<const C1: usize, const C2: usize>(
    a: &Image<u8, C1>,
    b: &Image<u8, C2>,
) -> Result<(), ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::ImageSizeMismatch(
            a.width(),
            a.height(),
            b.width(),
            b.height(),
        ));
    }
    Ok(())
}

/// Compute the saturating per-channel difference `src - ref`.
///
/// Channels that would underflow clamp to zero, matching a saturating
/// subtraction of the reference (background) frame from the current frame.
///
/// # Arguments
///
/// * `src` - The current frame.
/// * `reference` - The reference frame to subtract.
/// * `dst` - Pre-allocated output image of the same size.
///
/// # Errors
///
/// Returns an error if the image sizes do not match.
pub fn saturating_diff(
    src: &Image<u8, 3>,
    reference: &Image<u8, 3>,
    dst: &mut Image<u8, 3>,
) -> Result<(), ImageError> {
    check_same_size(src, reference)?;
    check_same_size(src, dst)?;

    dst.as_slice_mut()
        .par_iter_mut()
        .zip(src.as_slice().par_iter().zip(reference.as_slice().par_iter()))
        .for_each(|(d, (&s, &r))| {
            *d = s.saturating_sub(r);
        });

    Ok(())
}

/// Convert a BGR image to a single-channel grayscale image.
///
/// Uses the standard luma weights (0.114, 0.587, 0.299) for the B, G and R
/// channels, rounding to the nearest integer.
///
/// # Arguments
///
/// * `src` - The BGR input image.
/// * `dst` - Pre-allocated single-channel output image of the same size.
///
/// # Errors
///
/// Returns an error if the image sizes do not match.
pub fn gray_from_bgr(src: &Image<u8, 3>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    check_same_size(src, dst)?;

    dst.as_slice_mut()
        .par_iter_mut()
        .zip(src.as_slice().par_chunks_exact(3))
        .for_each(|(d, bgr)| {
            let gray =
                0.114 * f32::from(bgr[0]) + 0.587 * f32::from(bgr[1]) + 0.299 * f32::from(bgr[2]);
            *d = gray.round() as u8;
        });

    Ok(())
}
