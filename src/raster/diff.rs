//! Template differencing: isolate user ink by subtracting the rendered
//! reference page from the rectified scan.

use image::{GrayImage, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::raster::{binarize, to_gray};

/// Pre-difference blur sigma. Absorbs sub-pixel registration jitter so the
/// printed template cancels instead of ghosting.
const REGISTRATION_BLUR_SIGMA: f32 = 0.6;

/// Subtract the blank reference from the rectified scan.
///
/// Both images are grayscaled and lightly blurred, differenced per pixel,
/// blurred once more to heal one-pixel stroke breaks, then thresholded.
/// Returns `(healed difference, binary ink mask)`; the mask is ink=255.
///
/// The images must share dimensions; the rectifier guarantees this.
pub fn subtract_template(
    scan: &RgbaImage,
    reference: &RgbaImage,
    threshold: u8,
) -> (GrayImage, GrayImage) {
    debug_assert_eq!(scan.dimensions(), reference.dimensions());

    let scan_gray = gaussian_blur_f32(&to_gray(scan), REGISTRATION_BLUR_SIGMA);
    let ref_gray = gaussian_blur_f32(&to_gray(reference), REGISTRATION_BLUR_SIGMA);

    let mut diff = GrayImage::new(scan_gray.width(), scan_gray.height());
    for ((s, r), d) in scan_gray
        .pixels()
        .zip(ref_gray.pixels())
        .zip(diff.pixels_mut())
    {
        d.0[0] = s.0[0].abs_diff(r.0[0]);
    }

    let healed = gaussian_blur_f32(&diff, REGISTRATION_BLUR_SIGMA);
    let mask = binarize(&healed, threshold, false);

    let ink = mask.pixels().filter(|p| p.0[0] == 255).count();
    debug!(threshold, ink_pixels = ink, "template subtracted");
    (healed, mask)
}
