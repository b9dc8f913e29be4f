//! Perspective rectification of a scan into the template frame.

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::error::{Corner, PipelineError};
use crate::register::FiducialDetection;
use crate::template::TemplateCoordinates;

/// Warp the scan so the detected fiducial centers land on their expected
/// template positions. Output is exactly page-sized, white where the scan
/// does not cover.
///
/// With four correspondences the control-point solve is exact; a collinear
/// or near-singular layout yields `HomographyDegenerate`.
pub fn rectify(
    scan: &RgbaImage,
    detection: &FiducialDetection,
    coords: &TemplateCoordinates,
) -> Result<RgbaImage, PipelineError> {
    let mut src = [(0.0f32, 0.0f32); 4];
    let mut dst = [(0.0f32, 0.0f32); 4];
    for (i, corner) in Corner::ALL.into_iter().enumerate() {
        let marker = detection
            .marker(corner)
            .ok_or_else(|| PipelineError::FiducialsMissing {
                found: detection.found(),
            })?;
        src[i] = (marker.center.0 as f32, marker.center.1 as f32);
        let expected = coords.markers.center(corner);
        dst[i] = (expected.0 as f32, expected.1 as f32);
    }

    let projection =
        Projection::from_control_points(src, dst).ok_or(PipelineError::HomographyDegenerate)?;

    let white = Rgba([255u8, 255, 255, 255]);
    let mut out = RgbaImage::from_pixel(coords.page_width, coords.page_height, white);
    warp_into(scan, &projection, Interpolation::Bilinear, white, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::register::Marker;
    use crate::template::{render_blank_page, template_coordinates};
    use image::GrayImage;

    fn marker_at(center: (f64, f64)) -> Option<Marker> {
        Some(Marker {
            center,
            area: 100.0,
            bbox: [center; 4],
        })
    }

    fn detection_with_centers(
        centers: [(f64, f64); 4],
        width: u32,
        height: u32,
    ) -> FiducialDetection {
        FiducialDetection {
            top_left: marker_at(centers[0]),
            top_right: marker_at(centers[1]),
            bottom_left: marker_at(centers[2]),
            bottom_right: marker_at(centers[3]),
            success: true,
            binarized: GrayImage::new(width, height),
        }
    }

    #[test]
    fn identity_correspondences_preserve_the_page() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let page = render_blank_page(&config, &coords, &['A'], None);

        let detection = detection_with_centers(
            [
                coords.markers.top_left,
                coords.markers.top_right,
                coords.markers.bottom_left,
                coords.markers.bottom_right,
            ],
            page.width(),
            page.height(),
        );

        let warped = rectify(&page, &detection, &coords).unwrap();
        assert_eq!(warped.dimensions(), page.dimensions());

        // Spot-check the fiducial centers: identity warp leaves them black.
        for corner in Corner::ALL {
            let (cx, cy) = coords.markers.center(corner);
            let pixel = warped.get_pixel(cx.round() as u32, cy.round() as u32);
            assert!(pixel.0[0] < 64, "{corner} center should remain dark");
        }
    }

    #[test]
    fn collinear_markers_are_degenerate() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let page = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));

        let detection = detection_with_centers(
            [(10.0, 10.0), (20.0, 20.0), (30.0, 30.0), (40.0, 40.0)],
            100,
            100,
        );

        match rectify(&page, &detection, &coords) {
            Err(PipelineError::HomographyDegenerate) => {}
            other => panic!("expected degenerate homography, got {other:?}"),
        }
    }

    #[test]
    fn missing_marker_is_reported() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let page = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));

        let mut detection =
            detection_with_centers([(10.0, 10.0), (90.0, 10.0), (10.0, 90.0), (90.0, 90.0)], 100, 100);
        detection.bottom_right = None;
        detection.success = false;

        match rectify(&page, &detection, &coords) {
            Err(PipelineError::FiducialsMissing { found }) => {
                assert_eq!(found.len(), 3);
            }
            other => panic!("expected missing fiducials, got {other:?}"),
        }
    }
}
