//! Page registration: locate the corner fiducials in a scan and warp the
//! page into the template coordinate frame.

mod fiducials;
mod rectify;

pub use fiducials::{FiducialDetection, Marker, detect_fiducials};
pub use rectify::rectify;
