//! Pipeline error taxonomy.
//!
//! Recoverable errors short-circuit a page but are returned inside the
//! processing result together with diagnostics; fatal errors abort before any
//! cell work happens. A blank cell is not an error at all; it simply
//! produces no glyph record.

use thiserror::Error;

/// The four fiducial corners, in page orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

impl std::fmt::Display for Corner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Error)]
pub enum PipelineError {
    /// Rejected before any processing begins: zero or negative dimensions.
    #[error("invalid template config: {0}")]
    ConfigInvalid(String),

    /// One or more corner markers could not be located in the scan.
    /// The detection result still carries whatever was found.
    #[error("fiducial markers missing; found {found:?}")]
    FiducialsMissing { found: Vec<Corner> },

    /// The four marker correspondences were collinear or near-singular.
    #[error("homography degenerate: marker correspondences are near-singular")]
    HomographyDegenerate,

    /// A binary mask did not follow the ink=255 convention and could not be
    /// normalized. This indicates a programming error upstream.
    #[error("binary mask polarity invalid after normalization")]
    InvalidPolarity,

    /// The host's progress callback requested a stop between cells.
    #[error("processing cancelled by host")]
    Cancelled,

    /// The configured template font could not be loaded or parsed.
    #[error("template font unusable: {0}")]
    FontLoad(String),
}
