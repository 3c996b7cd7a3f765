//! Error taxonomy for deck export

use thiserror::Error;

/// Everything that can go wrong while turning polygons into a solver deck
#[derive(Debug, Error)]
pub enum ExportError {
    /// Every candidate file name in the probe range is already taken
    #[error("no free file name for `{base}` after {attempts} attempts")]
    ResourceExhausted { base: String, attempts: usize },

    /// Polygon cannot be exported (too few vertices, non-finite or self-intersecting)
    #[error("invalid polygon: {reason}")]
    InvalidPolygon { reason: String },

    /// A per-polygon attribute list does not line up with the polygon list
    #[error("{what} has {found} entries but {expected} polygons were given")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("base file name must not be empty")]
    EmptyBaseName,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("deck template failed to render: {0}")]
    Template(#[from] minijinja::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn invalid_polygon(reason: impl Into<String>) -> Self {
        ExportError::InvalidPolygon {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
