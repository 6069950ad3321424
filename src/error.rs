//! Error types for every stage of report generation.

use crate::pipeline::Stage;
use crate::render::DocumentKind;
use std::error::Error as StdError;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Malformed report request. Raised before any aggregation or rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported report type '{value}' (supported: {})", .supported.join(", "))]
    UnsupportedReportType {
        value: String,
        supported: Vec<&'static str>,
    },

    #[error("unsupported output format '{value}' (supported: {})", .supported.join(", "))]
    UnsupportedFormat {
        value: String,
        supported: Vec<&'static str>,
    },

    #[error("unsupported period '{value}' (supported: {})", .supported.join(", "))]
    UnsupportedPeriod {
        value: String,
        supported: Vec<&'static str>,
    },

    #[error("cutoff date '{0}' is not a valid YYYY-MM-DD date")]
    InvalidCutoffDate(String),

    #[error("cutoff date {cutoff} is after today ({today})")]
    CutoffInFuture {
        cutoff: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },
}

/// Input that cannot be reduced to meaningful statistics.
///
/// Individual malformed fields never raise this; they are normalized to
/// defaults at the record boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("{field} overflowed to a non-finite value over {records} records")]
    NonFinite { field: &'static str, records: usize },
}

/// A document backend failed. No bytes are returned alongside it.
#[derive(Debug, Error)]
#[error("failed to render {kind}: {source}")]
pub struct RenderError {
    pub kind: DocumentKind,
    #[source]
    pub source: BoxError,
}

impl RenderError {
    pub fn new(kind: DocumentKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

/// Failure while producing the final payload.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to assemble archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive spool I/O failed: {0}")]
    Spool(#[from] std::io::Error),
}

/// Top-level error returned by [`crate::pipeline::ReportPipeline::run`].
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid report configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("rendering failed: {0}")]
    Render(#[source] RenderError),

    #[error("dispatch failed: {0}")]
    Dispatch(DispatchError),
}

impl From<DispatchError> for ReportError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Render(err) => ReportError::Render(err),
            other => ReportError::Dispatch(other),
        }
    }
}

impl ReportError {
    /// Stage at which the pipeline stopped.
    pub fn stage(&self) -> Stage {
        match self {
            ReportError::Validation(_) => Stage::Idle,
            ReportError::Aggregation(_) => Stage::Aggregating,
            ReportError::Render(_) => Stage::Rendering,
            ReportError::Dispatch(_) => Stage::Dispatching,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_supported_values() {
        let err = ValidationError::UnsupportedFormat {
            value: "docx".into(),
            supported: vec!["document", "spreadsheet", "both"],
        };
        assert_eq!(
            err.to_string(),
            "unsupported output format 'docx' (supported: document, spreadsheet, both)"
        );
    }

    #[test]
    fn render_failures_inside_dispatch_surface_as_render_stage() {
        let render = RenderError::new(DocumentKind::Spreadsheet, "disk full");
        let err = ReportError::from(DispatchError::Render(render));
        assert_eq!(err.stage(), Stage::Rendering);
        assert!(err.to_string().contains("spreadsheet-workbook"));
        assert!(StdError::source(&err).is_some());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "spool closed");
        let err = ReportError::from(DispatchError::Spool(io));
        assert_eq!(err.stage(), Stage::Dispatching);
    }
}
