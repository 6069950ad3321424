//! Report engine for POA public-works project records: aggregates a record
//! set into statistics and renders it as a PDF, an XLSX workbook, or a zip
//! bundle of both.

pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod sections;
pub mod stats;
pub mod telemetry;
pub mod types;
pub mod util;

pub use config::{OutputFormat, Period, ReportConfiguration, ReportRequest, ReportType, Settings};
pub use dispatch::{FormatDispatcher, ReportOutput};
pub use error::{AggregationError, DispatchError, RenderError, ReportError, ValidationError};
pub use pipeline::{ReportPipeline, ReportRun, Stage};
pub use render::{DocumentKind, RenderedDocument, Renderer};
pub use sections::{ContentBlock, ReportLayout, SectionBuilder};
pub use stats::aggregate;
pub use types::{ProjectRecord, RawRecord, StatisticsBundle};
