//! Document backends. Each one turns a [`ReportLayout`] into a complete file
//! in memory or fails without returning bytes.

mod pdf;
mod xlsx;

pub use pdf::PdfRenderer;
pub use xlsx::XlsxRenderer;

use crate::error::RenderError;
use crate::sections::ReportLayout;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    PageFlow,
    Spreadsheet,
    Archive,
}

impl DocumentKind {
    pub fn media_type(self) -> &'static str {
        match self {
            DocumentKind::PageFlow => "application/pdf",
            DocumentKind::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            DocumentKind::Archive => "application/zip",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::PageFlow => "pdf",
            DocumentKind::Spreadsheet => "xlsx",
            DocumentKind::Archive => "zip",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::PageFlow => "page-flow-document",
            DocumentKind::Spreadsheet => "spreadsheet-workbook",
            DocumentKind::Archive => "archive",
        })
    }
}

pub trait Renderer: Send + Sync {
    fn kind(&self) -> DocumentKind;

    fn render(&self, layout: &ReportLayout) -> Result<Vec<u8>, RenderError>;
}

/// Rendered payload handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn media_type(&self) -> &'static str {
        self.kind.media_type()
    }
}
