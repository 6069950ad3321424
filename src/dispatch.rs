//! Picks the renderer(s) for a request and, for `both`, bundles their output
//! into a single zip archive.

use crate::config::{OutputFormat, ReportConfiguration, DEFAULT_SPOOL_LIMIT};
use crate::error::{DispatchError, RenderError};
use crate::render::{DocumentKind, PdfRenderer, RenderedDocument, Renderer, XlsxRenderer};
use crate::sections::{ReportLayout, SectionBuilder};
use crate::types::{ProjectRecord, StatisticsBundle};
use std::io::{Read, Seek, SeekFrom, Write};
use tempfile::SpooledTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// What a report request produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutput {
    Document(RenderedDocument),
    Archive {
        archive: RenderedDocument,
        /// Entry names inside the archive, in write order.
        entries: Vec<String>,
    },
}

impl ReportOutput {
    pub fn document(&self) -> &RenderedDocument {
        match self {
            ReportOutput::Document(doc) => doc,
            ReportOutput::Archive { archive, .. } => archive,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.document().file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.document().bytes
    }

    pub fn kind(&self) -> DocumentKind {
        self.document().kind
    }

    pub fn media_type(&self) -> &'static str {
        self.document().media_type()
    }
}

pub struct FormatDispatcher {
    builder: SectionBuilder,
    page: Box<dyn Renderer>,
    sheet: Box<dyn Renderer>,
    spool_limit: usize,
}

impl FormatDispatcher {
    pub fn new(builder: SectionBuilder) -> Self {
        Self::with_renderers(builder, Box::new(PdfRenderer), Box::new(XlsxRenderer))
    }

    pub fn with_renderers(
        builder: SectionBuilder,
        page: Box<dyn Renderer>,
        sheet: Box<dyn Renderer>,
    ) -> Self {
        Self {
            builder,
            page,
            sheet,
            spool_limit: DEFAULT_SPOOL_LIMIT,
        }
    }

    /// Bytes the archive may hold in memory before spilling to a temp file.
    pub fn spool_limit(mut self, limit: usize) -> Self {
        self.spool_limit = limit;
        self
    }

    pub fn builder(&self) -> &SectionBuilder {
        &self.builder
    }

    pub fn produce(
        &self,
        config: &ReportConfiguration,
        records: &[ProjectRecord],
        stats: &StatisticsBundle,
    ) -> Result<ReportOutput, DispatchError> {
        let layout = self.builder.layout(config, records, stats);
        let documents = self.render(config, &layout)?;
        self.bundle(config, documents)
    }

    /// Run every renderer the format asks for. Stops at the first failure.
    pub fn render(
        &self,
        config: &ReportConfiguration,
        layout: &ReportLayout,
    ) -> Result<Vec<RenderedDocument>, RenderError> {
        let renderers: Vec<&dyn Renderer> = match config.format {
            OutputFormat::Document => vec![self.page.as_ref()],
            OutputFormat::Spreadsheet => vec![self.sheet.as_ref()],
            OutputFormat::Both => vec![self.page.as_ref(), self.sheet.as_ref()],
        };
        let mut documents = Vec::with_capacity(renderers.len());
        for renderer in renderers {
            let kind = renderer.kind();
            let bytes = renderer.render(layout)?;
            debug!(%kind, bytes = bytes.len(), "rendered");
            documents.push(RenderedDocument {
                kind,
                file_name: format!("{}.{}", config.file_stem(), kind.extension()),
                bytes,
            });
        }
        Ok(documents)
    }

    /// Pass a single document through, or zip several into one archive.
    pub fn bundle(
        &self,
        config: &ReportConfiguration,
        mut documents: Vec<RenderedDocument>,
    ) -> Result<ReportOutput, DispatchError> {
        if documents.len() == 1 && config.format != OutputFormat::Both {
            if let Some(doc) = documents.pop() {
                return Ok(ReportOutput::Document(doc));
            }
        }

        let base = entry_base(config);
        let entries: Vec<String> = documents
            .iter()
            .map(|doc| format!("{}.{}", base, doc.kind.extension()))
            .collect();
        let bytes = self.write_archive(entries.iter().map(String::as_str).zip(&documents))?;
        Ok(ReportOutput::Archive {
            archive: RenderedDocument {
                kind: DocumentKind::Archive,
                file_name: format!("{}.{}", config.file_stem(), DocumentKind::Archive.extension()),
                bytes,
            },
            entries,
        })
    }

    fn write_archive<'a>(
        &self,
        entries: impl Iterator<Item = (&'a str, &'a RenderedDocument)>,
    ) -> Result<Vec<u8>, DispatchError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(SpooledTempFile::new(self.spool_limit));
        for (name, doc) in entries {
            writer.start_file(name, options)?;
            writer.write_all(&doc.bytes)?;
        }
        let mut spool = writer.finish()?;
        debug!(on_disk = spool.is_rolled(), "archive assembled");

        spool.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        spool.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Report name with path separators removed, used for archive entries.
fn entry_base(config: &ReportConfiguration) -> String {
    let cleaned: String = config
        .name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        config.file_stem()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportType;
    use crate::stats::aggregate;
    use chrono::NaiveDate;
    use std::io::Cursor;

    struct Broken;

    impl Renderer for Broken {
        fn kind(&self) -> DocumentKind {
            DocumentKind::Spreadsheet
        }

        fn render(&self, _layout: &ReportLayout) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::new(DocumentKind::Spreadsheet, "workbook writer crashed"))
        }
    }

    struct Fixed(DocumentKind, &'static [u8]);

    impl Renderer for Fixed {
        fn kind(&self) -> DocumentKind {
            self.0
        }

        fn render(&self, _layout: &ReportLayout) -> Result<Vec<u8>, RenderError> {
            Ok(self.1.to_vec())
        }
    }

    fn builder() -> SectionBuilder {
        let at = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        SectionBuilder::new(at)
    }

    fn config(format: OutputFormat) -> ReportConfiguration {
        ReportConfiguration::new(ReportType::Budget, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap())
            .with_format(format)
    }

    fn stub() -> FormatDispatcher {
        FormatDispatcher::with_renderers(
            builder(),
            Box::new(Fixed(DocumentKind::PageFlow, b"page bytes")),
            Box::new(Fixed(DocumentKind::Spreadsheet, b"sheet bytes")),
        )
    }

    #[test]
    fn single_format_returns_renderer_output() {
        let records = vec![ProjectRecord::default()];
        let stats = aggregate(&records);
        let out = stub().produce(&config(OutputFormat::Spreadsheet), &records, &stats).unwrap();
        assert_eq!(out.kind(), DocumentKind::Spreadsheet);
        assert_eq!(out.file_name(), "budget_2026-03-31.xlsx");
        assert_eq!(out.bytes(), b"sheet bytes");
    }

    #[test]
    fn both_formats_are_zipped_under_report_name() {
        let records = vec![ProjectRecord::default()];
        let stats = aggregate(&records);
        let mut cfg = config(OutputFormat::Both);
        cfg.name = "Q1/budget".into();
        let out = stub().spool_limit(16).produce(&cfg, &records, &stats).unwrap();

        let ReportOutput::Archive { archive, entries } = &out else {
            panic!("expected archive, got {out:?}");
        };
        assert_eq!(archive.file_name, "budget_2026-03-31.zip");
        assert_eq!(out.media_type(), "application/zip");
        assert_eq!(entries, &vec!["Q1budget.pdf".to_string(), "Q1budget.xlsx".to_string()]);

        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes.clone())).unwrap();
        assert_eq!(zip.len(), 2);
        let mut content = String::new();
        zip.by_name("Q1budget.xlsx").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "sheet bytes");
    }

    #[test]
    fn failing_renderer_yields_no_archive() {
        let dispatcher = FormatDispatcher::with_renderers(
            builder(),
            Box::new(Fixed(DocumentKind::PageFlow, b"page bytes")),
            Box::new(Broken),
        );
        let records = vec![ProjectRecord::default()];
        let stats = aggregate(&records);
        match dispatcher.produce(&config(OutputFormat::Both), &records, &stats) {
            Err(DispatchError::Render(err)) => assert_eq!(err.kind, DocumentKind::Spreadsheet),
            other => panic!("expected render failure, got {other:?}"),
        }
    }

    #[test]
    fn entry_base_falls_back_to_file_stem() {
        let mut cfg = config(OutputFormat::Both);
        cfg.name = " // ".into();
        assert_eq!(entry_base(&cfg), "budget_2026-03-31");
        cfg.name = "Budget March".into();
        assert_eq!(entry_base(&cfg), "Budget March");
    }
}
