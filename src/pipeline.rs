//! One report request, end to end: validate, aggregate, build sections,
//! render, dispatch.

use crate::config::{ReportConfiguration, ReportRequest};
use crate::dispatch::{FormatDispatcher, ReportOutput};
use crate::error::ReportError;
use crate::sections::ReportLayout;
use crate::stats::aggregate;
use crate::types::{ProjectRecord, StatisticsBundle};
use chrono::NaiveDate;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Aggregating,
    BuildingSections,
    Rendering,
    Dispatching,
    Done,
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct ReportRun {
    pub stats: StatisticsBundle,
    pub layout: ReportLayout,
    pub output: ReportOutput,
}

pub struct ReportPipeline {
    dispatcher: FormatDispatcher,
}

impl ReportPipeline {
    pub fn new(dispatcher: FormatDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Validate `request` against `today`, then run it.
    pub fn run_request(
        &self,
        request: &ReportRequest,
        today: NaiveDate,
        records: &[ProjectRecord],
    ) -> Result<ReportRun, ReportError> {
        let config = request.validate(today)?;
        self.run(&config, records)
    }

    pub fn run(
        &self,
        config: &ReportConfiguration,
        records: &[ProjectRecord],
    ) -> Result<ReportRun, ReportError> {
        info!(
            report = %config.report_type,
            format = config.format.key(),
            cutoff = %config.cutoff_date,
            records = records.len(),
            "generating report"
        );

        enter(Stage::Aggregating);
        let stats = aggregate(records);
        stats.ensure_finite()?;

        enter(Stage::BuildingSections);
        let layout = self.dispatcher.builder().layout(config, records, &stats);
        debug!(
            blocks = layout.blocks.len(),
            detail_rows = layout.detail.rows.len(),
            "sections built"
        );

        enter(Stage::Rendering);
        let documents = self
            .dispatcher
            .render(config, &layout)
            .map_err(ReportError::Render)?;

        enter(Stage::Dispatching);
        let output = self.dispatcher.bundle(config, documents)?;

        enter(Stage::Done);
        info!(
            file = output.file_name(),
            bytes = output.bytes().len(),
            media_type = output.media_type(),
            "report ready"
        );
        Ok(ReportRun {
            stats,
            layout,
            output,
        })
    }
}

fn enter(stage: Stage) {
    debug!(?stage, "entering stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, ReportType};
    use crate::error::RenderError;
    use crate::render::{DocumentKind, Renderer};
    use crate::sections::{ReportLayout, SectionBuilder};

    struct Failing;

    impl Renderer for Failing {
        fn kind(&self) -> DocumentKind {
            DocumentKind::PageFlow
        }

        fn render(&self, _layout: &ReportLayout) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::new(DocumentKind::PageFlow, "font table missing"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn pipeline() -> ReportPipeline {
        let at = today().and_hms_opt(7, 30, 0).unwrap();
        ReportPipeline::new(FormatDispatcher::new(SectionBuilder::new(at)))
    }

    #[test]
    fn invalid_request_stops_before_aggregation() {
        let request = ReportRequest {
            format: Some("docx".into()),
            ..ReportRequest::default()
        };
        let err = pipeline().run_request(&request, today(), &[]).unwrap_err();
        assert_eq!(err.stage(), Stage::Idle);
    }

    #[test]
    fn non_finite_totals_fail_in_aggregation() {
        let records = vec![
            ProjectRecord {
                modified_budget: f64::MAX,
                ..ProjectRecord::default()
            };
            2
        ];
        let config = ReportConfiguration::new(ReportType::Executive, today());
        let err = pipeline().run(&config, &records).unwrap_err();
        assert_eq!(err.stage(), Stage::Aggregating);
    }

    #[test]
    fn renderer_failure_reports_rendering_stage() {
        let at = today().and_hms_opt(7, 30, 0).unwrap();
        let dispatcher = FormatDispatcher::with_renderers(
            SectionBuilder::new(at),
            Box::new(Failing),
            Box::new(crate::render::XlsxRenderer),
        );
        let config =
            ReportConfiguration::new(ReportType::Risk, today()).with_format(OutputFormat::Both);
        let err = ReportPipeline::new(dispatcher).run(&config, &[]).unwrap_err();
        assert_eq!(err.stage(), Stage::Rendering);
    }

    #[test]
    fn empty_input_still_produces_a_document() {
        let config = ReportConfiguration::new(ReportType::Executive, today());
        let run = pipeline().run(&config, &[]).unwrap();
        assert_eq!(run.stats.total_count, 0);
        assert_eq!(run.output.kind(), DocumentKind::PageFlow);
        assert!(run.output.bytes().starts_with(b"%PDF"));
    }
}
