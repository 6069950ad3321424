//! Turns records and statistics into an ordered list of content blocks.

use crate::config::ReportConfiguration;
use crate::descriptor::{Cell, Column, Orientation, ReportDescriptor};
use crate::types::{ProjectRecord, StatisticsBundle};
use crate::util::{format_currency, format_int, format_percent};
use chrono::{Local, NaiveDateTime};

/// Status lines shown in the analysis paragraph.
pub const MAX_STATUS_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub label: String,
    pub value: String,
}

impl KeyValue {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub title: String,
    pub subtitle: String,
    pub info: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub heading: String,
    pub lines: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub heading: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub heading: String,
    pub caption: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub text: String,
}

/// One logical section of a report, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Header(Header),
    SummaryParagraph(Summary),
    DataTable(DataTable),
    AnalysisParagraph(Analysis),
    Footer(Footer),
}

/// Everything a renderer needs. Renderers never look at the report type.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub name: String,
    pub orientation: Orientation,
    pub blocks: Vec<ContentBlock>,
    /// Label/value rows for the workbook summary sheet.
    pub key_figures: Vec<KeyValue>,
    pub notes: Vec<String>,
    /// Every record, untruncated, with typed cells.
    pub detail: DataTable,
}

impl ReportLayout {
    pub fn header(&self) -> Option<&Header> {
        self.blocks.iter().find_map(|b| match b {
            ContentBlock::Header(h) => Some(h),
            _ => None,
        })
    }

    pub fn data_table(&self) -> Option<&DataTable> {
        self.blocks.iter().find_map(|b| match b {
            ContentBlock::DataTable(t) => Some(t),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SectionBuilder {
    generated_at: NaiveDateTime,
}

impl SectionBuilder {
    /// Builder whose footer carries `generated_at`.
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self { generated_at }
    }

    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn build(
        &self,
        config: &ReportConfiguration,
        records: &[ProjectRecord],
        stats: &StatisticsBundle,
    ) -> Vec<ContentBlock> {
        let descriptor = ReportDescriptor::for_type(config.report_type);
        let mut blocks = vec![ContentBlock::Header(header(descriptor, config))];

        if descriptor.summary {
            blocks.push(ContentBlock::SummaryParagraph(summary(stats)));
        }
        if descriptor.has_table() {
            blocks.push(ContentBlock::DataTable(data_table(descriptor, records)));
        }
        if config.include_charts && descriptor.analysis {
            blocks.push(ContentBlock::AnalysisParagraph(analysis(stats)));
        }
        blocks.push(ContentBlock::Footer(Footer {
            text: format!(
                "Report generated on {} | POA Reporting System",
                self.generated_at.format("%d/%m/%Y %H:%M")
            ),
        }));
        blocks
    }

    /// Blocks plus the workbook-only parts of the report.
    pub fn layout(
        &self,
        config: &ReportConfiguration,
        records: &[ProjectRecord],
        stats: &StatisticsBundle,
    ) -> ReportLayout {
        let descriptor = ReportDescriptor::for_type(config.report_type);
        let mut notes = Vec::new();
        if config.include_charts {
            notes.push("Charts: included".to_string());
        }
        if config.include_annex {
            notes.push("Annexes: requested".to_string());
        }

        ReportLayout {
            name: config.name.clone(),
            orientation: descriptor.orientation,
            blocks: self.build(config, records, stats),
            key_figures: key_figures(stats),
            notes,
            detail: detail_table(descriptor.detail_columns(), records),
        }
    }
}

fn header(descriptor: &ReportDescriptor, config: &ReportConfiguration) -> Header {
    Header {
        title: descriptor.title.to_string(),
        subtitle: format!(
            "{} - CUTOFF {}",
            config.period.display().to_uppercase(),
            config.cutoff_date.format("%-d %B %Y")
        ),
        info: format!(
            "Type: {} | Period: {} | Cutoff date: {}",
            descriptor.display_name,
            config.period.display(),
            config.cutoff_date.format("%d/%m/%Y")
        ),
    }
}

fn summary(stats: &StatisticsBundle) -> Summary {
    Summary {
        heading: "EXECUTIVE SUMMARY".to_string(),
        lines: vec![
            KeyValue::new("Total projects", format_int(stats.total_count as u64)),
            KeyValue::new("Total budget", format_currency(stats.total_budget)),
            KeyValue::new("Direct beneficiaries", format_int(stats.total_beneficiaries)),
            KeyValue::new("Average progress", format_percent(stats.average_progress)),
            KeyValue::new("Average budget per project", format_currency(stats.average_budget)),
        ],
    }
}

fn data_table(descriptor: &ReportDescriptor, records: &[ProjectRecord]) -> DataTable {
    DataTable {
        heading: "PROJECT DETAIL".to_string(),
        columns: headings(&descriptor.columns),
        rows: records
            .iter()
            .take(descriptor.row_cap)
            .map(|r| descriptor.columns.iter().map(|c| c.page_cell(r)).collect())
            .collect(),
    }
}

fn detail_table(columns: &[Column], records: &[ProjectRecord]) -> DataTable {
    DataTable {
        heading: "Detail".to_string(),
        columns: headings(columns),
        rows: records
            .iter()
            .map(|r| columns.iter().map(|c| c.sheet_cell(r)).collect())
            .collect(),
    }
}

fn headings(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.heading.to_string()).collect()
}

// First-seen order, capped; not ranked by count.
fn analysis(stats: &StatisticsBundle) -> Analysis {
    let lines = stats
        .by_status
        .iter()
        .take(MAX_STATUS_LINES)
        .map(|(status, count)| {
            let pct = if stats.total_count > 0 {
                count as f64 / stats.total_count as f64 * 100.0
            } else {
                0.0
            };
            format!("{status}: {count} ({pct:.1}%)")
        })
        .collect();
    Analysis {
        heading: "STATISTICAL ANALYSIS".to_string(),
        caption: "Distribution by status:".to_string(),
        lines,
    }
}

fn key_figures(stats: &StatisticsBundle) -> Vec<KeyValue> {
    vec![
        KeyValue::new("Total projects", format_int(stats.total_count as u64)),
        KeyValue::new("Total budget", format_currency(stats.total_budget)),
        KeyValue::new("Executed budget", format_currency(stats.executed_budget)),
        KeyValue::new("Total beneficiaries", format_int(stats.total_beneficiaries)),
        KeyValue::new("Average progress", format_percent(stats.average_progress)),
        KeyValue::new("Average budget", format_currency(stats.average_budget)),
        KeyValue::new("High-risk projects", format_int(stats.high_risk_count as u64)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportType;
    use crate::stats::aggregate;
    use chrono::NaiveDate;

    fn builder() -> SectionBuilder {
        let at = NaiveDate::from_ymd_opt(2026, 4, 2)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        SectionBuilder::new(at)
    }

    fn config(report_type: ReportType) -> ReportConfiguration {
        ReportConfiguration::new(report_type, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap())
    }

    fn records(n: usize) -> Vec<ProjectRecord> {
        (0..n)
            .map(|i| ProjectRecord {
                id: format!("PROJ-{:03}", i + 1),
                program: format!("Infrastructure project {:03}", i + 1),
                area: "Infrastructure".into(),
                modified_budget: 1_000_000.0 + i as f64,
                physical_progress: 50.0,
                status: ["In progress", "Completed", "Pending"][i % 3].into(),
                ..ProjectRecord::default()
            })
            .collect()
    }

    fn kinds(blocks: &[ContentBlock]) -> Vec<&'static str> {
        blocks
            .iter()
            .map(|b| match b {
                ContentBlock::Header(_) => "header",
                ContentBlock::SummaryParagraph(_) => "summary",
                ContentBlock::DataTable(_) => "table",
                ContentBlock::AnalysisParagraph(_) => "analysis",
                ContentBlock::Footer(_) => "footer",
            })
            .collect()
    }

    #[test]
    fn executive_summary_follows_header() {
        let records = records(3);
        let stats = aggregate(&records);
        for charts in [true, false] {
            let cfg = config(ReportType::Executive).with_charts(charts);
            let blocks = builder().build(&cfg, &records, &stats);
            let kinds = kinds(&blocks);
            assert_eq!(kinds.iter().filter(|k| **k == "summary").count(), 1);
            assert_eq!(kinds[1], "summary");
        }
    }

    #[test]
    fn block_order_per_report_type() {
        let records = records(4);
        let stats = aggregate(&records);
        let b = builder();
        let order = |t| kinds(&b.build(&config(t), &records, &stats));
        assert_eq!(
            order(ReportType::Executive),
            vec!["header", "summary", "table", "analysis", "footer"]
        );
        assert_eq!(order(ReportType::Portfolio), vec!["header", "table", "footer"]);
        assert_eq!(order(ReportType::Budget), vec!["header", "table", "analysis", "footer"]);
        assert_eq!(order(ReportType::Risk), vec!["header", "table", "analysis", "footer"]);
        assert_eq!(order(ReportType::Territorial), vec!["header", "footer"]);
        assert_eq!(order(ReportType::Transparency), vec!["header", "footer"]);
    }

    #[test]
    fn analysis_requires_charts_flag() {
        let records = records(2);
        let stats = aggregate(&records);
        let cfg = config(ReportType::Budget).with_charts(false);
        let blocks = builder().build(&cfg, &records, &stats);
        assert_eq!(kinds(&blocks), vec!["header", "table", "footer"]);
    }

    #[test]
    fn table_rows_are_capped() {
        let records = records(200);
        let stats = aggregate(&records);
        let layout = builder().layout(&config(ReportType::Portfolio), &records, &stats);
        let table = layout.data_table().unwrap();
        assert_eq!(table.rows.len(), 50);
        assert_eq!(table.rows[0][0], Cell::Text("PROJ-001".into()));
        assert_eq!(table.rows[49][0], Cell::Text("PROJ-050".into()));
        assert_eq!(layout.detail.rows.len(), 200);
    }

    #[test]
    fn summary_lines_are_formatted() {
        let records = vec![
            ProjectRecord {
                modified_budget: 1_000_000.0,
                physical_progress: 30.0,
                beneficiaries: crate::types::Beneficiaries::Text("1,250".into()),
                ..ProjectRecord::default()
            },
            ProjectRecord {
                pre_project_estimate: 800_000.0,
                ..ProjectRecord::default()
            },
            ProjectRecord {
                modified_budget: 500_000.0,
                physical_progress: 45.0,
                ..ProjectRecord::default()
            },
        ];
        let stats = aggregate(&records);
        let blocks = builder().build(&config(ReportType::Executive), &records, &stats);
        let ContentBlock::SummaryParagraph(summary) = &blocks[1] else {
            panic!("expected summary paragraph");
        };
        let values: Vec<&str> = summary.lines.iter().map(|l| l.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["3", "$2,300,000.00", "1,250", "37.5%", "$766,666.67"]
        );
    }

    #[test]
    fn very_large_budgets_keep_their_digits() {
        let records = vec![ProjectRecord {
            modified_budget: 3e19,
            ..ProjectRecord::default()
        }];
        let stats = aggregate(&records);
        let blocks = builder().build(&config(ReportType::Executive), &records, &stats);
        let ContentBlock::SummaryParagraph(summary) = &blocks[1] else {
            panic!("expected summary paragraph");
        };
        assert_eq!(summary.lines[1].value, "$30,000,000,000,000,000,000.00");
        assert_eq!(summary.lines[4].value, "$30,000,000,000,000,000,000.00");
    }

    #[test]
    fn header_and_footer_text() {
        let blocks = builder().build(&config(ReportType::Risk), &[], &StatisticsBundle::default());
        let ContentBlock::Header(header) = &blocks[0] else {
            panic!("expected header");
        };
        assert_eq!(header.title, "RISK ANALYSIS");
        assert_eq!(header.subtitle, "MONTHLY - CUTOFF 31 March 2026");
        assert_eq!(
            header.info,
            "Type: Risk Analysis | Period: Monthly | Cutoff date: 31/03/2026"
        );
        let Some(ContentBlock::Footer(footer)) = blocks.last() else {
            panic!("expected footer");
        };
        assert_eq!(
            footer.text,
            "Report generated on 02/04/2026 09:15 | POA Reporting System"
        );
    }

    #[test]
    fn risk_table_uses_level_labels() {
        let records = vec![ProjectRecord {
            risk_level: 6,
            viability_level: 2,
            ..ProjectRecord::default()
        }];
        let stats = aggregate(&records);
        let layout = builder().layout(&config(ReportType::Risk), &records, &stats);
        let table = layout.data_table().unwrap();
        assert_eq!(table.columns, vec!["Program", "Area", "Risk", "Viability"]);
        assert_eq!(table.rows[0][2], Cell::Text("Level 6".into()));
        assert_eq!(table.rows[0][3], Cell::Text("Low".into()));
    }

    #[test]
    fn status_breakdown_keeps_first_seen_order_and_caps() {
        let records: Vec<ProjectRecord> = (0..12)
            .flat_map(|i| {
                let copies = if i == 11 { 8 } else { 1 };
                std::iter::repeat(ProjectRecord {
                    status: format!("Status {i}"),
                    ..ProjectRecord::default()
                })
                .take(copies)
            })
            .collect();
        let stats = aggregate(&records);
        let blocks = builder().build(&config(ReportType::Executive), &records, &stats);
        let analysis = blocks
            .iter()
            .find_map(|b| match b {
                ContentBlock::AnalysisParagraph(a) => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(analysis.lines.len(), MAX_STATUS_LINES);
        assert_eq!(analysis.lines[0], "Status 0: 1 (5.3%)");
        // The most frequent status was seen last and falls outside the cap.
        assert!(analysis.lines.iter().all(|l| !l.starts_with("Status 11")));
    }

    #[test]
    fn layout_notes_reflect_flags() {
        let mut cfg = config(ReportType::Territorial);
        cfg.include_annex = true;
        let layout = builder().layout(&cfg, &[], &StatisticsBundle::default());
        assert_eq!(layout.notes, vec!["Charts: included", "Annexes: requested"]);
        assert_eq!(layout.detail.columns.len(), 6);
        assert_eq!(layout.key_figures.len(), 7);
        assert_eq!(layout.orientation, Orientation::Portrait);
    }
}
