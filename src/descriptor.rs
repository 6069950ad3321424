//! Per-report-type layout table. Everything that differs between report
//! types is declared here; builders and renderers only read it.

use crate::config::ReportType;
use crate::types::ProjectRecord;
use crate::util::{format_currency, format_number, format_percent, truncate};
use once_cell::sync::Lazy;

pub const ROW_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Record attribute shown in a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Program,
    Area,
    Budget,
    Progress,
    Status,
    Executed,
    ExecutionPct,
    Risk,
    Viability,
}

/// A rendered table cell. Numbers stay numeric so the workbook keeps them
/// as numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => format_number(*v, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: Field,
    pub heading: &'static str,
    /// Characters kept before the value is cut with `...`.
    pub width: Option<usize>,
}

const fn col(field: Field, heading: &'static str, width: Option<usize>) -> Column {
    Column {
        field,
        heading,
        width,
    }
}

impl Column {
    /// Formatted text for the page document, truncated to the column width.
    pub fn page_cell(&self, record: &ProjectRecord) -> Cell {
        let text = match self.field {
            Field::Id => record.id.clone(),
            Field::Program => record.program.clone(),
            Field::Area => record.area_label().to_string(),
            Field::Status => record.status_label().to_string(),
            Field::Budget => {
                let budget = record.effective_budget();
                if budget > 0.0 {
                    format_currency(budget)
                } else {
                    "N/A".to_string()
                }
            }
            Field::Progress => format_percent(record.physical_progress),
            Field::Executed => format_currency(record.executed_budget()),
            Field::ExecutionPct => format_percent(record.financial_progress),
            Field::Risk => risk_text(record.risk_level),
            Field::Viability => viability_text(record.viability_level),
        };
        Cell::Text(match self.width {
            Some(width) => truncate(&text, width),
            None => text,
        })
    }

    /// Raw value for the workbook detail sheet, never truncated.
    pub fn sheet_cell(&self, record: &ProjectRecord) -> Cell {
        match self.field {
            Field::Id => Cell::Text(record.id.clone()),
            Field::Program => Cell::Text(record.program.clone()),
            Field::Area => Cell::Text(record.area_label().to_string()),
            Field::Status => Cell::Text(record.status_label().to_string()),
            Field::Budget => Cell::Number(record.effective_budget()),
            Field::Progress => Cell::Number(record.physical_progress),
            Field::Executed => Cell::Number(record.executed_budget()),
            Field::ExecutionPct => Cell::Number(record.financial_progress),
            Field::Risk => Cell::Text(risk_text(record.risk_level)),
            Field::Viability => Cell::Text(viability_text(record.viability_level)),
        }
    }
}

pub fn risk_text(level: u32) -> String {
    level_text(level, ["Very Low", "Low", "Medium", "High", "Very High"])
}

pub fn viability_text(level: u32) -> String {
    level_text(level, ["Very Low", "Low", "Medium", "High", "Very High"])
}

fn level_text(level: u32, labels: [&str; 5]) -> String {
    match level {
        1..=5 => labels[level as usize - 1].to_string(),
        other => format!("Level {other}"),
    }
}

/// Columns used by the workbook when a report type has no data table.
pub const GENERAL_COLUMNS: [Column; 6] = [
    col(Field::Id, "ID", None),
    col(Field::Program, "Program", None),
    col(Field::Area, "Area", None),
    col(Field::Budget, "Budget", None),
    col(Field::Progress, "Progress", None),
    col(Field::Status, "Status", None),
];

#[derive(Debug, Clone)]
pub struct ReportDescriptor {
    pub report_type: ReportType,
    pub title: &'static str,
    pub display_name: &'static str,
    pub orientation: Orientation,
    /// Empty for placeholder report types.
    pub columns: Vec<Column>,
    pub row_cap: usize,
    pub summary: bool,
    pub analysis: bool,
}

impl ReportDescriptor {
    pub fn for_type(report_type: ReportType) -> &'static ReportDescriptor {
        DESCRIPTORS
            .iter()
            .find(|d| d.report_type == report_type)
            .unwrap_or(&DESCRIPTORS[0])
    }

    pub fn has_table(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn detail_columns(&self) -> &[Column] {
        if self.has_table() {
            &self.columns
        } else {
            &GENERAL_COLUMNS
        }
    }
}

static DESCRIPTORS: Lazy<Vec<ReportDescriptor>> = Lazy::new(|| {
    vec![
        ReportDescriptor {
            report_type: ReportType::Executive,
            title: "EXECUTIVE REPORT - POA",
            display_name: "Executive",
            orientation: Orientation::Portrait,
            columns: vec![
                col(Field::Program, "Program", Some(50)),
                col(Field::Area, "Area", Some(30)),
                col(Field::Budget, "Budget", None),
                col(Field::Progress, "Progress", None),
                col(Field::Status, "Status", Some(20)),
            ],
            row_cap: ROW_CAP,
            summary: true,
            analysis: true,
        },
        ReportDescriptor {
            report_type: ReportType::Portfolio,
            title: "PROJECT PORTFOLIO",
            display_name: "Project Portfolio",
            orientation: Orientation::Landscape,
            columns: vec![
                col(Field::Id, "ID", None),
                col(Field::Program, "Program", Some(40)),
                col(Field::Area, "Area", Some(20)),
                col(Field::Budget, "Budget", None),
                col(Field::Progress, "Progress", None),
            ],
            row_cap: ROW_CAP,
            summary: false,
            analysis: false,
        },
        ReportDescriptor {
            report_type: ReportType::Budget,
            title: "BUDGET EXECUTION",
            display_name: "Budget Execution",
            orientation: Orientation::Landscape,
            columns: vec![
                col(Field::Program, "Program", Some(40)),
                col(Field::Area, "Area", Some(20)),
                col(Field::Budget, "Budget", None),
                col(Field::Executed, "Executed", None),
                col(Field::ExecutionPct, "% Execution", None),
            ],
            row_cap: ROW_CAP,
            summary: false,
            analysis: true,
        },
        ReportDescriptor {
            report_type: ReportType::Risk,
            title: "RISK ANALYSIS",
            display_name: "Risk Analysis",
            orientation: Orientation::Portrait,
            columns: vec![
                col(Field::Program, "Program", Some(40)),
                col(Field::Area, "Area", Some(20)),
                col(Field::Risk, "Risk", None),
                col(Field::Viability, "Viability", None),
            ],
            row_cap: ROW_CAP,
            summary: false,
            analysis: true,
        },
        ReportDescriptor {
            report_type: ReportType::Territorial,
            title: "TERRITORIAL IMPACT",
            display_name: "Territorial Impact",
            orientation: Orientation::Portrait,
            columns: Vec::new(),
            row_cap: ROW_CAP,
            summary: false,
            analysis: false,
        },
        ReportDescriptor {
            report_type: ReportType::Transparency,
            title: "TRANSPARENCY REPORT",
            display_name: "Transparency",
            orientation: Orientation::Portrait,
            columns: Vec::new(),
            row_cap: ROW_CAP,
            summary: false,
            analysis: false,
        },
    ]
});
