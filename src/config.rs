//! Report request parsing and validation, plus process-wide settings.

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of report requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Executive,
    Portfolio,
    Budget,
    Risk,
    Territorial,
    Transparency,
}

impl ReportType {
    pub const ALL: [ReportType; 6] = [
        ReportType::Executive,
        ReportType::Portfolio,
        ReportType::Budget,
        ReportType::Risk,
        ReportType::Territorial,
        ReportType::Transparency,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ReportType::Executive => "executive",
            ReportType::Portfolio => "portfolio",
            ReportType::Budget => "budget",
            ReportType::Risk => "risk",
            ReportType::Territorial => "territorial",
            ReportType::Transparency => "transparency",
        }
    }

    /// Accepts the English key or the legacy Spanish one, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "executive" | "ejecutivo" => Ok(ReportType::Executive),
            "portfolio" | "cartera" => Ok(ReportType::Portfolio),
            "budget" | "presupuesto" => Ok(ReportType::Budget),
            "risk" | "riesgos" => Ok(ReportType::Risk),
            "territorial" => Ok(ReportType::Territorial),
            "transparency" | "transparencia" => Ok(ReportType::Transparency),
            _ => Err(ValidationError::UnsupportedReportType {
                value: value.to_string(),
                supported: Self::ALL.iter().map(|t| t.key()).collect(),
            }),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Reporting period. Display-only; it never filters records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Weekly,
        Period::Monthly,
        Period::Quarterly,
        Period::Annual,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Quarterly => "quarterly",
            Period::Annual => "annual",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
            Period::Quarterly => "Quarterly",
            Period::Annual => "Annual",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "semanal" => Ok(Period::Weekly),
            "monthly" | "mensual" => Ok(Period::Monthly),
            "quarterly" | "trimestral" => Ok(Period::Quarterly),
            "annual" | "anual" => Ok(Period::Annual),
            _ => Err(ValidationError::UnsupportedPeriod {
                value: value.to_string(),
                supported: Self::ALL.iter().map(|p| p.key()).collect(),
            }),
        }
    }
}

/// Requested output: one document kind or both bundled in an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Document,
    Spreadsheet,
    Both,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [
        OutputFormat::Document,
        OutputFormat::Spreadsheet,
        OutputFormat::Both,
    ];

    pub fn key(self) -> &'static str {
        match self {
            OutputFormat::Document => "document",
            OutputFormat::Spreadsheet => "spreadsheet",
            OutputFormat::Both => "both",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "pdf" => Ok(OutputFormat::Document),
            "spreadsheet" | "excel" | "xlsx" => Ok(OutputFormat::Spreadsheet),
            "both" | "ambos" => Ok(OutputFormat::Both),
            _ => Err(ValidationError::UnsupportedFormat {
                value: value.to_string(),
                supported: Self::ALL.iter().map(|f| f.key()).collect(),
            }),
        }
    }
}

/// Validated, immutable description of one report request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportConfiguration {
    pub report_type: ReportType,
    pub period: Period,
    pub cutoff_date: NaiveDate,
    pub format: OutputFormat,
    pub include_charts: bool,
    pub include_annex: bool,
    pub name: String,
}

impl ReportConfiguration {
    /// Configuration with the request defaults for `report_type`.
    pub fn new(report_type: ReportType, cutoff_date: NaiveDate) -> Self {
        Self {
            report_type,
            period: Period::Monthly,
            cutoff_date,
            format: OutputFormat::Document,
            include_charts: true,
            include_annex: false,
            name: default_name(report_type),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_charts(mut self, include_charts: bool) -> Self {
        self.include_charts = include_charts;
        self
    }

    /// Base file name: `<report_type>_<cutoff_date>`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.report_type.key(), self.cutoff_date.format("%Y-%m-%d"))
    }
}

fn default_name(report_type: ReportType) -> String {
    format!("Report_{}", report_type.key())
}

/// Report request as it arrives from a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    #[serde(alias = "tipo_reporte")]
    pub report_type: Option<String>,
    #[serde(alias = "periodo")]
    pub period: Option<String>,
    #[serde(alias = "fecha_corte")]
    pub cutoff_date: Option<String>,
    #[serde(alias = "formato")]
    pub format: Option<String>,
    #[serde(alias = "incluir_graficos")]
    pub include_charts: Option<bool>,
    #[serde(alias = "incluir_anexos")]
    pub include_annex: Option<bool>,
    #[serde(alias = "nombre_reporte")]
    pub name: Option<String>,
}

impl ReportRequest {
    /// Resolve defaults and check every field. `today` bounds the cutoff
    /// date and stands in for it when none was sent.
    pub fn validate(&self, today: NaiveDate) -> Result<ReportConfiguration, ValidationError> {
        let report_type = match self.report_type.as_deref() {
            Some(value) => ReportType::parse(value)?,
            None => ReportType::Executive,
        };
        let format = match self.format.as_deref() {
            Some(value) => OutputFormat::parse(value)?,
            None => OutputFormat::Document,
        };
        let period = match self.period.as_deref() {
            Some(value) => Period::parse(value)?,
            None => Period::Monthly,
        };
        let cutoff_date = match self.cutoff_date.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidCutoffDate(value.to_string()))?,
            _ => today,
        };
        if cutoff_date > today {
            return Err(ValidationError::CutoffInFuture {
                cutoff: cutoff_date,
                today,
            });
        }
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_name(report_type));

        Ok(ReportConfiguration {
            report_type,
            period,
            cutoff_date,
            format,
            include_charts: self.include_charts.unwrap_or(true),
            include_annex: self.include_annex.unwrap_or(false),
            name,
        })
    }
}

/// Archive bytes kept in memory before spilling to disk, unless overridden.
pub const DEFAULT_SPOOL_LIMIT: usize = 8 * 1024 * 1024;

/// Process-wide settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub output_dir: PathBuf,
    /// Bytes an archive may occupy in memory before spilling to a temp file.
    pub spool_limit: usize,
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("POA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let output_dir = env::var("POA_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let spool_limit = match env::var("POA_SPOOL_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| SettingsError::InvalidSpoolLimit(raw))?,
            Err(_) => DEFAULT_SPOOL_LIMIT,
        };

        Ok(Self {
            log_level,
            output_dir,
            spool_limit,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_dir: PathBuf::from("."),
            spool_limit: DEFAULT_SPOOL_LIMIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("POA_SPOOL_LIMIT must be a byte count, got '{0}'")]
    InvalidSpoolLimit(String),
}
