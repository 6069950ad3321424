use crate::util::{non_negative, parse_count, parse_date_safe, parse_f64_safe, parse_u32_safe};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One CSV row as exported from the project register. Every column is read as
/// text; [`RawRecord`] takes over from there.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "id", alias = "id_excel", default)]
    pub id: Option<String>,
    #[serde(rename = "program", alias = "programa", default)]
    pub program: Option<String>,
    #[serde(rename = "area", alias = "area_responsable", default)]
    pub area: Option<String>,
    #[serde(rename = "modified_budget", alias = "presupuesto_modificado", default)]
    pub modified_budget: Option<String>,
    #[serde(rename = "pre_project_estimate", alias = "anteproyecto_total", default)]
    pub pre_project_estimate: Option<String>,
    #[serde(rename = "physical_progress", alias = "avance_fisico_pct", default)]
    pub physical_progress: Option<String>,
    #[serde(rename = "financial_progress", alias = "avance_financiero_pct", default)]
    pub financial_progress: Option<String>,
    #[serde(rename = "status", alias = "estatus_general", default)]
    pub status: Option<String>,
    #[serde(rename = "risk_level", alias = "riesgo_nivel", default)]
    pub risk_level: Option<String>,
    #[serde(rename = "viability_level", alias = "viabilidad_ejecucion", default)]
    pub viability_level: Option<String>,
    #[serde(rename = "beneficiaries", alias = "beneficiarios_directos", default)]
    pub beneficiaries: Option<String>,
    #[serde(rename = "start_date", alias = "fecha_inicio_prog", default)]
    pub start_date: Option<String>,
}

/// A JSON value that should be a number but is sometimes sent as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v).filter(|v| v.is_finite()),
            Scalar::Text(s) => parse_f64_safe(Some(s)),
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            Scalar::Int(v) => u32::try_from(*v).ok(),
            Scalar::Float(v) if v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64 => {
                Some(*v as u32)
            }
            Scalar::Float(_) => None,
            Scalar::Text(s) => parse_u32_safe(Some(s)),
        }
    }

    fn into_text(self) -> String {
        match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Float(v) => v.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

/// Loosely-typed project row accepted at the boundary, whatever its origin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(alias = "id_excel", default)]
    pub id: Option<Scalar>,
    #[serde(alias = "programa", default)]
    pub program: Option<String>,
    #[serde(alias = "area_responsable", default)]
    pub area: Option<String>,
    #[serde(alias = "presupuesto_modificado", default)]
    pub modified_budget: Option<Scalar>,
    #[serde(alias = "anteproyecto_total", default)]
    pub pre_project_estimate: Option<Scalar>,
    #[serde(alias = "avance_fisico_pct", default)]
    pub physical_progress: Option<Scalar>,
    #[serde(alias = "avance_financiero_pct", default)]
    pub financial_progress: Option<Scalar>,
    #[serde(alias = "estatus_general", default)]
    pub status: Option<String>,
    #[serde(alias = "riesgo_nivel", default)]
    pub risk_level: Option<Scalar>,
    #[serde(alias = "viabilidad_ejecucion", default)]
    pub viability_level: Option<Scalar>,
    #[serde(alias = "beneficiarios_directos", default)]
    pub beneficiaries: Option<Scalar>,
    #[serde(alias = "fecha_inicio_prog", default)]
    pub start_date: Option<String>,
}

impl From<RawRow> for RawRecord {
    fn from(row: RawRow) -> Self {
        let text = |v: Option<String>| v.map(Scalar::Text);
        Self {
            id: text(row.id),
            program: row.program,
            area: row.area,
            modified_budget: text(row.modified_budget),
            pre_project_estimate: text(row.pre_project_estimate),
            physical_progress: text(row.physical_progress),
            financial_progress: text(row.financial_progress),
            status: row.status,
            risk_level: text(row.risk_level),
            viability_level: text(row.viability_level),
            beneficiaries: text(row.beneficiaries),
            start_date: row.start_date,
        }
    }
}

/// Beneficiary head-count as stored: either already numeric or free text
/// such as `"1,250"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beneficiaries {
    Count(u64),
    Text(String),
}

impl Beneficiaries {
    /// Numeric value, or `None` when the text is not a whole number.
    pub fn count(&self) -> Option<u64> {
        match self {
            Beneficiaries::Count(n) => Some(*n),
            Beneficiaries::Text(s) => parse_count(s),
        }
    }
}

impl Default for Beneficiaries {
    fn default() -> Self {
        Beneficiaries::Count(0)
    }
}

impl From<Scalar> for Beneficiaries {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Int(n) if n >= 0 => Beneficiaries::Count(n as u64),
            Scalar::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                Beneficiaries::Count(f as u64)
            }
            other => Beneficiaries::Text(other.into_text()),
        }
    }
}

/// Normalized project record. Every field holds a concrete value; budgets and
/// percentages are finite and non-negative, levels are at least 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: String,
    pub program: String,
    /// Empty when the source had no responsible area.
    pub area: String,
    pub modified_budget: f64,
    pub pre_project_estimate: f64,
    pub physical_progress: f64,
    pub financial_progress: f64,
    /// Empty when the source had no status.
    pub status: String,
    pub risk_level: u32,
    pub viability_level: u32,
    pub beneficiaries: Beneficiaries,
    pub start_date: Option<NaiveDate>,
}

pub const UNNAMED_PROGRAM: &str = "Unnamed";
pub const NOT_AVAILABLE: &str = "N/A";

impl Default for ProjectRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            program: UNNAMED_PROGRAM.to_string(),
            area: String::new(),
            modified_budget: 0.0,
            pre_project_estimate: 0.0,
            physical_progress: 0.0,
            financial_progress: 0.0,
            status: String::new(),
            risk_level: 1,
            viability_level: 1,
            beneficiaries: Beneficiaries::default(),
            start_date: None,
        }
    }
}

impl ProjectRecord {
    pub fn from_raw(raw: RawRecord) -> Self {
        let amount = |v: &Option<Scalar>| {
            non_negative(v.as_ref().and_then(Scalar::as_f64).unwrap_or(0.0))
        };
        let level = |v: &Option<Scalar>| match v.as_ref().and_then(Scalar::as_u32) {
            Some(n) if n > 0 => n,
            _ => 1,
        };
        let text = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();

        let program = text(raw.program);
        Self {
            id: raw
                .id
                .map(|v| v.into_text().trim().to_string())
                .unwrap_or_default(),
            program: if program.is_empty() {
                UNNAMED_PROGRAM.to_string()
            } else {
                program
            },
            area: text(raw.area),
            modified_budget: amount(&raw.modified_budget),
            pre_project_estimate: amount(&raw.pre_project_estimate),
            physical_progress: amount(&raw.physical_progress),
            financial_progress: amount(&raw.financial_progress),
            status: text(raw.status),
            risk_level: level(&raw.risk_level),
            viability_level: level(&raw.viability_level),
            beneficiaries: raw.beneficiaries.map(Beneficiaries::from).unwrap_or_default(),
            start_date: parse_date_safe(raw.start_date.as_deref()),
        }
    }

    /// Modified budget when positive, otherwise the pre-project estimate.
    pub fn effective_budget(&self) -> f64 {
        if self.modified_budget > 0.0 {
            self.modified_budget
        } else {
            self.pre_project_estimate
        }
    }

    pub fn executed_budget(&self) -> f64 {
        self.effective_budget() * (self.financial_progress / 100.0)
    }

    pub fn area_label(&self) -> &str {
        if self.area.is_empty() {
            NOT_AVAILABLE
        } else {
            &self.area
        }
    }

    pub fn status_label(&self) -> &str {
        if self.status.is_empty() {
            NOT_AVAILABLE
        } else {
            &self.status
        }
    }
}

/// Label/count pairs kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    pub fn add(&mut self, label: &str) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Figures derived from one record sequence. Rebuilt for every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsBundle {
    pub total_count: usize,
    pub total_budget: f64,
    pub average_budget: f64,
    pub average_progress: f64,
    pub total_beneficiaries: u64,
    pub executed_budget: f64,
    pub high_risk_count: usize,
    pub by_status: Tally,
    pub by_area: Tally,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_json(body: &str) -> RawRecord {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn normalizes_missing_fields_to_defaults() {
        let record = ProjectRecord::from_raw(RawRecord::default());
        assert_eq!(record.program, UNNAMED_PROGRAM);
        assert_eq!(record.modified_budget, 0.0);
        assert_eq!(record.physical_progress, 0.0);
        assert_eq!(record.risk_level, 1);
        assert_eq!(record.viability_level, 1);
        assert_eq!(record.beneficiaries, Beneficiaries::Count(0));
        assert_eq!(record.area_label(), NOT_AVAILABLE);
        assert_eq!(record.status_label(), NOT_AVAILABLE);
    }

    #[test]
    fn accepts_legacy_column_names_and_mixed_types() {
        let record = ProjectRecord::from_raw(raw_json(
            r#"{
                "id_excel": 17,
                "programa": "  Rehabilitación de drenaje ",
                "area_responsable": "Dirección de Infraestructura",
                "presupuesto_modificado": "1,000,000",
                "anteproyecto_total": 800000.5,
                "avance_fisico_pct": 42.5,
                "avance_financiero_pct": "30",
                "estatus_general": "En progreso",
                "riesgo_nivel": 4,
                "viabilidad_ejecucion": "0",
                "beneficiarios_directos": "1,250",
                "fecha_inicio_prog": "2026-01-10"
            }"#,
        ));
        assert_eq!(record.id, "17");
        assert_eq!(record.program, "Rehabilitación de drenaje");
        assert_eq!(record.modified_budget, 1_000_000.0);
        assert_eq!(record.pre_project_estimate, 800_000.5);
        assert_eq!(record.financial_progress, 30.0);
        assert_eq!(record.risk_level, 4);
        assert_eq!(record.viability_level, 1);
        assert_eq!(record.beneficiaries.count(), Some(1250));
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2026, 1, 10));
    }

    #[test]
    fn negative_figures_are_clamped() {
        let record = ProjectRecord::from_raw(raw_json(
            r#"{"modified_budget": -10, "physical_progress": "-3.5", "risk_level": -2}"#,
        ));
        assert_eq!(record.modified_budget, 0.0);
        assert_eq!(record.physical_progress, 0.0);
        assert_eq!(record.risk_level, 1);
    }

    #[test]
    fn effective_budget_prefers_positive_modified_budget() {
        let modified = ProjectRecord {
            modified_budget: 1000.0,
            pre_project_estimate: 900.0,
            financial_progress: 50.0,
            ..ProjectRecord::default()
        };
        assert_eq!(modified.effective_budget(), 1000.0);
        assert_eq!(modified.executed_budget(), 500.0);

        let estimate = ProjectRecord {
            pre_project_estimate: 800.0,
            ..ProjectRecord::default()
        };
        assert_eq!(estimate.effective_budget(), 800.0);
        assert_eq!(ProjectRecord::default().effective_budget(), 0.0);
    }

    #[test]
    fn beneficiaries_from_numbers_and_text_agree() {
        assert_eq!(Beneficiaries::from(Scalar::Int(1250)).count(), Some(1250));
        assert_eq!(
            Beneficiaries::from(Scalar::Text("1,250".into())).count(),
            Some(1250)
        );
        assert_eq!(Beneficiaries::from(Scalar::Float(300.0)).count(), Some(300));
        assert_eq!(Beneficiaries::from(Scalar::Text("abc".into())).count(), None);
        assert_eq!(Beneficiaries::from(Scalar::Int(-5)).count(), None);
    }

    #[test]
    fn tally_keeps_first_seen_order() {
        let mut tally = Tally::default();
        for label in ["Pending", "Completed", "Pending", "At risk", "Completed", "Pending"] {
            tally.add(label);
        }
        let entries: Vec<_> = tally.iter().collect();
        assert_eq!(entries, vec![("Pending", 3), ("Completed", 2), ("At risk", 1)]);
        assert_eq!(tally.get("Completed"), Some(2));
        assert_eq!(tally.get("Cancelled"), None);
    }
}
