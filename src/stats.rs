use crate::error::AggregationError;
use crate::types::{Beneficiaries, ProjectRecord, StatisticsBundle};
use crate::util::average;
use tracing::debug;

/// Risk level at or above which a project counts as high risk.
pub const HIGH_RISK_LEVEL: u32 = 4;

/// Reduce a record sequence to its statistics bundle.
///
/// Never fails on a single bad record: unparseable beneficiary counts add 0,
/// and an empty sequence yields 0 for every average.
pub fn aggregate(records: &[ProjectRecord]) -> StatisticsBundle {
    let mut stats = StatisticsBundle {
        total_count: records.len(),
        ..StatisticsBundle::default()
    };
    let mut progress_sum = 0.0;
    let mut progress_count = 0usize;

    for r in records {
        let budget = r.effective_budget();
        stats.total_budget += budget;
        stats.executed_budget += r.executed_budget();

        if r.physical_progress > 0.0 {
            progress_sum += r.physical_progress;
            progress_count += 1;
        }

        match r.beneficiaries.count() {
            Some(n) => stats.total_beneficiaries = stats.total_beneficiaries.saturating_add(n),
            None => {
                if let Beneficiaries::Text(raw) = &r.beneficiaries {
                    debug!(
                        record = %r.id,
                        value = %raw,
                        "beneficiary count is not numeric, counting 0"
                    );
                }
            }
        }

        if r.risk_level >= HIGH_RISK_LEVEL {
            stats.high_risk_count += 1;
        }
        if !r.status.is_empty() {
            stats.by_status.add(&r.status);
        }
        if !r.area.is_empty() {
            stats.by_area.add(&r.area);
        }
    }

    stats.average_budget = average(stats.total_budget, stats.total_count);
    stats.average_progress = average(progress_sum, progress_count);
    stats
}

impl StatisticsBundle {
    /// Reject totals that overflowed `f64`.
    pub fn ensure_finite(&self) -> Result<(), AggregationError> {
        let fields = [
            ("total_budget", self.total_budget),
            ("executed_budget", self.executed_budget),
            ("average_budget", self.average_budget),
            ("average_progress", self.average_progress),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some((field, _)) => Err(AggregationError::NonFinite {
                field: *field,
                records: self.total_count,
            }),
            None => Ok(()),
        }
    }
}
