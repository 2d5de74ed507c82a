pub mod alerts;
pub mod churn;

use crate::types::config::EngineConfig;
use crate::types::monitor::{Alert, Severity};
use crate::types::snapshot::Snapshot;
use chrono::NaiveDate;
use churn::ChurnReport;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorReport {
    pub previous_as_of: Option<NaiveDate>,
    pub current_as_of: NaiveDate,
    pub churn: ChurnReport,
    /// All alerts, ordered by the current rank of the ticker they concern.
    pub alerts: Vec<Alert>,
}

impl MonitorReport {
    pub fn is_first_cycle(&self) -> bool {
        matches!(self.churn, ChurnReport::FirstCycle { .. })
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.alerts.iter().map(|alert| alert.severity).max()
    }
}

/// Churn and alert evaluation over two finished snapshots.
///
/// Both passes only read the snapshots, so they run side by side. Alerts are
/// then attached to the KEEP decision of the ticker they belong to.
pub fn compare(previous: Option<&Snapshot>, current: &Snapshot, config: &EngineConfig) -> MonitorReport {
    let (mut churn, mut by_ticker) = rayon::join(
        || churn::diff(previous, current, &config.churn),
        || alerts::evaluate_snapshots(previous, current, &config.alerts),
    );

    let mut all_alerts = Vec::new();
    for row in current.rows() {
        if let Some(alerts) = by_ticker.get(row.ticker()) {
            all_alerts.extend(alerts.iter().cloned());
        }
    }

    if let ChurnReport::Compared { retained, .. } = &mut churn {
        for decision in retained.iter_mut() {
            if let Some(alerts) = by_ticker.remove(&decision.ticker) {
                decision.alerts = alerts;
            }
        }
    }

    let report = MonitorReport {
        previous_as_of: previous.map(Snapshot::as_of),
        current_as_of: current.as_of(),
        churn,
        alerts: all_alerts,
    };
    info!(
        current = %report.current_as_of,
        first_cycle = report.is_first_cycle(),
        alerts = report.alerts.len(),
        "monitoring comparison complete"
    );
    report
}
