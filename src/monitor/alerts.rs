use crate::metrics::Metric;
use crate::types::config::{AlertRule, AlertThresholds};
use crate::types::monitor::{Alert, AlertKind};
use crate::types::snapshot::{ScoredCompany, Snapshot};
use std::collections::BTreeMap;

/// Threshold rules comparing one company across two cycles.
///
/// Without a previous record there is no baseline and nothing fires. Each rule
/// is skipped when one of its inputs is undefined. Comparisons are strict, so a
/// change landing exactly on the threshold does not alert.
pub fn evaluate(
    current: &ScoredCompany,
    previous: Option<&ScoredCompany>,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    [
        score_drop(current, previous, &thresholds.score_drop),
        leverage_spike(current, previous, &thresholds.leverage_spike),
        cash_flow_collapse(current, previous, &thresholds.cash_flow_collapse),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Alerts for every ticker present in both snapshots, keyed by ticker.
/// Tickers without alerts are omitted.
pub fn evaluate_snapshots(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    thresholds: &AlertThresholds,
) -> BTreeMap<String, Vec<Alert>> {
    let Some(previous) = previous else {
        return BTreeMap::new();
    };

    current
        .rows()
        .iter()
        .filter_map(|row| {
            let prior = previous.get(row.ticker())?;
            let alerts = evaluate(&row.company, Some(&prior.company), thresholds);
            (!alerts.is_empty()).then(|| (row.ticker().to_string(), alerts))
        })
        .collect()
}

/// Slack for the rounding error of the relative-change division, so a drop
/// that is exactly the threshold in decimal terms stays on the quiet side.
const RELATIVE_TOLERANCE: f64 = 1e-12;

fn fractional_change(current: f64, previous: f64) -> Option<f64> {
    (previous > 0.0).then(|| (current - previous) / previous)
}

fn dropped_past(change: f64, threshold: f64) -> bool {
    change < -threshold - RELATIVE_TOLERANCE
}

fn score_drop(current: &ScoredCompany, previous: &ScoredCompany, rule: &AlertRule) -> Option<Alert> {
    let change = fractional_change(current.final_score, previous.final_score)?;
    dropped_past(change, rule.threshold).then(|| Alert {
        ticker: current.ticker.clone(),
        kind: AlertKind::ScoreDrop,
        severity: rule.severity,
        message: format!("Composite score dropped by {:.1}%", change.abs() * 100.0),
    })
}

fn leverage_spike(
    current: &ScoredCompany,
    previous: &ScoredCompany,
    rule: &AlertRule,
) -> Option<Alert> {
    let now = current.metrics.get(Metric::DebtToEquity)?;
    let before = previous.metrics.get(Metric::DebtToEquity)?;
    (now - before > rule.threshold).then(|| Alert {
        ticker: current.ticker.clone(),
        kind: AlertKind::LeverageSpike,
        severity: rule.severity,
        message: format!("Debt/Equity ratio spiked from {before:.2} to {now:.2}"),
    })
}

fn cash_flow_collapse(
    current: &ScoredCompany,
    previous: &ScoredCompany,
    rule: &AlertRule,
) -> Option<Alert> {
    let now = current.metrics.get(Metric::Cfo)?;
    let before = previous.metrics.get(Metric::Cfo)?;
    let change = fractional_change(now, before)?;
    dropped_past(change, rule.threshold).then(|| Alert {
        ticker: current.ticker.clone(),
        kind: AlertKind::CashFlowCollapse,
        severity: rule.severity,
        message: format!("Operating cash flow collapsed by {:.1}%", change.abs() * 100.0),
    })
}
