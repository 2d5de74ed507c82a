use super::CycleSummary;
use crate::metrics::Metric;
use crate::monitor::churn::ChurnReport;
use crate::monitor::MonitorReport;
use crate::types::monitor::ChurnDecision;
use crate::validate::DataQualityReport;

const TABLE_METRICS: [Metric; 4] = [
    Metric::Roe,
    Metric::Roce,
    Metric::DebtToEquity,
    Metric::FcfMargin,
];

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

pub fn cycle_markdown(summary: &CycleSummary<'_>) -> String {
    let mut output = String::new();
    output.push_str("# Fundamental Ranking\n\n");
    output.push_str(&format!("As of: {}\n\n", summary.as_of));
    output.push_str(&format!(
        "Scored {} companies, showing {}.\n\n",
        summary.universe_size,
        summary.rows.len()
    ));

    output.push_str("| # | Rank | Ticker | Score |");
    for metric in TABLE_METRICS {
        output.push_str(&format!(" {metric} |"));
    }
    output.push_str("\n|---|---|---|---|");
    output.push_str(&"---|".repeat(TABLE_METRICS.len()));
    output.push('\n');
    for row in summary.rows {
        output.push_str(&format!(
            "| {} | {} | {} | {:.3} |",
            row.position,
            row.rank,
            row.ticker(),
            row.company.final_score
        ));
        for metric in TABLE_METRICS {
            output.push_str(&format!(" {} |", cell(row.company.metrics.get(metric))));
        }
        output.push('\n');
    }
    output.push('\n');

    output.push_str("## Skipped Records\n\n");
    if summary.skipped.is_empty() {
        output.push_str("- none\n");
    } else {
        for skipped in summary.skipped {
            output.push_str(&format!("- {}: {}\n", skipped.ticker, skipped.reason));
        }
    }

    output
}

/// Plain-text block for one churn decision.
pub fn churn_block(decision: &ChurnDecision) -> String {
    let mut lines = vec![
        format!("Company: {}", decision.ticker),
        format!("Action: {}", decision.action.as_str()),
        format!("Rank: {}", decision.rank),
    ];
    if decision.alerts.is_empty() {
        lines.push("Triggered Alerts: None".to_string());
    } else {
        lines.push("Triggered Alerts:".to_string());
        for alert in &decision.alerts {
            lines.push(format!("- {} ({})", alert.kind.as_str(), alert.severity));
        }
    }
    lines.push("Reason:".to_string());
    lines.push(decision.reason.clone());
    lines.push("-".repeat(20));
    lines.join("\n")
}

pub fn monitor_markdown(report: &MonitorReport) -> String {
    let mut output = String::new();
    output.push_str("# Monitoring Brief\n\n");
    output.push_str(&format!("Date: {}\n", report.current_as_of));
    if let Some(previous) = report.previous_as_of {
        output.push_str(&format!("Compared with: {previous}\n"));
    }
    output.push('\n');

    let (additions, removals, retained, movers) = match &report.churn {
        ChurnReport::FirstCycle { tickers } => {
            output.push_str("First run. No previous history to compare.\n\n");
            output.push_str(&format!("Current ranking: {}\n", tickers.join(", ")));
            return output;
        }
        ChurnReport::Compared {
            additions,
            removals,
            retained,
            movers,
        } => (additions, removals, retained, movers),
    };

    output.push_str("## New Entrants\n\n");
    if additions.is_empty() {
        output.push_str("- none\n");
    }
    for decision in additions {
        output.push_str(&format!(
            "- **{}** (Rank #{}): {}\n",
            decision.ticker, decision.rank, decision.reason
        ));
    }

    output.push_str("\n## Dropped Companies\n\n");
    if removals.is_empty() {
        output.push_str("- none\n");
    }
    for decision in removals {
        output.push_str(&format!(
            "- **{}** (Prev Rank #{})\n",
            decision.ticker, decision.rank
        ));
    }

    output.push_str("\n## Significant Rank Movers\n\n");
    if movers.is_empty() {
        output.push_str("- none\n");
    }
    for mover in movers {
        let direction = if mover.rank_delta > 0 { "up" } else { "down" };
        output.push_str(&format!(
            "- {direction} **{}**: {:+} positions (Now #{})\n",
            mover.ticker, mover.rank_delta, mover.current_rank
        ));
    }

    output.push_str("\n## Alerts\n\n");
    if report.alerts.is_empty() {
        output.push_str("- none\n");
    }
    for alert in &report.alerts {
        output.push_str(&format!(
            "- [{}] {} {}: {}\n",
            alert.severity,
            alert.ticker,
            alert.kind.as_str(),
            alert.message
        ));
    }

    output.push_str(&format!("\n## Churn Log\n\nRetained: {}\n\n```text\n", retained.len()));
    let blocks: Vec<String> = report.churn.decisions().map(churn_block).collect();
    output.push_str(&blocks.join("\n"));
    output.push_str("\n```\n");

    output
}

pub fn quality_markdown(report: &DataQualityReport) -> String {
    let mut output = String::new();
    output.push_str("# Data Quality Report\n\n");
    output.push_str(&format!("Records checked: {}\n\n", report.records));
    output.push_str("## Issues\n\n");
    if report.issues.is_empty() {
        output.push_str("- none\n");
        return output;
    }
    for issue in &report.issues {
        let level = if issue.blocking { "blocking" } else { "warning" };
        match &issue.ticker {
            Some(ticker) => output.push_str(&format!(
                "- [{level}] {} ({ticker}): {}\n",
                issue.id, issue.message
            )),
            None => output.push_str(&format!("- [{level}] {}: {}\n", issue.id, issue.message)),
        }
    }
    output
}
