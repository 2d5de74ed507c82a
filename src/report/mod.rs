pub mod json;
pub mod md;

use crate::error::EngineError;
use crate::monitor::MonitorReport;
use crate::pipeline::CycleOutcome;
use crate::types::record::SkippedRecord;
use crate::types::snapshot::RankedRow;
use crate::validate::DataQualityReport;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Md,
}

/// Serialized view of one scoring cycle.
#[derive(Debug, Serialize)]
pub struct CycleSummary<'a> {
    pub as_of: NaiveDate,
    pub universe_size: usize,
    pub skipped: &'a [SkippedRecord],
    pub rows: &'a [RankedRow],
}

impl<'a> From<&'a CycleOutcome> for CycleSummary<'a> {
    fn from(outcome: &'a CycleOutcome) -> Self {
        Self {
            as_of: outcome.snapshot.as_of(),
            universe_size: outcome.universe_size,
            skipped: &outcome.skipped,
            rows: outcome.snapshot.rows(),
        }
    }
}

pub fn render_cycle(outcome: &CycleOutcome, format: OutputFormat) -> Result<String, EngineError> {
    let summary = CycleSummary::from(outcome);
    match format {
        OutputFormat::Json => json::to_json(&summary).map_err(EngineError::Json),
        OutputFormat::Md => Ok(md::cycle_markdown(&summary)),
    }
}

pub fn render_monitor(report: &MonitorReport, format: OutputFormat) -> Result<String, EngineError> {
    match format {
        OutputFormat::Json => json::to_json(report).map_err(EngineError::Json),
        OutputFormat::Md => Ok(md::monitor_markdown(report)),
    }
}

pub fn render_quality(
    report: &DataQualityReport,
    format: OutputFormat,
) -> Result<String, EngineError> {
    match format {
        OutputFormat::Json => json::to_json(report).map_err(EngineError::Json),
        OutputFormat::Md => Ok(md::quality_markdown(report)),
    }
}
