use crate::error::{EngineError, Result};
use crate::metrics::{catalog, MetricSet};
use crate::scoring::{self, rank};
use crate::types::config::EngineConfig;
use crate::types::record::{CompanyRecord, RawCompanyInput, SkippedRecord};
use crate::types::snapshot::Snapshot;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Validated records for one cycle, keyed by ticker. Resubmitting a ticker
/// replaces the earlier record.
#[derive(Debug, Default)]
pub struct CycleBatch {
    records: BTreeMap<String, CompanyRecord>,
    skipped: Vec<SkippedRecord>,
}

impl CycleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the record was excluded from the cycle.
    pub fn submit(&mut self, input: RawCompanyInput) -> bool {
        let ticker = input.display_ticker().to_string();
        match input.into_record() {
            Ok(record) => {
                if self.records.insert(record.ticker.clone(), record).is_some() {
                    warn!(ticker = %ticker, "duplicate submission, keeping the latest record");
                }
                // A later valid submission supersedes an earlier rejection.
                self.skipped.retain(|skipped| skipped.ticker != ticker);
                true
            }
            Err(reason) => {
                warn!(ticker = %ticker, reason = %reason, "skipping malformed record");
                if !self.records.contains_key(&ticker) {
                    self.skipped.retain(|skipped| skipped.ticker != ticker);
                    self.skipped.push(SkippedRecord { ticker, reason });
                }
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }
}

#[derive(Debug)]
pub struct CycleOutcome {
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedRecord>,
    /// Companies scored before top-N truncation.
    pub universe_size: usize,
}

pub fn run_cycle(
    inputs: Vec<RawCompanyInput>,
    as_of: NaiveDate,
    config: &EngineConfig,
) -> Result<CycleOutcome> {
    info!(as_of = %as_of, submitted = inputs.len(), "starting scoring cycle");
    let mut batch = CycleBatch::new();
    for input in inputs {
        batch.submit(input);
    }
    run_batch(batch, as_of, config)
}

pub fn run_batch(batch: CycleBatch, as_of: NaiveDate, config: &EngineConfig) -> Result<CycleOutcome> {
    if batch.is_empty() {
        warn!(skipped = batch.skipped().len(), "no usable records in cycle");
        return Err(EngineError::EmptyCycle);
    }
    debug!(
        records = batch.len(),
        weighted_metrics = config.scoring.weights.len(),
        total_weight = config.scoring.total_weight(),
        "scoring batch"
    );

    let CycleBatch { records, skipped } = batch;
    let records: Vec<CompanyRecord> = records.into_values().collect();

    let derived: Vec<(String, MetricSet)> = records
        .par_iter()
        .map(|record| {
            let metrics = catalog::compute_all(record);
            debug!(
                ticker = %record.ticker,
                defined = metrics.defined_count(),
                total = metrics.len(),
                "derived metrics"
            );
            (record.ticker.clone(), metrics)
        })
        .collect();

    let universe_size = derived.len();
    let scored = scoring::score(derived, &config.scoring);
    let rows = rank::truncate(rank::rank(scored), config.ranking.top_n);
    let snapshot = Snapshot::new(as_of, rows)?;

    info!(
        as_of = %as_of,
        scored = universe_size,
        published = snapshot.len(),
        skipped = skipped.len(),
        "scoring cycle complete"
    );

    Ok(CycleOutcome {
        snapshot,
        skipped,
        universe_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metric;
    use crate::types::record::fixtures::raw;
    use crate::types::record::SkipReason;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid date")
    }

    #[test]
    fn empty_cycle_is_an_explicit_error() {
        let result = run_cycle(Vec::new(), as_of(), &EngineConfig::default());
        assert!(matches!(result, Err(EngineError::EmptyCycle)));

        let mut malformed = raw("BAD", &[]);
        malformed.fields.remove("equity");
        let result = run_cycle(vec![malformed], as_of(), &EngineConfig::default());
        assert!(matches!(result, Err(EngineError::EmptyCycle)));
    }

    #[test]
    fn malformed_records_are_skipped_without_failing_the_batch() {
        let mut malformed = raw("BAD", &[]);
        malformed.fields.remove("capex");
        let outcome = run_cycle(
            vec![raw("GOOD", &[]), malformed],
            as_of(),
            &EngineConfig::default(),
        )
        .expect("cycle should succeed");
        assert_eq!(outcome.snapshot.len(), 1);
        assert_eq!(
            outcome.skipped,
            vec![SkippedRecord {
                ticker: "BAD".to_string(),
                reason: SkipReason::MissingField("capex".to_string()),
            }]
        );
    }

    #[test]
    fn duplicate_submissions_keep_the_last_record() {
        let mut batch = CycleBatch::new();
        assert!(batch.submit(raw("ACME", &[("net_income", Some(10.0))])));
        assert!(batch.submit(raw("ACME", &[("net_income", Some(50.0))])));
        assert_eq!(batch.len(), 1);

        let outcome = run_batch(batch, as_of(), &EngineConfig::default()).expect("cycle runs");
        let row = outcome.snapshot.get("ACME").expect("ACME is ranked");
        assert_eq!(row.company.metrics.get(Metric::Roe), Some(0.5));
    }

    #[test]
    fn later_valid_submission_clears_an_earlier_skip() {
        let mut batch = CycleBatch::new();
        let mut broken = raw("ACME", &[]);
        broken.fields.remove("ebit");
        assert!(!batch.submit(broken));
        assert!(batch.submit(raw("ACME", &[])));
        assert!(batch.skipped().is_empty());
    }

    #[test]
    fn company_with_missing_growth_anchor_stays_ranked_last_for_that_metric() {
        let mut config = EngineConfig::default();
        config.scoring.weights = BTreeMap::from([(Metric::RevenueCagr, 1.0)]);
        let inputs = vec![
            raw("X", &[("revenue", Some(150.0)), ("revenue_3y_ago", Some(100.0))]),
            raw("Y", &[("revenue", Some(120.0)), ("revenue_3y_ago", Some(100.0))]),
            raw("W", &[("revenue", Some(200.0)), ("revenue_3y_ago", Some(100.0))]),
            raw("Z", &[("revenue", Some(500.0)), ("revenue_3y_ago", None)]),
        ];
        let outcome = run_cycle(inputs, as_of(), &config).expect("cycle runs");
        let z = outcome.snapshot.get("Z").expect("Z must stay in the ranking");
        assert_eq!(z.company.metrics.get(Metric::RevenueCagr), None);

        let contribution = z.company.contributions[&Metric::RevenueCagr];
        assert!(contribution.imputed);
        let worst = outcome
            .snapshot
            .rows()
            .iter()
            .map(|row| row.company.contributions[&Metric::RevenueCagr].normalized)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(contribution.normalized, worst);
    }

    #[test]
    fn top_n_truncates_the_published_snapshot() {
        let mut config = EngineConfig::default();
        config.ranking.top_n = Some(2);
        let inputs = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, ticker)| raw(ticker, &[("net_income", Some(10.0 * (i as f64 + 1.0)))]))
            .collect();
        let outcome = run_cycle(inputs, as_of(), &config).expect("cycle runs");
        assert_eq!(outcome.universe_size, 3);
        assert_eq!(outcome.snapshot.len(), 2);
        assert_eq!(outcome.snapshot.as_of(), as_of());
    }
}
