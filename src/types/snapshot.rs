use crate::error::{EngineError, Result};
use crate::metrics::{Metric, MetricSet};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How one metric fed into a company's composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub raw: Option<f64>,
    /// True when `raw` was undefined and the worst observed value stood in.
    pub imputed: bool,
    /// Direction-aware percentile in [0, 1].
    pub normalized: f64,
    pub weighted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCompany {
    pub ticker: String,
    pub metrics: MetricSet,
    pub final_score: f64,
    #[serde(default)]
    pub contributions: BTreeMap<Metric, Contribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    /// 1-based position in the snapshot.
    pub position: usize,
    /// Dense rank: equal scores share a rank, the next score gets rank + 1.
    pub rank: usize,
    #[serde(flatten)]
    pub company: ScoredCompany,
}

impl RankedRow {
    pub fn ticker(&self) -> &str {
        &self.company.ticker
    }
}

/// A dated, ordered ranking. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    as_of: NaiveDate,
    rows: Vec<RankedRow>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new(as_of: NaiveDate, rows: Vec<RankedRow>) -> Result<Self> {
        let mut index = HashMap::with_capacity(rows.len());
        for (offset, row) in rows.iter().enumerate() {
            if row.position != offset + 1 {
                return Err(EngineError::SnapshotIntegrity(format!(
                    "{as_of}: row {} has position {}, expected {}",
                    row.ticker(),
                    row.position,
                    offset + 1
                )));
            }
            if index.insert(row.ticker().to_string(), offset).is_some() {
                return Err(EngineError::SnapshotIntegrity(format!(
                    "{as_of}: duplicate ticker {}",
                    row.ticker()
                )));
            }
        }
        Ok(Self { as_of, rows, index })
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn rows(&self) -> &[RankedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, ticker: &str) -> Option<&RankedRow> {
        self.index.get(ticker).map(|offset| &self.rows[*offset])
    }

    pub fn position_of(&self, ticker: &str) -> Option<usize> {
        self.get(ticker).map(|row| row.position)
    }

    #[cfg(test)]
    pub fn tickers(&self) -> std::collections::BTreeSet<&str> {
        self.rows.iter().map(RankedRow::ticker).collect()
    }
}
