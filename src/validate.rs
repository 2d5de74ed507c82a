use crate::metrics::functions::ratio;
use crate::types::record::{RawCompanyInput, HISTORY_FIELDS, OPTIONAL_FIELDS, REQUIRED_FIELDS};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const NON_NEGATIVE_FIELDS: [&str; 5] = [
    "revenue",
    "total_assets",
    "equity",
    "revenue_3y_ago",
    "capital_employed",
];
const NON_ZERO_FIELDS: [&str; 2] = ["revenue", "total_assets"];
const ROE_BOUNDS: (f64, f64) = (-1.0, 5.0);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataIssue {
    pub id: String,
    pub ticker: Option<String>,
    pub message: String,
    /// Blocking issues exclude the record from a scoring cycle.
    pub blocking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub records: usize,
    pub issues: Vec<DataIssue>,
}

impl DataQualityReport {
    pub fn has_blocking(&self) -> bool {
        self.issues.iter().any(|issue| issue.blocking)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|issue| !issue.blocking)
    }
}

fn issue(id: &str, ticker: Option<&str>, message: String, blocking: bool) -> DataIssue {
    DataIssue {
        id: id.to_string(),
        ticker: ticker.map(str::to_string),
        message,
        blocking,
    }
}

pub fn check(inputs: &[RawCompanyInput]) -> DataQualityReport {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    let mut missing: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for input in inputs {
        let ticker = input.display_ticker();
        if !seen.insert(ticker.to_string()) {
            issues.push(issue(
                "input.duplicate_ticker",
                Some(ticker),
                format!("{ticker} appears more than once; the last record wins"),
                false,
            ));
        }

        if let Err(reason) = input.clone().into_record() {
            issues.push(issue(
                "input.unusable_record",
                Some(ticker),
                format!("{ticker} will be skipped: {reason}"),
                true,
            ));
            continue;
        }

        let value = |name: &str| input.fields.get(name).copied().flatten();

        for name in REQUIRED_FIELDS.iter().chain(OPTIONAL_FIELDS.iter()) {
            if input.fields.contains_key(*name) && value(*name).is_none() {
                missing.entry(*name).or_default().push(ticker.to_string());
            }
        }

        for name in NON_NEGATIVE_FIELDS {
            if let Some(v) = value(name).filter(|v| *v < 0.0) {
                issues.push(issue(
                    "values.negative",
                    Some(ticker),
                    format!("{ticker}: {name} is negative ({v})"),
                    false,
                ));
            }
        }

        for name in NON_ZERO_FIELDS {
            if value(name) == Some(0.0) {
                issues.push(issue(
                    "values.zero",
                    Some(ticker),
                    format!("{ticker}: {name} is zero"),
                    false,
                ));
            }
        }

        if let Some(capex) = value("capex").filter(|v| *v < 0.0) {
            issues.push(issue(
                "values.negative_capex",
                Some(ticker),
                format!("{ticker}: capex reported as {capex}; scored as its magnitude"),
                false,
            ));
        }

        if let Some(de) = ratio(value("total_debt"), value("equity")).filter(|v| *v < 0.0) {
            issues.push(issue(
                "ratios.negative_debt_to_equity",
                Some(ticker),
                format!("{ticker}: debt_to_equity is negative ({de:.2})"),
                false,
            ));
        }

        if let Some(roe) = ratio(value("net_income"), value("equity"))
            .filter(|v| *v < ROE_BOUNDS.0 || *v > ROE_BOUNDS.1)
        {
            issues.push(issue(
                "ratios.extreme_roe",
                Some(ticker),
                format!(
                    "{ticker}: roe {roe:.2} outside [{}, {}]",
                    ROE_BOUNDS.0, ROE_BOUNDS.1
                ),
                false,
            ));
        }

        for name in input.history.keys() {
            if !HISTORY_FIELDS.contains(&name.as_str()) {
                issues.push(issue(
                    "history.unknown_series",
                    Some(ticker),
                    format!("{ticker}: history series '{name}' is not used"),
                    false,
                ));
            }
        }
    }

    for (name, tickers) in missing {
        issues.push(issue(
            "values.missing",
            None,
            format!(
                "{name} is undefined for {} record(s): {}",
                tickers.len(),
                tickers.join(", ")
            ),
            false,
        ));
    }

    DataQualityReport {
        records: inputs.len(),
        issues,
    }
}
