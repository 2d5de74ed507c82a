use crate::error::{EngineError, Result};
use crate::metrics::series::Series;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Scalar keys every record must declare; a `null` value is fine, an absent key is not.
pub const REQUIRED_FIELDS: [&str; 12] = [
    "net_income",
    "equity",
    "ebit",
    "capital_employed",
    "revenue",
    "revenue_3y_ago",
    "profit_3y_ago",
    "total_debt",
    "interest_expense",
    "cfo",
    "capex",
    "total_assets",
];

pub const OPTIONAL_FIELDS: [&str; 7] = [
    "price_current",
    "price_1y_ago",
    "eps",
    "peg_ratio",
    "cfi",
    "total_liabilities",
    "current_liabilities",
];

pub const HISTORY_FIELDS: [&str; 7] = [
    "revenue",
    "net_income",
    "ebit",
    "equity",
    "capital_employed",
    "eps",
    "gross_profit",
];

/// Record as delivered by the ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCompanyInput {
    pub ticker: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum SkipReason {
    BlankTicker,
    MissingField(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankTicker => f.write_str("ticker is blank"),
            Self::MissingField(field) => write!(f, "missing required field '{field}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub ticker: String,
    pub reason: SkipReason,
}

/// Scalar line items. Capex and interest expense hold non-negative magnitudes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub net_income: Option<f64>,
    pub equity: Option<f64>,
    pub ebit: Option<f64>,
    pub capital_employed: Option<f64>,
    pub revenue: Option<f64>,
    pub revenue_3y_ago: Option<f64>,
    pub profit_3y_ago: Option<f64>,
    pub total_debt: Option<f64>,
    pub interest_expense: Option<f64>,
    pub cfo: Option<f64>,
    pub capex: Option<f64>,
    pub total_assets: Option<f64>,
    pub price_current: Option<f64>,
    pub price_1y_ago: Option<f64>,
    pub eps: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub cfi: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub current_liabilities: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub revenue: Series,
    pub net_income: Series,
    pub ebit: Series,
    pub equity: Series,
    pub capital_employed: Series,
    pub eps: Series,
    pub gross_profit: Series,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyRecord {
    pub ticker: String,
    pub fields: RawFields,
    pub history: History,
}

impl RawCompanyInput {
    pub fn display_ticker(&self) -> &str {
        let trimmed = self.ticker.trim();
        if trimmed.is_empty() {
            "<blank>"
        } else {
            trimmed
        }
    }

    pub fn into_record(self) -> std::result::Result<CompanyRecord, SkipReason> {
        let ticker = self.ticker.trim().to_string();
        if ticker.is_empty() {
            return Err(SkipReason::BlankTicker);
        }
        if let Some(missing) = REQUIRED_FIELDS
            .iter()
            .find(|field| !self.fields.contains_key(**field))
        {
            return Err(SkipReason::MissingField((*missing).to_string()));
        }

        for key in self.fields.keys() {
            if !REQUIRED_FIELDS.contains(&key.as_str()) && !OPTIONAL_FIELDS.contains(&key.as_str())
            {
                debug!(ticker = %ticker, field = %key, "ignoring unknown raw field");
            }
        }

        let field = |name: &str| {
            self.fields
                .get(name)
                .copied()
                .flatten()
                .filter(|value| value.is_finite())
        };

        let fields = RawFields {
            net_income: field("net_income"),
            equity: field("equity"),
            ebit: field("ebit"),
            capital_employed: field("capital_employed"),
            revenue: field("revenue"),
            revenue_3y_ago: field("revenue_3y_ago"),
            profit_3y_ago: field("profit_3y_ago"),
            total_debt: field("total_debt"),
            interest_expense: magnitude(&ticker, "interest_expense", field("interest_expense")),
            cfo: field("cfo"),
            capex: magnitude(&ticker, "capex", field("capex")),
            total_assets: field("total_assets"),
            price_current: field("price_current"),
            price_1y_ago: field("price_1y_ago"),
            eps: field("eps"),
            peg_ratio: field("peg_ratio"),
            cfi: field("cfi"),
            total_liabilities: field("total_liabilities"),
            current_liabilities: field("current_liabilities"),
        };

        let series = |name: &str| {
            self.history
                .get(name)
                .map(|values| Series::new(values.clone()))
                .unwrap_or_default()
        };

        let history = History {
            revenue: series("revenue"),
            net_income: series("net_income"),
            ebit: series("ebit"),
            equity: series("equity"),
            capital_employed: series("capital_employed"),
            eps: series("eps"),
            gross_profit: series("gross_profit"),
        };

        Ok(CompanyRecord {
            ticker,
            fields,
            history,
        })
    }
}

/// Outflow line items are carried as magnitudes; providers disagree on the sign.
fn magnitude(ticker: &str, name: &str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v < 0.0 => {
            debug!(ticker = %ticker, field = name, value = v, "normalizing negative outflow to magnitude");
            Some(v.abs())
        }
        other => other,
    }
}

/// One ingestion cycle as read from disk.
#[derive(Debug, Clone, Default)]
pub struct InputBatch {
    pub as_of: Option<NaiveDate>,
    pub companies: Vec<RawCompanyInput>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InputFile {
    Plain(Vec<RawCompanyInput>),
    Dated {
        as_of: Option<NaiveDate>,
        companies: Vec<RawCompanyInput>,
    },
}

pub fn parse_input(content: &str) -> Result<InputBatch> {
    let parsed: InputFile =
        serde_json::from_str(content).map_err(|e| EngineError::InputParse(e.to_string()))?;
    Ok(match parsed {
        InputFile::Dated { as_of, companies } => InputBatch { as_of, companies },
        InputFile::Plain(companies) => InputBatch {
            as_of: None,
            companies,
        },
    })
}

pub fn load_input(path: &Path) -> Result<InputBatch> {
    if !path.exists() {
        return Err(EngineError::PathNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_input(&content).map_err(|e| match e {
        EngineError::InputParse(msg) => {
            EngineError::InputParse(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::raw;
    use super::*;

    #[test]
    fn absent_required_key_skips_the_record() {
        let mut input = raw("ACME", &[]);
        input.fields.remove("cfo");
        assert_eq!(
            input.into_record(),
            Err(SkipReason::MissingField("cfo".to_string()))
        );
    }

    #[test]
    fn null_required_value_is_undefined_not_malformed() {
        let input = raw("ACME", &[("revenue_3y_ago", None)]);
        let record = input.into_record().expect("null value should still validate");
        assert_eq!(record.fields.revenue_3y_ago, None);
        assert_eq!(record.fields.revenue, Some(100.0));
    }

    #[test]
    fn blank_ticker_is_rejected() {
        let input = raw("  ", &[]);
        assert_eq!(input.into_record(), Err(SkipReason::BlankTicker));
    }

    #[test]
    fn negative_capex_is_normalized_to_magnitude() {
        let input = raw("ACME", &[("capex", Some(-250.0)), ("interest_expense", Some(-12.0))]);
        let record = input.into_record().expect("record should validate");
        assert_eq!(record.fields.capex, Some(250.0));
        assert_eq!(record.fields.interest_expense, Some(12.0));
    }

    #[test]
    fn parse_input_accepts_plain_and_dated_forms() {
        let plain = r#"[{"ticker": "A", "fields": {"cfo": 1.0}}]"#;
        let batch = parse_input(plain).expect("plain list should parse");
        assert_eq!(batch.companies.len(), 1);
        assert!(batch.as_of.is_none());

        let dated = r#"{
            "as_of": "2026-03-31",
            "companies": [
                {"ticker": "A", "fields": {"cfo": null}, "history": {"revenue": [3.0, null, 1.0]}}
            ]
        }"#;
        let batch = parse_input(dated).expect("dated batch should parse");
        assert_eq!(
            batch.as_of,
            Some(NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid date"))
        );
        assert_eq!(batch.companies[0].fields.get("cfo"), Some(&None));
        assert_eq!(
            batch.companies[0].history.get("revenue"),
            Some(&vec![Some(3.0), None, Some(1.0)])
        );
    }

    #[test]
    fn parse_input_reports_malformed_json() {
        let err = parse_input("{not json").expect_err("malformed input should fail");
        assert!(matches!(err, EngineError::InputParse(_)));
    }
}
