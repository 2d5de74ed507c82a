use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    ScoreDrop,
    LeverageSpike,
    CashFlowCollapse,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScoreDrop => "SCORE_DROP",
            Self::LeverageSpike => "LEVERAGE_SPIKE",
            Self::CashFlowCollapse => "CASH_FLOW_COLLAPSE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub ticker: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChurnAction {
    Add,
    Remove,
    Keep,
}

impl ChurnAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::Keep => "KEEP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnDecision {
    pub ticker: String,
    pub action: ChurnAction,
    pub reason: String,
    /// Positional rank in the snapshot the decision refers to.
    pub rank: usize,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankMove {
    pub ticker: String,
    pub previous_rank: usize,
    pub current_rank: usize,
    /// `previous_rank - current_rank`; positive means the company climbed.
    pub rank_delta: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_kind_serializes_as_tag() {
        let encoded = serde_json::to_string(&AlertKind::CashFlowCollapse).expect("serializes");
        assert_eq!(encoded, "\"CASH_FLOW_COLLAPSE\"");
        assert_eq!(AlertKind::CashFlowCollapse.as_str(), "CASH_FLOW_COLLAPSE");
    }

    #[test]
    fn severity_orders_low_to_high() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::High.to_string(), "HIGH");
    }
}
