use crate::error::EngineError;
use crate::metrics::{Direction, Metric};
use crate::types::monitor::Severity;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// On-disk configuration; every section is optional and merged across layers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub logging: Option<LoggingConfig>,
    pub scoring: Option<ScoringSection>,
    pub ranking: Option<RankingSection>,
    pub churn: Option<ChurnSection>,
    pub alerts: Option<AlertsSection>,
    pub store: Option<StoreSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSection {
    pub weights: Option<BTreeMap<String, f64>>,
    pub directions: Option<BTreeMap<String, Direction>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSection {
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChurnSection {
    pub mover_threshold: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsSection {
    pub score_drop: Option<AlertRuleSection>,
    pub leverage_spike: Option<AlertRuleSection>,
    pub cash_flow_collapse: Option<AlertRuleSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertRuleSection {
    pub threshold: Option<f64>,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    pub dir: Option<String>,
    pub retention: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: BTreeMap<Metric, f64>,
    pub directions: BTreeMap<Metric, Direction>,
}

impl ScoringConfig {
    pub fn direction(&self, metric: Metric) -> Direction {
        self.directions
            .get(&metric)
            .copied()
            .unwrap_or_else(|| metric.default_direction())
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.values().sum()
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            directions: BTreeMap::new(),
        }
    }
}

pub fn default_weights() -> BTreeMap<Metric, f64> {
    BTreeMap::from([
        (Metric::Roe, 15.0),
        (Metric::Roce, 10.0),
        (Metric::NetMargin, 5.0),
        (Metric::OperatingMargin, 5.0),
        (Metric::RevenueCagr, 15.0),
        (Metric::ProfitCagr, 10.0),
        (Metric::OcfRatio, 5.0),
        (Metric::FcfMargin, 15.0),
        (Metric::DebtToEquity, 5.0),
        (Metric::InterestCoverage, 5.0),
        (Metric::AssetTurnover, 5.0),
        (Metric::EarningsVolatility, 5.0),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    /// Rows kept in a published snapshot; `None` keeps the whole universe.
    pub top_n: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { top_n: Some(50) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChurnConfig {
    pub mover_threshold: usize,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self { mover_threshold: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRule {
    pub threshold: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    /// Fractional composite-score drop, e.g. 0.15 for 15%.
    pub score_drop: AlertRule,
    /// Absolute debt/equity increase.
    pub leverage_spike: AlertRule,
    /// Fractional operating-cash-flow drop.
    pub cash_flow_collapse: AlertRule,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            score_drop: AlertRule {
                threshold: 0.15,
                severity: Severity::High,
            },
            leverage_spike: AlertRule {
                threshold: 0.5,
                severity: Severity::Medium,
            },
            cash_flow_collapse: AlertRule {
                threshold: 0.50,
                severity: Severity::High,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub dir: PathBuf,
    /// Snapshots kept addressable; `None` keeps all of them.
    pub retention: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("snapshots"),
            retention: Some(30),
        }
    }
}

/// Resolved, immutable configuration handed to every engine stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub log_level: String,
    pub scoring: ScoringConfig,
    pub ranking: RankingConfig,
    pub churn: ChurnConfig,
    pub alerts: AlertThresholds,
    pub store: StoreConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            scoring: ScoringConfig::default(),
            ranking: RankingConfig::default(),
            churn: ChurnConfig::default(),
            alerts: AlertThresholds::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ConfigFile {
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(scoring) = &self.scoring {
            if let Some(weights) = &scoring.weights {
                let unknown = unknown_metric_keys(weights.keys());
                if !unknown.is_empty() {
                    return Err(EngineError::ConfigParse(format!(
                        "scoring.weights contains unknown metric(s): {}",
                        unknown.join(", ")
                    )));
                }
                if let Some((name, _)) = weights
                    .iter()
                    .find(|(_, weight)| !weight.is_finite() || **weight < 0.0)
                {
                    return Err(EngineError::ConfigParse(format!(
                        "scoring.weights.{name} must be a finite non-negative number"
                    )));
                }
                if weights.values().all(|weight| *weight == 0.0) {
                    return Err(EngineError::ConfigParse(
                        "scoring.weights must contain at least one positive weight".to_string(),
                    ));
                }
            }
            if let Some(directions) = &scoring.directions {
                let unknown = unknown_metric_keys(directions.keys());
                if !unknown.is_empty() {
                    return Err(EngineError::ConfigParse(format!(
                        "scoring.directions contains unknown metric(s): {}",
                        unknown.join(", ")
                    )));
                }
            }
        }

        if let Some(churn) = &self.churn {
            if churn.mover_threshold == Some(0) {
                return Err(EngineError::ConfigParse(
                    "churn.mover_threshold must be greater than 0".to_string(),
                ));
            }
        }

        if let Some(alerts) = &self.alerts {
            for (name, rule) in [
                ("score_drop", &alerts.score_drop),
                ("leverage_spike", &alerts.leverage_spike),
                ("cash_flow_collapse", &alerts.cash_flow_collapse),
            ] {
                if let Some(threshold) = rule.as_ref().and_then(|rule| rule.threshold) {
                    if !threshold.is_finite() || threshold <= 0.0 {
                        return Err(EngineError::ConfigParse(format!(
                            "alerts.{name}.threshold must be greater than 0"
                        )));
                    }
                }
            }
        }

        if let Some(level) = self.logging.as_ref().and_then(|logging| logging.level.as_ref()) {
            if !matches!(
                level.as_str(),
                "error" | "warn" | "info" | "debug" | "trace"
            ) {
                return Err(EngineError::ConfigParse(format!(
                    "unsupported logging.level: {level}"
                )));
            }
        }

        Ok(())
    }

    pub fn resolve(&self) -> Result<EngineConfig, EngineError> {
        self.validate()?;
        let defaults = EngineConfig::default();

        let scoring = match &self.scoring {
            Some(section) => ScoringConfig {
                weights: match &section.weights {
                    Some(weights) => parse_metric_table(weights)?,
                    None => defaults.scoring.weights,
                },
                directions: match &section.directions {
                    Some(directions) => parse_metric_table(directions)?,
                    None => BTreeMap::new(),
                },
            },
            None => defaults.scoring,
        };

        let ranking = match self.ranking.as_ref().and_then(|ranking| ranking.top_n) {
            Some(0) => RankingConfig { top_n: None },
            Some(top_n) => RankingConfig { top_n: Some(top_n) },
            None => defaults.ranking,
        };

        let churn = ChurnConfig {
            mover_threshold: self
                .churn
                .as_ref()
                .and_then(|churn| churn.mover_threshold)
                .unwrap_or(defaults.churn.mover_threshold),
        };

        let alert_section = self.alerts.as_ref();
        let alerts = AlertThresholds {
            score_drop: resolve_rule(
                alert_section.and_then(|alerts| alerts.score_drop.as_ref()),
                defaults.alerts.score_drop,
            ),
            leverage_spike: resolve_rule(
                alert_section.and_then(|alerts| alerts.leverage_spike.as_ref()),
                defaults.alerts.leverage_spike,
            ),
            cash_flow_collapse: resolve_rule(
                alert_section.and_then(|alerts| alerts.cash_flow_collapse.as_ref()),
                defaults.alerts.cash_flow_collapse,
            ),
        };

        let store_section = self.store.as_ref();
        let store = StoreConfig {
            dir: store_section
                .and_then(|store| store.dir.as_ref())
                .map(PathBuf::from)
                .unwrap_or(defaults.store.dir),
            retention: match store_section.and_then(|store| store.retention) {
                Some(0) => None,
                Some(retention) => Some(retention),
                None => defaults.store.retention,
            },
        };

        let log_level = self
            .logging
            .as_ref()
            .and_then(|logging| logging.level.clone())
            .unwrap_or(defaults.log_level);

        Ok(EngineConfig {
            log_level,
            scoring,
            ranking,
            churn,
            alerts,
            store,
        })
    }
}

fn resolve_rule(section: Option<&AlertRuleSection>, default: AlertRule) -> AlertRule {
    match section {
        Some(section) => AlertRule {
            threshold: section.threshold.unwrap_or(default.threshold),
            severity: section.severity.unwrap_or(default.severity),
        },
        None => default,
    }
}

fn unknown_metric_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    keys.filter(|key| key.parse::<Metric>().is_err())
        .cloned()
        .collect()
}

fn parse_metric_table<V: Copy>(
    table: &BTreeMap<String, V>,
) -> Result<BTreeMap<Metric, V>, EngineError> {
    table
        .iter()
        .map(|(name, value)| {
            name.parse::<Metric>()
                .map(|metric| (metric, *value))
                .map_err(EngineError::ConfigParse)
        })
        .collect()
}
