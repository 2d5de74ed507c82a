pub mod catalog;
pub mod functions;
pub mod series;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Roe,
    Roce,
    NetMargin,
    OperatingMargin,
    RevenueCagr,
    ProfitCagr,
    #[serde(rename = "revenue_growth_3y")]
    RevenueGrowth3y,
    RevenueGrowthLatest,
    RevenueCagrHist,
    ProfitCagrHist,
    EpsGrowth,
    DebtToEquity,
    InterestCoverage,
    OcfRatio,
    FreeCashFlow,
    FcfMargin,
    FcfToNetProfit,
    AssetTurnover,
    EarningsVolatility,
    RoceAvg,
    RoeAvg,
    GrossMarginAvg,
    NetMarginAvg,
    EpsAvg,
    RoceConsistency,
    PeRatio,
    PegRatio,
    #[serde(rename = "price_growth_1y")]
    PriceGrowth1y,
    CapexToNetEarnings,
    InvestingToOperatingCf,
    EquityToLiabilities,
    Cfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

impl Metric {
    pub const ALL: [Metric; 32] = [
        Metric::Roe,
        Metric::Roce,
        Metric::NetMargin,
        Metric::OperatingMargin,
        Metric::RevenueCagr,
        Metric::ProfitCagr,
        Metric::RevenueGrowth3y,
        Metric::RevenueGrowthLatest,
        Metric::RevenueCagrHist,
        Metric::ProfitCagrHist,
        Metric::EpsGrowth,
        Metric::DebtToEquity,
        Metric::InterestCoverage,
        Metric::OcfRatio,
        Metric::FreeCashFlow,
        Metric::FcfMargin,
        Metric::FcfToNetProfit,
        Metric::AssetTurnover,
        Metric::EarningsVolatility,
        Metric::RoceAvg,
        Metric::RoeAvg,
        Metric::GrossMarginAvg,
        Metric::NetMarginAvg,
        Metric::EpsAvg,
        Metric::RoceConsistency,
        Metric::PeRatio,
        Metric::PegRatio,
        Metric::PriceGrowth1y,
        Metric::CapexToNetEarnings,
        Metric::InvestingToOperatingCf,
        Metric::EquityToLiabilities,
        Metric::Cfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Roe => "roe",
            Self::Roce => "roce",
            Self::NetMargin => "net_margin",
            Self::OperatingMargin => "operating_margin",
            Self::RevenueCagr => "revenue_cagr",
            Self::ProfitCagr => "profit_cagr",
            Self::RevenueGrowth3y => "revenue_growth_3y",
            Self::RevenueGrowthLatest => "revenue_growth_latest",
            Self::RevenueCagrHist => "revenue_cagr_hist",
            Self::ProfitCagrHist => "profit_cagr_hist",
            Self::EpsGrowth => "eps_growth",
            Self::DebtToEquity => "debt_to_equity",
            Self::InterestCoverage => "interest_coverage",
            Self::OcfRatio => "ocf_ratio",
            Self::FreeCashFlow => "free_cash_flow",
            Self::FcfMargin => "fcf_margin",
            Self::FcfToNetProfit => "fcf_to_net_profit",
            Self::AssetTurnover => "asset_turnover",
            Self::EarningsVolatility => "earnings_volatility",
            Self::RoceAvg => "roce_avg",
            Self::RoeAvg => "roe_avg",
            Self::GrossMarginAvg => "gross_margin_avg",
            Self::NetMarginAvg => "net_margin_avg",
            Self::EpsAvg => "eps_avg",
            Self::RoceConsistency => "roce_consistency",
            Self::PeRatio => "pe_ratio",
            Self::PegRatio => "peg_ratio",
            Self::PriceGrowth1y => "price_growth_1y",
            Self::CapexToNetEarnings => "capex_to_net_earnings",
            Self::InvestingToOperatingCf => "investing_to_operating_cf",
            Self::EquityToLiabilities => "equity_to_liabilities",
            Self::Cfo => "cfo",
        }
    }

    /// Direction used when the configuration does not override it.
    pub fn default_direction(self) -> Direction {
        match self {
            Self::DebtToEquity
            | Self::EarningsVolatility
            | Self::PeRatio
            | Self::PegRatio
            | Self::CapexToNetEarnings
            | Self::InvestingToOperatingCf => Direction::Lower,
            _ => Direction::Higher,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|metric| metric.as_str() == value)
            .ok_or_else(|| format!("unknown metric: {value}"))
    }
}

/// Every catalog metric for one company, each either a value or undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<Metric, Option<f64>>);

impl MetricSet {
    pub fn insert(&mut self, metric: Metric, value: Option<f64>) {
        self.0.insert(metric, value.filter(|v| v.is_finite()));
    }

    /// Value of `metric`; absent and undefined read the same.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn defined_count(&self) -> usize {
        self.0.values().filter(|value| value.is_some()).count()
    }
}

impl FromIterator<(Metric, Option<f64>)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (Metric, Option<f64>)>>(iter: I) -> Self {
        let mut set = MetricSet::default();
        for (metric, value) in iter {
            set.insert(metric, value);
        }
        set
    }
}
