use super::functions::{
    boolean_threshold_check, coefficient_of_variation, compound_growth, difference, growth,
    latest_vs_prior_growth, multi_period_average, ratio, series_mean, series_span_cagr,
};
use super::{Metric, MetricSet};
use crate::types::record::CompanyRecord;

/// Periods between `revenue`/`net_income` and their `*_3y_ago` anchors.
pub const GROWTH_ANCHOR_PERIODS: u32 = 3;
pub const ROCE_CONSISTENCY_THRESHOLD: f64 = 0.30;

/// Derives every catalog metric for one company. Never fails.
pub fn compute_all(record: &CompanyRecord) -> MetricSet {
    Metric::ALL
        .iter()
        .map(|metric| (*metric, derive(*metric, record)))
        .collect()
}

pub fn derive(metric: Metric, record: &CompanyRecord) -> Option<f64> {
    let f = &record.fields;
    let h = &record.history;
    let free_cash_flow = difference(f.cfo, f.capex);

    match metric {
        Metric::Roe => ratio(f.net_income, f.equity),
        Metric::Roce => ratio(f.ebit, f.capital_employed),
        Metric::NetMargin => ratio(f.net_income, f.revenue),
        Metric::OperatingMargin => ratio(f.ebit, f.revenue),
        Metric::RevenueCagr => compound_growth(f.revenue_3y_ago, f.revenue, GROWTH_ANCHOR_PERIODS),
        Metric::ProfitCagr => compound_growth(f.profit_3y_ago, f.net_income, GROWTH_ANCHOR_PERIODS),
        Metric::RevenueGrowth3y => {
            latest_vs_prior_growth(&h.revenue, GROWTH_ANCHOR_PERIODS as usize)
        }
        Metric::RevenueGrowthLatest => latest_vs_prior_growth(&h.revenue, 1),
        Metric::RevenueCagrHist => series_span_cagr(&h.revenue),
        Metric::ProfitCagrHist => series_span_cagr(&h.net_income),
        Metric::EpsGrowth => series_span_cagr(&h.eps),
        Metric::DebtToEquity => ratio(f.total_debt, f.equity),
        Metric::InterestCoverage => ratio(f.ebit, f.interest_expense),
        Metric::OcfRatio => ratio(f.cfo, f.current_liabilities),
        Metric::FreeCashFlow => free_cash_flow,
        Metric::FcfMargin => ratio(free_cash_flow, f.revenue),
        Metric::FcfToNetProfit => ratio(free_cash_flow, f.net_income),
        Metric::AssetTurnover => ratio(f.revenue, f.total_assets),
        Metric::EarningsVolatility => coefficient_of_variation(&h.net_income),
        Metric::RoceAvg => multi_period_average(&h.ebit, &h.capital_employed),
        Metric::RoeAvg => multi_period_average(&h.net_income, &h.equity),
        Metric::GrossMarginAvg => multi_period_average(&h.gross_profit, &h.revenue),
        Metric::NetMarginAvg => multi_period_average(&h.net_income, &h.revenue),
        Metric::EpsAvg => series_mean(&h.eps),
        Metric::RoceConsistency => Some(boolean_threshold_check(
            &h.ebit,
            &h.capital_employed,
            ROCE_CONSISTENCY_THRESHOLD,
        )),
        Metric::PeRatio => ratio(f.price_current, f.eps),
        Metric::PegRatio => f.peg_ratio,
        Metric::PriceGrowth1y => growth(f.price_current, f.price_1y_ago),
        Metric::CapexToNetEarnings => ratio(f.capex, f.net_income),
        Metric::InvestingToOperatingCf => ratio(f.cfi, f.cfo),
        Metric::EquityToLiabilities => ratio(f.equity, f.total_liabilities),
        Metric::Cfo => f.cfo,
    }
}
