//! Total numeric building blocks for the metric catalog.
//!
//! Every function returns `None` for undefined results (missing operands,
//! zero denominators, non-positive growth endpoints, empty series) and never
//! panics or yields a non-finite value.

use super::series::{aligned, Series};

fn finite(value: f64) -> Option<f64> {
    Some(value).filter(|v| v.is_finite())
}

fn operand(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let numerator = operand(numerator)?;
    let denominator = operand(denominator)?;
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

pub fn difference(minuend: Option<f64>, subtrahend: Option<f64>) -> Option<f64> {
    finite(operand(minuend)? - operand(subtrahend)?)
}

pub fn compound_growth(start: Option<f64>, end: Option<f64>, periods: u32) -> Option<f64> {
    let start = operand(start)?;
    let end = operand(end)?;
    if periods == 0 || start <= 0.0 || end <= 0.0 {
        return None;
    }
    finite((end / start).powf(1.0 / f64::from(periods)) - 1.0)
}

/// Simple growth from `prior` to `latest`; undefined when the anchor is zero.
pub fn growth(latest: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let latest = operand(latest)?;
    let prior = operand(prior)?;
    if prior == 0.0 {
        return None;
    }
    finite((latest - prior) / prior)
}

/// Growth between the latest period and the period `anchor` steps back.
pub fn latest_vs_prior_growth(series: &Series, anchor: usize) -> Option<f64> {
    growth(series.get(0), series.get(anchor))
}

/// Compound growth across the whole series, oldest entry to newest.
pub fn series_span_cagr(series: &Series) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let periods = u32::try_from(series.len() - 1).ok()?;
    compound_growth(series.oldest(), series.get(0), periods)
}

pub fn series_mean(series: &Series) -> Option<f64> {
    mean(series.defined())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    finite(sum / count as f64)
}

/// Mean of the per-period ratios `numerator[i] / denominator[i]` over the
/// aligned periods where the ratio is defined.
pub fn multi_period_average(numerator: &Series, denominator: &Series) -> Option<f64> {
    mean(aligned(numerator, denominator).filter_map(|(n, d)| ratio(n, d)))
}

/// 1.0 when every aligned period with a defined ratio exceeds `threshold`,
/// 0.0 when any such period fails or none qualifies.
pub fn boolean_threshold_check(numerator: &Series, denominator: &Series, threshold: f64) -> f64 {
    let mut qualifying = 0usize;
    for value in aligned(numerator, denominator).filter_map(|(n, d)| ratio(n, d)) {
        if value <= threshold {
            return 0.0;
        }
        qualifying += 1;
    }
    if qualifying == 0 {
        0.0
    } else {
        1.0
    }
}

/// Population standard deviation over the absolute mean; needs two defined
/// values and a non-zero mean.
pub fn coefficient_of_variation(series: &Series) -> Option<f64> {
    let values: Vec<f64> = series.defined().collect();
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values.iter().copied())?;
    if mean == 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    finite(variance.sqrt() / mean.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: Option<f64>, right: f64) -> bool {
        left.map(|value| (value - right).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn ratio_is_undefined_for_zero_or_missing_operands() {
        assert_eq!(ratio(Some(1.0), Some(0.0)), None);
        assert_eq!(ratio(None, Some(2.0)), None);
        assert_eq!(ratio(Some(1.0), None), None);
        assert_eq!(ratio(Some(f64::NAN), Some(1.0)), None);
        assert!(approx(ratio(Some(1.0), Some(4.0)), 0.25));
    }

    #[test]
    fn ratio_overflow_is_undefined() {
        assert_eq!(ratio(Some(f64::MAX), Some(1e-300)), None);
    }

    #[test]
    fn compound_growth_requires_positive_endpoints_and_periods() {
        assert_eq!(compound_growth(Some(-100.0), Some(200.0), 3), None);
        assert_eq!(compound_growth(Some(100.0), Some(-1.0), 3), None);
        assert_eq!(compound_growth(Some(0.0), Some(100.0), 3), None);
        assert_eq!(compound_growth(Some(100.0), Some(200.0), 0), None);
        assert_eq!(compound_growth(None, Some(200.0), 3), None);
        assert!(approx(compound_growth(Some(100.0), Some(121.0), 2), 0.1));
    }

    #[test]
    fn latest_vs_prior_growth_uses_the_anchor_period() {
        let series = Series::from(vec![130.0, 120.0, 110.0, 100.0]);
        assert!(approx(latest_vs_prior_growth(&series, 3), 0.3));
        assert!(approx(latest_vs_prior_growth(&series, 1), 10.0 / 120.0));
        assert_eq!(latest_vs_prior_growth(&series, 4), None);

        let zero_anchor = Series::from(vec![10.0, 0.0]);
        assert_eq!(latest_vs_prior_growth(&zero_anchor, 1), None);
    }

    #[test]
    fn multi_period_average_skips_undefined_periods() {
        let numerator = Series::new(vec![Some(10.0), None, Some(30.0), Some(5.0)]);
        let denominator = Series::new(vec![Some(100.0), Some(100.0), Some(100.0), Some(0.0)]);
        assert!(approx(multi_period_average(&numerator, &denominator), 0.2));
        assert_eq!(
            multi_period_average(&Series::default(), &denominator),
            None
        );
    }

    #[test]
    fn multi_period_average_ignores_periods_past_the_shorter_series() {
        let numerator = Series::from(vec![10.0, 20.0, 1000.0]);
        let denominator = Series::from(vec![100.0, 100.0]);
        assert!(approx(multi_period_average(&numerator, &denominator), 0.15));
    }

    #[test]
    fn boolean_threshold_check_requires_every_qualifying_period() {
        let ebit = Series::new(vec![Some(40.0), Some(35.0), None]);
        let capital = Series::from(vec![100.0, 100.0, 100.0]);
        assert_eq!(boolean_threshold_check(&ebit, &capital, 0.30), 1.0);

        let failing = Series::from(vec![40.0, 30.0]);
        assert_eq!(boolean_threshold_check(&failing, &capital, 0.30), 0.0);
        assert_eq!(
            boolean_threshold_check(&Series::default(), &capital, 0.30),
            0.0
        );
    }

    #[test]
    fn series_span_cagr_runs_oldest_to_newest() {
        let revenue = Series::from(vec![121.0, 110.0, 100.0]);
        assert!(approx(series_span_cagr(&revenue), 0.1));
        assert_eq!(series_span_cagr(&Series::from(vec![5.0])), None);
        let missing_oldest = Series::new(vec![Some(121.0), Some(110.0), None]);
        assert_eq!(series_span_cagr(&missing_oldest), None);
    }

    #[test]
    fn coefficient_of_variation_needs_two_values_and_nonzero_mean() {
        assert_eq!(coefficient_of_variation(&Series::from(vec![5.0])), None);
        assert_eq!(coefficient_of_variation(&Series::from(vec![1.0, -1.0])), None);
        assert!(approx(
            coefficient_of_variation(&Series::from(vec![90.0, 110.0])),
            0.1
        ));
    }

    #[test]
    fn difference_propagates_undefined() {
        assert_eq!(difference(Some(100.0), None), None);
        assert!(approx(difference(Some(100.0), Some(30.0)), 70.0));
    }
}
