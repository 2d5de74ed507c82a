//! Direction-aware percentile normalization of one metric column.
//!
//! Undefined entries take the worst observed value for the direction before
//! ranking. Ranks are averaged across ties and rescaled so the best value
//! maps to 1.0 and the worst to 0.0. A constant column (including one with no
//! observed values at all, or a single company) maps to 0.5 everywhere.

use crate::metrics::Direction;
use std::cmp::Ordering;

pub const NEUTRAL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedCell {
    /// Value used for ranking after imputation; `None` only when the column has no observations.
    pub value: Option<f64>,
    pub imputed: bool,
    pub normalized: f64,
}

/// Worst observed value: the minimum when higher is better, the maximum otherwise.
pub fn worst_observed(values: &[Option<f64>], direction: Direction) -> Option<f64> {
    let observed = values.iter().filter_map(|value| value.filter(|v| v.is_finite()));
    match direction {
        Direction::Higher => observed.min_by(f64::total_cmp),
        Direction::Lower => observed.max_by(f64::total_cmp),
    }
}

pub fn normalize_column(values: &[Option<f64>], direction: Direction) -> Vec<NormalizedCell> {
    let worst = worst_observed(values, direction);
    let imputed: Vec<(Option<f64>, bool)> = values
        .iter()
        .map(|value| match value.filter(|v| v.is_finite()) {
            Some(v) => (Some(v), false),
            None => (worst, true),
        })
        .collect();

    let Some(filled) = imputed
        .iter()
        .map(|(value, _)| *value)
        .collect::<Option<Vec<f64>>>()
    else {
        return imputed
            .into_iter()
            .map(|(value, imputed)| NormalizedCell {
                value,
                imputed,
                normalized: NEUTRAL,
            })
            .collect();
    };

    let percentiles = percentile_ranks(&filled, direction);
    imputed
        .into_iter()
        .zip(percentiles)
        .map(|((value, imputed), normalized)| NormalizedCell {
            value,
            imputed,
            normalized,
        })
        .collect()
}

/// Average-rank percentile of each value, oriented so better values score higher.
fn percentile_ranks(values: &[f64], direction: Direction) -> Vec<f64> {
    let n = values.len();
    if n <= 1 || values.iter().all(|v| *v == values[0]) {
        return vec![NEUTRAL; n];
    }

    // Ascending by goodness: worst first.
    let better = |a: f64, b: f64| -> Ordering {
        match direction {
            Direction::Higher => a.total_cmp(&b),
            Direction::Lower => b.total_cmp(&a),
        }
    };
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| better(values[*a], values[*b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start+1..=end share their mean rank.
        let average = (start + 1 + end) as f64 / 2.0;
        for index in &order[start..end] {
            ranks[*index] = average;
        }
        start = end;
    }

    let span = (n - 1) as f64;
    ranks
        .into_iter()
        .map(|rank| ((rank - 1.0) / span).clamp(0.0, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(values: &[Option<f64>], direction: Direction) -> Vec<f64> {
        normalize_column(values, direction)
            .into_iter()
            .map(|cell| cell.normalized)
            .collect()
    }

    #[test]
    fn higher_is_better_maps_extremes_to_one_and_zero() {
        let out = normalized(&[Some(0.25), Some(0.10)], Direction::Higher);
        assert_eq!(out, vec![1.0, 0.0]);
    }

    #[test]
    fn lower_is_better_rewards_the_minimum() {
        let out = normalized(&[Some(0.3), Some(1.2), Some(0.8)], Direction::Lower);
        assert_eq!(out, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn ties_share_the_average_rank() {
        let out = normalized(&[Some(1.0), Some(2.0), Some(2.0), Some(3.0)], Direction::Higher);
        // Ranks 1, 2.5, 2.5, 4 over a span of 3.
        assert_eq!(out, vec![0.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn tied_minima_of_lower_is_better_share_the_top_value() {
        let out = normalized(&[Some(0.3), Some(0.3), Some(1.2), Some(0.8)], Direction::Lower);
        // Goodness ranks 3.5, 3.5, 1, 2 over a span of 3.
        assert_eq!(out[0], out[1]);
        assert!((out[0] - 2.5 / 3.0).abs() < 1e-12);
        assert!(out.iter().all(|value| *value <= out[0]));
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn constant_column_is_neutral() {
        assert_eq!(
            normalized(&[Some(4.0), Some(4.0), Some(4.0)], Direction::Lower),
            vec![NEUTRAL; 3]
        );
        assert_eq!(normalized(&[Some(4.0)], Direction::Higher), vec![NEUTRAL]);
        assert_eq!(normalized(&[None, None], Direction::Higher), vec![NEUTRAL; 2]);
    }

    #[test]
    fn missing_values_take_the_worst_observed_value() {
        let cells = normalize_column(&[Some(0.2), None, Some(0.1), Some(0.4)], Direction::Higher);
        assert_eq!(cells[1].value, Some(0.1));
        assert!(cells[1].imputed);
        assert!(!cells[0].imputed);
        let lowest = cells
            .iter()
            .map(|cell| cell.normalized)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(cells[1].normalized, lowest);
        assert!(cells[1].normalized < cells[0].normalized);

        let lower = normalize_column(&[Some(0.5), None, Some(2.0)], Direction::Lower);
        assert_eq!(lower[1].value, Some(2.0));
        assert_eq!(lower[0].normalized, 1.0);
    }

    #[test]
    fn normalized_values_stay_in_unit_interval() {
        let values: Vec<Option<f64>> = (0..25)
            .map(|i| if i % 4 == 0 { None } else { Some(((i * 37) % 11) as f64 - 5.0) })
            .collect();
        for direction in [Direction::Higher, Direction::Lower] {
            for value in normalized(&values, direction) {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
