pub mod normalize;
pub mod rank;

use crate::metrics::MetricSet;
use crate::types::config::ScoringConfig;
use crate::types::snapshot::{Contribution, ScoredCompany};
use normalize::normalize_column;
use std::collections::BTreeMap;

/// Weighted composite score over the configured metric table.
///
/// Needs the whole cycle at once: every weighted metric is normalized across
/// all companies, with undefined values imputed rather than skipped. Metrics
/// outside the weight table are carried in the output but never scored.
pub fn score(companies: Vec<(String, MetricSet)>, config: &ScoringConfig) -> Vec<ScoredCompany> {
    let mut totals = vec![0.0; companies.len()];
    let mut contributions: Vec<BTreeMap<_, _>> = vec![BTreeMap::new(); companies.len()];

    for (metric, weight) in &config.weights {
        let column: Vec<Option<f64>> = companies
            .iter()
            .map(|(_, metrics)| metrics.get(*metric))
            .collect();
        let cells = normalize_column(&column, config.direction(*metric));

        for (index, cell) in cells.into_iter().enumerate() {
            let weighted = weight * cell.normalized;
            totals[index] += weighted;
            contributions[index].insert(
                *metric,
                Contribution {
                    raw: column[index],
                    imputed: cell.imputed,
                    normalized: cell.normalized,
                    weighted,
                },
            );
        }
    }

    companies
        .into_iter()
        .zip(totals)
        .zip(contributions)
        .map(|(((ticker, metrics), final_score), contributions)| ScoredCompany {
            ticker,
            metrics,
            final_score,
            contributions,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Direction, Metric};

    fn metrics(values: &[(Metric, Option<f64>)]) -> MetricSet {
        values.iter().copied().collect()
    }

    fn scenario_config() -> ScoringConfig {
        ScoringConfig {
            weights: BTreeMap::from([(Metric::Roe, 0.6), (Metric::DebtToEquity, 0.4)]),
            directions: BTreeMap::from([
                (Metric::Roe, Direction::Higher),
                (Metric::DebtToEquity, Direction::Lower),
            ]),
        }
    }

    #[test]
    fn two_company_scenario_scores_one_and_zero() {
        let scored = score(
            vec![
                (
                    "X".to_string(),
                    metrics(&[(Metric::DebtToEquity, Some(0.3)), (Metric::Roe, Some(0.25))]),
                ),
                (
                    "Y".to_string(),
                    metrics(&[(Metric::DebtToEquity, Some(1.2)), (Metric::Roe, Some(0.10))]),
                ),
            ],
            &scenario_config(),
        );
        assert!((scored[0].final_score - 1.0).abs() < 1e-12);
        assert!(scored[1].final_score.abs() < 1e-12);
        assert_eq!(scored[0].contributions.len(), 2);
    }

    #[test]
    fn tied_lowest_leverage_earns_the_largest_contribution() {
        let scored = score(
            ["P", "Q", "R", "S"]
                .iter()
                .zip([0.3, 0.3, 1.2, 0.8])
                .map(|(ticker, leverage)| {
                    (
                        ticker.to_string(),
                        metrics(&[(Metric::DebtToEquity, Some(leverage))]),
                    )
                })
                .collect(),
            &ScoringConfig {
                weights: BTreeMap::from([(Metric::DebtToEquity, 1.0)]),
                directions: BTreeMap::from([(Metric::DebtToEquity, Direction::Lower)]),
            },
        );
        let weighted: Vec<f64> = scored
            .iter()
            .map(|company| company.contributions[&Metric::DebtToEquity].weighted)
            .collect();
        assert_eq!(weighted[0], weighted[1]);
        assert!(weighted.iter().all(|value| *value <= weighted[0]));
        assert!(weighted[3] < weighted[0]);
    }

    #[test]
    fn unweighted_metrics_do_not_contribute() {
        let scored = score(
            vec![
                (
                    "X".to_string(),
                    metrics(&[(Metric::Roe, Some(0.2)), (Metric::PeRatio, Some(5.0))]),
                ),
                (
                    "Y".to_string(),
                    metrics(&[(Metric::Roe, Some(0.2)), (Metric::PeRatio, Some(50.0))]),
                ),
            ],
            &ScoringConfig {
                weights: BTreeMap::from([(Metric::Roe, 1.0)]),
                directions: BTreeMap::new(),
            },
        );
        assert_eq!(scored[0].final_score, scored[1].final_score);
        assert!(!scored[0].contributions.contains_key(&Metric::PeRatio));
        assert_eq!(scored[0].metrics.get(Metric::PeRatio), Some(5.0));
    }

    #[test]
    fn weighted_metric_missing_everywhere_is_imputed_neutral() {
        let scored = score(
            vec![
                ("X".to_string(), metrics(&[(Metric::Roe, Some(0.3))])),
                ("Y".to_string(), metrics(&[(Metric::Roe, Some(0.1))])),
            ],
            &ScoringConfig {
                weights: BTreeMap::from([(Metric::Roe, 1.0), (Metric::Roce, 2.0)]),
                directions: BTreeMap::new(),
            },
        );
        let roce = scored[1].contributions[&Metric::Roce];
        assert!(roce.imputed);
        assert_eq!(roce.normalized, 0.5);
        assert!((scored[0].final_score - 2.0).abs() < 1e-12);
        assert!((scored[1].final_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn score_is_monotonic_in_a_single_contribution() {
        let config = ScoringConfig {
            weights: BTreeMap::from([(Metric::Roe, 1.0), (Metric::Roce, 1.0)]),
            directions: BTreeMap::new(),
        };
        let base = vec![
            ("A".to_string(), metrics(&[(Metric::Roe, Some(0.1)), (Metric::Roce, Some(0.2))])),
            ("B".to_string(), metrics(&[(Metric::Roe, Some(0.2)), (Metric::Roce, Some(0.2))])),
            ("C".to_string(), metrics(&[(Metric::Roe, Some(0.3)), (Metric::Roce, Some(0.1))])),
        ];
        let before = score(base.clone(), &config);

        let mut improved = base;
        improved[0].1.insert(Metric::Roe, Some(0.25));
        let after = score(improved, &config);

        assert!(after[0].final_score >= before[0].final_score);
    }

    #[test]
    fn empty_input_scores_nothing() {
        assert!(score(Vec::new(), &ScoringConfig::default()).is_empty());
    }
}
