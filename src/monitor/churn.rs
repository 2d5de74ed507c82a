use crate::types::config::ChurnConfig;
use crate::types::monitor::{ChurnAction, ChurnDecision, RankMove};
use crate::types::snapshot::Snapshot;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChurnReport {
    /// No previous snapshot: the current tickers are informational only.
    FirstCycle { tickers: Vec<String> },
    Compared {
        additions: Vec<ChurnDecision>,
        removals: Vec<ChurnDecision>,
        retained: Vec<ChurnDecision>,
        movers: Vec<RankMove>,
    },
}

impl ChurnReport {
    /// Every ADD, REMOVE and KEEP decision; empty for a first cycle.
    pub fn decisions(&self) -> impl Iterator<Item = &ChurnDecision> {
        let groups: [&[ChurnDecision]; 3] = match self {
            Self::FirstCycle { .. } => [&[], &[], &[]],
            Self::Compared {
                additions,
                removals,
                retained,
                ..
            } => [additions.as_slice(), removals.as_slice(), retained.as_slice()],
        };
        groups.into_iter().flatten()
    }
}

/// Diffs two snapshots by ticker set. Ranks are positional.
pub fn diff(previous: Option<&Snapshot>, current: &Snapshot, config: &ChurnConfig) -> ChurnReport {
    let Some(previous) = previous else {
        return ChurnReport::FirstCycle {
            tickers: current.rows().iter().map(|row| row.ticker().to_string()).collect(),
        };
    };

    let mut additions = Vec::new();
    let mut retained = Vec::new();
    let mut movers = Vec::new();

    for row in current.rows() {
        let ticker = row.ticker().to_string();
        match previous.position_of(&ticker) {
            None => additions.push(decision(
                ticker,
                ChurnAction::Add,
                row.position,
                format!("Entered ranking at rank {}", row.position),
            )),
            Some(previous_rank) => {
                let rank_delta = previous_rank as i64 - row.position as i64;
                if rank_delta.unsigned_abs() >= config.mover_threshold as u64 {
                    movers.push(RankMove {
                        ticker: ticker.clone(),
                        previous_rank,
                        current_rank: row.position,
                        rank_delta,
                    });
                }
                retained.push(decision(
                    ticker,
                    ChurnAction::Keep,
                    row.position,
                    format!(
                        "Retained at rank {} (previous rank {previous_rank})",
                        row.position
                    ),
                ));
            }
        }
    }

    let removals = previous
        .rows()
        .iter()
        .filter(|row| current.get(row.ticker()).is_none())
        .map(|row| {
            decision(
                row.ticker().to_string(),
                ChurnAction::Remove,
                row.position,
                format!("Exited ranking (previous rank {})", row.position),
            )
        })
        .collect();

    movers.sort_by(|a, b| {
        b.rank_delta
            .cmp(&a.rank_delta)
            .then_with(|| a.current_rank.cmp(&b.current_rank))
    });

    ChurnReport::Compared {
        additions,
        removals,
        retained,
        movers,
    }
}

fn decision(ticker: String, action: ChurnAction, rank: usize, reason: String) -> ChurnDecision {
    ChurnDecision {
        ticker,
        action,
        reason,
        rank,
        alerts: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::snapshot::fixtures::{date, snapshot};
    use std::collections::BTreeSet;

    fn tickers(decisions: &[ChurnDecision]) -> BTreeSet<&str> {
        decisions.iter().map(|d| d.ticker.as_str()).collect()
    }

    type Groups<'a> = (
        &'a [ChurnDecision],
        &'a [ChurnDecision],
        &'a [ChurnDecision],
        &'a [RankMove],
    );

    fn compared(report: &ChurnReport) -> Groups<'_> {
        match report {
            ChurnReport::Compared {
                additions,
                removals,
                retained,
                movers,
            } => (
                additions.as_slice(),
                removals.as_slice(),
                retained.as_slice(),
                movers.as_slice(),
            ),
            ChurnReport::FirstCycle { .. } => panic!("expected a compared report"),
        }
    }

    #[test]
    fn set_difference_classifies_additions_and_removals() {
        let previous = snapshot(date(2026, 1, 1), &["A", "B", "C"]);
        let current = snapshot(date(2026, 2, 1), &["A", "C", "D"]);
        let report = diff(Some(&previous), &current, &ChurnConfig::default());
        let (additions, removals, retained, _) = compared(&report);

        assert_eq!(tickers(additions), BTreeSet::from(["D"]));
        assert_eq!(tickers(removals), BTreeSet::from(["B"]));
        assert_eq!(tickers(retained), BTreeSet::from(["A", "C"]));
        assert_eq!(additions[0].action, ChurnAction::Add);
        assert_eq!(additions[0].reason, "Entered ranking at rank 3");
        assert_eq!(removals[0].reason, "Exited ranking (previous rank 2)");
        assert_eq!(retained[1].reason, "Retained at rank 2 (previous rank 3)");
    }

    #[test]
    fn classification_partitions_the_ticker_union() {
        let previous = snapshot(date(2026, 1, 1), &["A", "B", "C", "E"]);
        let current = snapshot(date(2026, 2, 1), &["E", "F", "A", "G"]);
        let report = diff(Some(&previous), &current, &ChurnConfig::default());
        let (additions, removals, retained, _) = compared(&report);

        let adds = tickers(additions);
        let removes = tickers(removals);
        assert!(adds.is_disjoint(&removes));

        let union: BTreeSet<&str> = adds
            .iter()
            .chain(removes.iter())
            .chain(tickers(retained).iter())
            .copied()
            .collect();
        let expected: BTreeSet<&str> = previous.tickers().union(&current.tickers()).copied().collect();
        assert_eq!(union, expected);
        assert_eq!(report.decisions().count(), expected.len());
    }

    #[test]
    fn movers_respect_threshold_and_ordering() {
        let previous = snapshot(date(2026, 1, 1), &["A", "B", "C", "D", "E", "F", "G", "H"]);
        let current = snapshot(date(2026, 2, 1), &["F", "H", "C", "D", "A", "B", "E", "G"]);
        let report = diff(Some(&previous), &current, &ChurnConfig::default());
        let (_, _, _, movers) = compared(&report);

        let view: Vec<(&str, i64)> = movers
            .iter()
            .map(|m| (m.ticker.as_str(), m.rank_delta))
            .collect();
        // H climbs 6, F climbs 5, A and B fall 4, E and G fall 2 and 1 (below threshold).
        assert_eq!(view, vec![("H", 6), ("F", 5), ("A", -4), ("B", -4)]);
    }

    #[test]
    fn equal_deltas_break_ties_by_current_rank() {
        let previous = snapshot(date(2026, 1, 1), &["A", "B", "C", "D", "E", "F"]);
        let current = snapshot(date(2026, 2, 1), &["D", "E", "F", "A", "B", "C"]);
        let report = diff(Some(&previous), &current, &ChurnConfig::default());
        let (_, _, _, movers) = compared(&report);
        let order: Vec<&str> = movers.iter().map(|m| m.ticker.as_str()).collect();
        assert_eq!(order, vec!["D", "E", "F", "A", "B", "C"]);
    }

    #[test]
    fn first_cycle_is_informational() {
        let current = snapshot(date(2026, 2, 1), &["B", "A"]);
        let report = diff(None, &current, &ChurnConfig::default());
        assert_eq!(
            report,
            ChurnReport::FirstCycle {
                tickers: vec!["B".to_string(), "A".to_string()]
            }
        );
        assert_eq!(report.decisions().count(), 0);
    }
}
