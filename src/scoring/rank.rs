use crate::types::snapshot::{RankedRow, ScoredCompany};

/// Orders companies by composite score (descending, ticker ascending on ties)
/// and assigns positions plus dense ranks.
pub fn rank(mut companies: Vec<ScoredCompany>) -> Vec<RankedRow> {
    companies.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    let mut rows = Vec::with_capacity(companies.len());
    let mut dense = 0usize;
    let mut previous: Option<f64> = None;
    for (offset, company) in companies.into_iter().enumerate() {
        if previous != Some(company.final_score) {
            dense += 1;
            previous = Some(company.final_score);
        }
        rows.push(RankedRow {
            position: offset + 1,
            rank: dense,
            company,
        });
    }
    rows
}

/// Keeps the first `top_n` rows; `None` keeps everything.
pub fn truncate(mut rows: Vec<RankedRow>, top_n: Option<usize>) -> Vec<RankedRow> {
    if let Some(limit) = top_n {
        rows.truncate(limit);
    }
    rows
}
