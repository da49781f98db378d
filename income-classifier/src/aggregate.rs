//! Monthly aggregation: classified postings grouped by month, then by class,
//! with a deviation flag per month.

use income_core::{ClassifiedAmount, Deviation, IncomeClass, MonthlyIncome, Posting, YearMonth};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

use crate::posting_rules::{classify, ClassificationError};

/// A posting paired with its class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPosting<'a> {
    pub posting: &'a Posting,
    pub class: IncomeClass,
}

/// Classify every posting, stopping at the first unknown posting type.
pub fn classify_postings(postings: &[Posting]) -> Result<Vec<ClassifiedPosting<'_>>, ClassificationError> {
    postings
        .iter()
        .map(|posting| {
            classify(&posting.posting_type).map(|class| ClassifiedPosting { posting, class })
        })
        .collect()
}

/// Aggregate postings into one entry per month that has postings.
///
/// Classification runs over the whole list before any grouping, so an
/// unknown posting type never yields a partial result. Months that only
/// appear in `deviations` are not emitted.
///
/// Output is ascending by month with classes in `IncomeClass` order; callers
/// should not rely on that.
pub fn aggregate(
    postings: &[Posting],
    deviations: &[Deviation],
) -> Result<Vec<MonthlyIncome>, ClassificationError> {
    let classified = classify_postings(postings)?;

    let deviation_months: HashSet<YearMonth> = deviations.iter().map(|d| d.period).collect();

    let mut by_month: BTreeMap<YearMonth, BTreeMap<IncomeClass, Decimal>> = BTreeMap::new();
    for cp in &classified {
        let sum = by_month
            .entry(cp.posting.month)
            .or_default()
            .entry(cp.class)
            .or_insert(Decimal::ZERO);
        *sum += cp.posting.amount;
    }

    let months: Vec<MonthlyIncome> = by_month
        .into_iter()
        .map(|(month, sums)| MonthlyIncome {
            month,
            amounts: sums
                .into_iter()
                .map(|(class, amount)| ClassifiedAmount { amount, class })
                .collect(),
            has_deviation: deviation_months.contains(&month),
        })
        .collect();

    tracing::debug!(
        postings = postings.len(),
        deviations = deviations.len(),
        months = months.len(),
        "aggregated postings"
    );

    Ok(months)
}
