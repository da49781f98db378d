//! Assemble the published income record from aggregated months.

use income_core::{ClassifiedIncome, MonthlyIncome, RawIncome, YearMonth};

use crate::aggregate::aggregate;
use crate::posting_rules::ClassificationError;

/// Build the classified income record. A missing manual-edit flag means `false`.
pub fn assemble(
    income_id: impl Into<String>,
    monthly_incomes: Vec<MonthlyIncome>,
    manually_edited: Option<bool>,
    last_closed_month: YearMonth,
) -> ClassifiedIncome {
    ClassifiedIncome {
        income_id: income_id.into(),
        monthly_incomes,
        manually_edited: manually_edited.unwrap_or(false),
        last_closed_month,
    }
}

/// Classify and aggregate a registry payload into the published record.
pub fn classify_raw_income(raw: &RawIncome) -> Result<ClassifiedIncome, ClassificationError> {
    let months = aggregate(&raw.postings, &raw.deviations)?;
    Ok(assemble(
        raw.income_id.id.clone(),
        months,
        raw.manually_edited,
        raw.last_closed_month,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use income_core::{ClassifiedAmount, IncomeClass};
    use rust_decimal_macros::dec;

    fn months() -> Vec<MonthlyIncome> {
        vec![MonthlyIncome {
            month: YearMonth::new(2019, 3).unwrap(),
            amounts: vec![ClassifiedAmount {
                amount: dec!(10),
                class: IncomeClass::EmploymentIncome,
            }],
            has_deviation: false,
        }]
    }

    #[test]
    fn test_manual_edit_defaults_to_false() {
        let last = YearMonth::new(2019, 4).unwrap();
        assert!(!assemble("id", months(), None, last).manually_edited);
        assert!(assemble("id", months(), Some(true), last).manually_edited);
    }

    #[test]
    fn test_assembly_is_repeatable() {
        let last = YearMonth::new(2019, 4).unwrap();
        let a = assemble("01DMNAADXVEZXGJRQJTZ6DWWNV", months(), Some(false), last);
        let b = assemble("01DMNAADXVEZXGJRQJTZ6DWWNV", months(), Some(false), last);
        assert_eq!(a, b);
        assert_eq!(a.income_id, "01DMNAADXVEZXGJRQJTZ6DWWNV");
        assert_eq!(a.last_closed_month, last);
    }
}
