//! Classified income record types, as published in `inntektV1`

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::month::YearMonth;

/// Coarse income categories that posting types are classified into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncomeClass {
    #[serde(rename = "ARBEIDSINNTEKT")]
    EmploymentIncome,
    #[serde(rename = "FANGST_FISKE")]
    CatchFishing,
    #[serde(rename = "DAGPENGER")]
    UnemploymentBenefit,
    #[serde(rename = "DAGPENGER_FANGST_FISKE")]
    UnemploymentBenefitCatchFishing,
    #[serde(rename = "SYKEPENGER")]
    SickPay,
    #[serde(rename = "SYKEPENGER_FANGST_FISKE")]
    SickPayCatchFishing,
    #[serde(rename = "TILTAKSLØNN")]
    LabourMarketMeasurePay,
}

impl IncomeClass {
    pub const ALL: [IncomeClass; 7] = [
        IncomeClass::EmploymentIncome,
        IncomeClass::CatchFishing,
        IncomeClass::UnemploymentBenefit,
        IncomeClass::UnemploymentBenefitCatchFishing,
        IncomeClass::SickPay,
        IncomeClass::SickPayCatchFishing,
        IncomeClass::LabourMarketMeasurePay,
    ];

    /// Name used on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            IncomeClass::EmploymentIncome => "ARBEIDSINNTEKT",
            IncomeClass::CatchFishing => "FANGST_FISKE",
            IncomeClass::UnemploymentBenefit => "DAGPENGER",
            IncomeClass::UnemploymentBenefitCatchFishing => "DAGPENGER_FANGST_FISKE",
            IncomeClass::SickPay => "SYKEPENGER",
            IncomeClass::SickPayCatchFishing => "SYKEPENGER_FANGST_FISKE",
            IncomeClass::LabourMarketMeasurePay => "TILTAKSLØNN",
        }
    }
}

/// Summed amount for one income class within a month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedAmount {
    #[serde(rename = "beløp")]
    pub amount: Decimal,
    #[serde(rename = "inntektKlasse")]
    pub class: IncomeClass,
}

/// All classified amounts for one calendar month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyIncome {
    #[serde(rename = "årMåned")]
    pub month: YearMonth,
    #[serde(rename = "klassifiserteInntekter")]
    pub amounts: Vec<ClassifiedAmount>,
    /// Absent or null upstream means no deviation.
    #[serde(rename = "harAvvik", default, deserialize_with = "null_as_false")]
    pub has_deviation: bool,
}

impl MonthlyIncome {
    /// Sum of all classes in this month
    pub fn total(&self) -> Decimal {
        self.amounts.iter().fold(Decimal::ZERO, |sum, a| sum + a.amount)
    }

    pub fn amount_for(&self, class: IncomeClass) -> Option<Decimal> {
        self.amounts.iter().find(|a| a.class == class).map(|a| a.amount)
    }
}

/// Classified income for one person, ready to publish
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedIncome {
    #[serde(rename = "inntektsId")]
    pub income_id: String,
    #[serde(rename = "inntektsListe")]
    pub monthly_incomes: Vec<MonthlyIncome>,
    #[serde(rename = "manueltRedigert", default, deserialize_with = "null_as_false")]
    pub manually_edited: bool,
    #[serde(rename = "sisteAvsluttendeKalenderMåned")]
    pub last_closed_month: YearMonth,
}

impl ClassifiedIncome {
    /// Sum over every month and class
    pub fn total(&self) -> Decimal {
        self.monthly_incomes
            .iter()
            .fold(Decimal::ZERO, |sum, m| sum + m.total())
    }
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
