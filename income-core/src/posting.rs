//! Specified income from the registry: raw postings and deviations, before classification.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::month::YearMonth;

/// Posting-type code as delivered by the registry, e.g. `L_FASTLØNN`.
///
/// Kept open on the wire: a code we do not know must reach the classifier
/// and fail there, not disappear during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingType(String);

impl PostingType {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostingType {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Actor reference (person or organisation) on registry records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub identifikator: String,
    #[serde(rename = "aktørType")]
    pub actor_type: String,
}

/// One income line from the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    #[serde(rename = "posteringsMåned")]
    pub month: YearMonth,
    #[serde(rename = "beløp")]
    pub amount: Decimal,
    #[serde(rename = "posteringsType")]
    pub posting_type: PostingType,

    // Descriptive fields, carried but not used by classification
    #[serde(default)]
    pub fordel: Option<String>,
    #[serde(default)]
    pub inntektskilde: Option<String>,
    #[serde(default)]
    pub inntektsstatus: Option<String>,
    #[serde(default)]
    pub inntektsperiodetype: Option<String>,
    #[serde(rename = "utbetaltIMåned", default)]
    pub paid_in_month: Option<YearMonth>,
    #[serde(default)]
    pub leveringstidspunkt: Option<String>,
    #[serde(default)]
    pub opptjeningsland: Option<String>,
    #[serde(rename = "skattemessigBosattLand", default)]
    pub tax_residence_country: Option<String>,
    #[serde(default)]
    pub informasjonsstatus: Option<String>,
    #[serde(default)]
    pub beskrivelse: Option<String>,
    #[serde(default)]
    pub opplysningspliktig: Option<Actor>,
    #[serde(default)]
    pub virksomhet: Option<Actor>,
}

impl Posting {
    pub fn new(month: YearMonth, amount: Decimal, posting_type: impl Into<PostingType>) -> Self {
        Self {
            month,
            amount,
            posting_type: posting_type.into(),
            fordel: None,
            inntektskilde: None,
            inntektsstatus: None,
            inntektsperiodetype: None,
            paid_in_month: None,
            leveringstidspunkt: None,
            opptjeningsland: None,
            tax_residence_country: None,
            informasjonsstatus: None,
            beskrivelse: None,
            opplysningspliktig: None,
            virksomhet: None,
        }
    }
}

/// Known data-quality issue for a month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deviation {
    #[serde(rename = "avvikPeriode")]
    pub period: YearMonth,
    #[serde(default)]
    pub tekst: Option<String>,
    #[serde(default)]
    pub ident: Option<Actor>,
    #[serde(default)]
    pub opplysningspliktig: Option<Actor>,
    #[serde(default)]
    pub virksomhet: Option<Actor>,
}

impl Deviation {
    pub fn new(period: YearMonth, tekst: impl Into<String>) -> Self {
        Self {
            period,
            tekst: Some(tekst.into()),
            ident: None,
            opplysningspliktig: None,
            virksomhet: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeId {
    pub id: String,
}

/// Specified (unclassified) income as returned by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIncome {
    #[serde(rename = "inntektId")]
    pub income_id: IncomeId,
    #[serde(rename = "posteringer", default)]
    pub postings: Vec<Posting>,
    #[serde(rename = "avvik", default)]
    pub deviations: Vec<Deviation>,
    #[serde(rename = "manueltRedigert", default)]
    pub manually_edited: Option<bool>,
    #[serde(rename = "sisteAvsluttendeKalenderMåned")]
    pub last_closed_month: YearMonth,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub ident: Option<Actor>,
}
