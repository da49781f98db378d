use async_trait::async_trait;
use chrono::NaiveDate;
use income_core::{ClassifiedIncome, RawIncome, RegelKontekst};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Body of the by-context lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRequest {
    #[serde(rename = "aktørId")]
    pub person_id: String,
    #[serde(rename = "fødselsnummer")]
    pub national_id: Option<String>,
    pub regelkontekst: RegelKontekst,
    #[serde(rename = "beregningsDato")]
    pub calculation_date: NaiveDate,
}

/// Operations the enricher needs from the income registry.
#[async_trait]
pub trait IncomeRegistry: Send + Sync {
    /// Income already classified and stored by the registry under `income_id`.
    async fn fetch_classified_by_id(
        &self,
        income_id: &str,
        call_id: &str,
    ) -> Result<ClassifiedIncome, RegistryError>;

    /// Unclassified postings and deviations for a person in a calculation context.
    async fn fetch_raw_by_context(
        &self,
        request: &ContextRequest,
        call_id: &str,
    ) -> Result<RawIncome, RegistryError>;

    /// Same lookup, classified by the registry instead of locally.
    async fn fetch_classified_by_context(
        &self,
        request: &ContextRequest,
        call_id: &str,
    ) -> Result<ClassifiedIncome, RegistryError>;
}
