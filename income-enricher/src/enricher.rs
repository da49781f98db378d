use chrono::{Local, NaiveDateTime, TimeDelta};
use income_classifier::classify_raw_income;
use income_core::ClassifiedIncome;
use income_registry::{ContextRequest, IncomeRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::Instrument;

use crate::error::{EnrichError, PreconditionError};
use crate::packet::BehovPacket;

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

/// How income is obtained when a packet carries no `inntektsId`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextStrategy {
    /// Fetch raw postings and classify them here.
    #[default]
    ClassifyLocally,
    /// Let the registry classify.
    RegistryClassified,
}

impl FromStr for ContextStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classify-locally" | "local" => Ok(Self::ClassifyLocally),
            "registry-classified" | "registry" => Ok(Self::RegistryClassified),
            other => Err(format!(
                "unknown context strategy '{other}' (expected classify-locally or registry-classified)"
            )),
        }
    }
}

pub struct Enricher<R> {
    registry: R,
    strategy: ContextStrategy,
    stale_after: Duration,
}

impl<R: IncomeRegistry> Enricher<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            strategy: ContextStrategy::default(),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn with_strategy(mut self, strategy: ContextStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    #[cfg(test)]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Answer one accepted packet: either `inntektV1` or `system_problem` is set on the result.
    pub async fn enrich(&self, packet: BehovPacket) -> Result<BehovPacket, EnrichError> {
        self.enrich_at(packet, Local::now().naive_local()).await
    }

    pub async fn enrich_at(
        &self,
        packet: BehovPacket,
        now: NaiveDateTime,
    ) -> Result<BehovPacket, EnrichError> {
        let call_id = packet.call_id();
        let span = tracing::info_span!(
            "enrich",
            %call_id,
            behov_id = packet.behov_id().unwrap_or(""),
            kontekst_type = packet.kontekst_type().unwrap_or(""),
            kontekst_id = packet.kontekst_id().unwrap_or(""),
        );
        self.answer(packet, &call_id, now).instrument(span).await
    }

    async fn answer(
        &self,
        packet: BehovPacket,
        call_id: &str,
        now: NaiveDateTime,
    ) -> Result<BehovPacket, EnrichError> {
        self.check_fresh(&packet, now)?;

        if let Some(income_id) = packet.income_id().map(str::to_string) {
            tracing::info!(%income_id, "fetching stored income");
            let income = self.registry.fetch_classified_by_id(&income_id, call_id).await?;
            return Ok(packet.solved(income));
        }

        let request = context_request(&packet)?;
        match self.fetch_by_context(&request, call_id).await {
            Ok(Ok(income)) => {
                tracing::info!(
                    income_id = %income.income_id,
                    months = income.monthly_incomes.len(),
                    "income classified"
                );
                Ok(packet.solved(income))
            }
            Ok(Err(registry_err)) => {
                tracing::warn!(error = %registry_err, "registry lookup failed, answering with problem");
                Ok(packet.failed(registry_err.problem))
            }
            Err(e) => Err(e),
        }
    }

    /// Outer error is fatal, inner error is reported on the packet.
    async fn fetch_by_context(
        &self,
        request: &ContextRequest,
        call_id: &str,
    ) -> Result<Result<ClassifiedIncome, RegistryError>, EnrichError> {
        match self.strategy {
            ContextStrategy::RegistryClassified => {
                Ok(self.registry.fetch_classified_by_context(request, call_id).await)
            }
            ContextStrategy::ClassifyLocally => {
                match self.registry.fetch_raw_by_context(request, call_id).await {
                    Ok(raw) => Ok(Ok(classify_raw_income(&raw)?)),
                    Err(e) => Ok(Err(e)),
                }
            }
        }
    }

    fn check_fresh(&self, packet: &BehovPacket, now: NaiveDateTime) -> Result<(), PreconditionError> {
        let Some(started) = packet.started() else {
            return Ok(());
        };
        let limit = TimeDelta::from_std(self.stale_after).unwrap_or(TimeDelta::MAX);
        if now - started > limit {
            return Err(PreconditionError::Stale { started });
        }
        Ok(())
    }
}

fn context_request(packet: &BehovPacket) -> Result<ContextRequest, PreconditionError> {
    let person_id = packet
        .person_id()
        .map(str::to_string)
        .ok_or(PreconditionError::MissingPersonId)?;
    let regelkontekst = packet.regelkontekst().ok_or(PreconditionError::MissingKontekst)?;
    let calculation_date = packet
        .calculation_date()
        .ok_or(PreconditionError::MissingBeregningsdato)?;

    Ok(ContextRequest {
        person_id,
        national_id: packet.national_id().map(str::to_string),
        regelkontekst,
        calculation_date,
    })
}
