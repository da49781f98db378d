//! reqwest-backed registry client.
//!
//! Endpoints (relative to the configured base URL):
//!   POST v2/inntekt/spesifisert           -> RawIncome
//!   POST v2/inntekt/klassifisert          -> ClassifiedIncome
//!   GET  v2/inntekt/klassifisert/{id}     -> ClassifiedIncome

use async_trait::async_trait;
use income_core::{ClassifiedIncome, Problem, RawIncome};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{fallback_problem, RegistryError};
use crate::registry::{ContextRequest, IncomeRegistry};

pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

#[derive(Debug, Clone)]
pub struct HttpIncomeRegistry {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpIncomeRegistry {
    /// `timeout` bounds both connecting and the whole request.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(base_url, token, client))
    }

    pub fn with_client(base_url: impl Into<String>, token: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            token: token.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder, call_id: &str) -> RequestBuilder {
        req.header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
            .header(CORRELATION_HEADER, call_id)
    }

    async fn post_context<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &ContextRequest,
        call_id: &str,
    ) -> Result<T, RegistryError> {
        let url = self.url(path);
        tracing::debug!(%url, kontekst_id = %request.regelkontekst.id, "fetching income by context");
        let resp = self
            .authorized(self.client.post(&url), call_id)
            .json(request)
            .send()
            .await
            .map_err(|e| RegistryError::transport("request", e))?;
        read_json(resp).await
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, RegistryError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<T>()
            .await
            .map_err(|e| RegistryError::transport("parse response", e));
    }

    let body = resp.text().await.unwrap_or_default();
    let problem = serde_json::from_str::<Problem>(&body).unwrap_or_else(|_| fallback_problem());
    Err(RegistryError::new(
        format!(
            "Failed to fetch income. Problem: {}. Response code: {}, message: {}",
            problem.title, status, body
        ),
        problem,
    ))
}

#[async_trait]
impl IncomeRegistry for HttpIncomeRegistry {
    async fn fetch_classified_by_id(
        &self,
        income_id: &str,
        call_id: &str,
    ) -> Result<ClassifiedIncome, RegistryError> {
        let url = self.url(&format!("v2/inntekt/klassifisert/{income_id}"));
        tracing::debug!(%url, "fetching classified income by id");
        let resp = self
            .authorized(self.client.get(&url), call_id)
            .send()
            .await
            .map_err(|e| RegistryError::transport("request", e))?;
        read_json(resp).await
    }

    async fn fetch_raw_by_context(
        &self,
        request: &ContextRequest,
        call_id: &str,
    ) -> Result<RawIncome, RegistryError> {
        self.post_context("v2/inntekt/spesifisert", request, call_id).await
    }

    async fn fetch_classified_by_context(
        &self,
        request: &ContextRequest,
        call_id: &str,
    ) -> Result<ClassifiedIncome, RegistryError> {
        self.post_context("v2/inntekt/klassifisert", request, call_id).await
    }
}
