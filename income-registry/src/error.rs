use income_core::Problem;
use thiserror::Error;

pub const REGISTRY_PROBLEM_TYPE: &str = "urn:dp:error:inntektskomponenten";
pub const REGISTRY_PROBLEM_TITLE: &str = "Klarte ikke å hente inntekt";

/// Failure talking to the income registry, with the problem to report downstream.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RegistryError {
    pub message: String,
    pub problem: Problem,
    #[source]
    pub source: Option<reqwest::Error>,
}

impl RegistryError {
    pub fn new(message: impl Into<String>, problem: Problem) -> Self {
        Self {
            message: message.into(),
            problem,
            source: None,
        }
    }

    /// Connection, timeout or decoding failure: no problem body to relay.
    pub fn transport(context: &str, err: reqwest::Error) -> Self {
        Self {
            message: format!("Failed to fetch income ({context}): {err}"),
            problem: fallback_problem().with_detail(err.to_string()),
            source: Some(err),
        }
    }
}

/// Problem used when the registry gives us nothing better
pub fn fallback_problem() -> Problem {
    Problem::new(REGISTRY_PROBLEM_TYPE, REGISTRY_PROBLEM_TITLE)
}
