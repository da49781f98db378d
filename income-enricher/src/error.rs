use chrono::NaiveDateTime;
use income_classifier::ClassificationError;
use income_registry::RegistryError;
use thiserror::Error;

/// Malformed or stale request. Never retried, never answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("missing aktørId")]
    MissingPersonId,

    #[error("missing regelkontekst (kontekstId and kontekstType are both required)")]
    MissingKontekst,

    #[error("missing beregningsDato")]
    MissingBeregningsdato,

    #[error("packet is too old: started at {started}")]
    Stale { started: NaiveDateTime },
}

/// Anything that stops a packet from being answered
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// Only raised on the by-id path; by-context failures become a problem on the packet.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("malformed packet: {0}")]
    Packet(#[from] serde_json::Error),
}
