use serde::{Deserialize, Serialize};

/// Identifies which calculation case a request belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegelKontekst {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RegelKontekst {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }

    /// Both parts must be present for a usable context
    pub fn from_parts(id: Option<String>, kind: Option<String>) -> Option<Self> {
        match (id, kind) {
            (Some(id), Some(kind)) => Some(Self { id, kind }),
            _ => None,
        }
    }
}
