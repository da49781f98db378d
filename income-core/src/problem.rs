//! RFC 7807 style problem record attached to a packet when income could not be fetched.

use serde::{Deserialize, Serialize};

pub const ABOUT_BLANK: &str = "about:blank";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type", default = "about_blank")]
    pub kind: String,
    pub title: String,
    #[serde(default = "default_status")]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default = "about_blank")]
    pub instance: String,
}

fn about_blank() -> String {
    ABOUT_BLANK.to_string()
}

fn default_status() -> Option<u16> {
    Some(500)
}

impl Problem {
    pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            status: default_status(),
            detail: None,
            instance: about_blank(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let p: Problem = serde_json::from_str(r#"{ "title": "Klarte ikke å hente inntekt" }"#).unwrap();
        assert_eq!(p.kind, ABOUT_BLANK);
        assert_eq!(p.instance, ABOUT_BLANK);
        assert_eq!(p.status, Some(500));
        assert_eq!(p.detail, None);
    }

    #[test]
    fn test_serializes_all_keys() {
        let p = Problem::new("urn:dp:error:inntektskomponenten", "title").with_status(503);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "urn:dp:error:inntektskomponenten");
        assert_eq!(v["status"], 503);
        assert_eq!(v["instance"], ABOUT_BLANK);
        assert!(v.get("detail").is_some_and(|d| d.is_null()));
    }
}
