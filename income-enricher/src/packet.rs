//! Typed view of the behov packets on the shared channel.
//!
//! The inbound object is kept as received and written back with only the
//! answer keys (`inntektV1` or `system_problem`) added. Known keys are parsed
//! once for routing; a null known key reads as absent but stays on the wire.

use chrono::{NaiveDate, NaiveDateTime};
use income_core::{ClassifiedIncome, Problem, RegelKontekst};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub const BEHOV_ID: &str = "behovId";
pub const INNTEKT: &str = "inntektV1";
pub const MANUELT_GRUNNLAG: &str = "manueltGrunnlag";
pub const FORRIGE_GRUNNLAG: &str = "forrigeGrunnlag";
pub const PROBLEM: &str = "system_problem";

/// Keys that mark a packet as already answered or handled elsewhere
const REJECTED_KEYS: [&str; 4] = [INNTEKT, MANUELT_GRUNNLAG, FORRIGE_GRUNNLAG, PROBLEM];

/// Whether a record on the channel is a request this service should answer.
pub fn accepts(record: &Value) -> bool {
    let Some(obj) = record.as_object() else {
        return false;
    };
    let has_behov_id = obj.get(BEHOV_ID).is_some_and(|v| !v.is_null());
    has_behov_id && REJECTED_KEYS.iter().all(|k| !obj.contains_key(*k))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct KnownFields {
    #[serde(rename = "behovId", default, deserialize_with = "lenient_string")]
    behov_id: Option<String>,
    #[serde(rename = "aktørId", default, deserialize_with = "lenient_string")]
    person_id: Option<String>,
    #[serde(rename = "fødselsnummer", default, deserialize_with = "lenient_string")]
    national_id: Option<String>,
    #[serde(rename = "kontekstId", default, deserialize_with = "lenient_string")]
    kontekst_id: Option<String>,
    #[serde(rename = "kontekstType", default, deserialize_with = "lenient_string")]
    kontekst_type: Option<String>,
    #[serde(rename = "beregningsDato", default)]
    calculation_date: Option<NaiveDate>,
    #[serde(rename = "inntektsId", default, deserialize_with = "lenient_string")]
    income_id: Option<String>,
    #[serde(rename = "system_started", default, deserialize_with = "lenient_string")]
    system_started: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehovPacket {
    record: Map<String, Value>,
    known: KnownFields,
    income: Option<ClassifiedIncome>,
    problem: Option<Problem>,
}

impl BehovPacket {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(record) = value else {
            return Err(serde::de::Error::custom("behov packet must be a JSON object"));
        };
        let known = KnownFields::deserialize(&Value::Object(record.clone()))?;
        Ok(Self {
            record,
            known,
            income: None,
            problem: None,
        })
    }

    /// Inbound record with the answer added.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut out = self.record.clone();
        if let Some(income) = &self.income {
            out.insert(INNTEKT.to_string(), serde_json::to_value(income)?);
        }
        if let Some(problem) = &self.problem {
            out.insert(PROBLEM.to_string(), serde_json::to_value(problem)?);
        }
        Ok(Value::Object(out))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_value()?)
    }

    /// Inbound value of any key, as received
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    pub fn behov_id(&self) -> Option<&str> {
        self.known.behov_id.as_deref()
    }

    pub fn person_id(&self) -> Option<&str> {
        self.known.person_id.as_deref()
    }

    pub fn national_id(&self) -> Option<&str> {
        self.known.national_id.as_deref()
    }

    pub fn kontekst_id(&self) -> Option<&str> {
        self.known.kontekst_id.as_deref()
    }

    pub fn kontekst_type(&self) -> Option<&str> {
        self.known.kontekst_type.as_deref()
    }

    pub fn calculation_date(&self) -> Option<NaiveDate> {
        self.known.calculation_date
    }

    pub fn income_id(&self) -> Option<&str> {
        self.known.income_id.as_deref()
    }

    pub fn regelkontekst(&self) -> Option<RegelKontekst> {
        RegelKontekst::from_parts(self.known.kontekst_id.clone(), self.known.kontekst_type.clone())
    }

    /// `system_started` as a local timestamp; unparseable values count as absent.
    pub fn started(&self) -> Option<NaiveDateTime> {
        let raw = self.known.system_started.as_deref()?;
        raw.parse::<NaiveDateTime>().ok()
    }

    /// Correlation id for logs and registry calls
    pub fn call_id(&self) -> String {
        self.known
            .behov_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    #[cfg(test)]
    pub fn income(&self) -> Option<&ClassifiedIncome> {
        self.income.as_ref()
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn solved(mut self, income: ClassifiedIncome) -> Self {
        self.income = Some(income);
        self
    }

    pub fn failed(mut self, problem: Problem) -> Self {
        self.problem = Some(problem);
        self
    }
}

/// Accept strings, numbers and booleans as text, the way upstream producers mix them.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar, got {other}"
            )));
        }
    })
}
