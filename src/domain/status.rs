use chrono::NaiveDateTime;
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::status_codes::{self, Permanence, StatusCategory};
use crate::utils::de::{self, TEXT_KEY};

/// Status snapshot of a transaction as reported by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    code: u16,
    description: Option<String>,
    sub_code: Option<SubCode>,
    date: Option<NaiveDateTime>,
}

/// Secondary detail code, e.g. `S002` with its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCode {
    pub code: String,
    pub description: Option<String>,
}

impl Status {
    pub fn new(code: u16) -> Self {
        Self {
            code,
            description: None,
            sub_code: None,
            date: None,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// Gateway text for the code, falling back to the built-in table.
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| status_codes::describe(self.code))
    }

    pub fn sub_code(&self) -> Option<&SubCode> {
        self.sub_code.as_ref()
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn category(&self) -> StatusCategory {
        status_codes::classify(self.code)
    }

    pub fn permanence(&self) -> Option<Permanence> {
        status_codes::permanence(self.code)
    }
}

/// Splits `{"Code": "791", "$text": "..."}` or a bare scalar into code and text.
fn code_and_text(value: Value) -> Result<(Option<String>, Option<String>), String> {
    match value {
        Value::Object(mut map) => {
            let code = map.remove("Code").map(scalar).transpose()?.flatten();
            let text = map.remove(TEXT_KEY).map(scalar).transpose()?.flatten();
            Ok((code, text))
        }
        other => Ok((scalar(other)?, None)),
    }
}

fn scalar(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(format!("unexpected status value {}", other)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStatus {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    sub_code: Value,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    date_time: Option<NaiveDateTime>,
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawStatus::deserialize(deserializer)?;

        let (code, description) = code_and_text(raw.code).map_err(D::Error::custom)?;
        let code = code.ok_or_else(|| D::Error::custom("status code is missing"))?;
        let code = code
            .parse::<u16>()
            .map_err(|_| D::Error::custom(format!("malformed status code '{}'", code)))?;

        let sub_code = match code_and_text(raw.sub_code).map_err(D::Error::custom)? {
            (Some(code), description) => Some(SubCode { code, description }),
            (None, _) => None,
        };

        Ok(Status {
            code,
            description,
            sub_code,
            date: raw.date_time,
        })
    }
}
