//! Deserialization helpers for the response field tree.
//!
//! The XML side hands every scalar over as a string, hand-built trees may use
//! native JSON numbers and booleans. Both shapes are accepted. Empty elements
//! arrive as `null` and decode as absent.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Key under which element text is stored next to attributes.
pub const TEXT_KEY: &str = "$text";

fn scalar_to_string(value: Value) -> Option<Result<String, String>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Ok(s)),
        Value::Number(n) => Some(Ok(n.to_string())),
        Value::Bool(b) => Some(Ok(b.to_string())),
        Value::Object(mut map) => match map.remove(TEXT_KEY) {
            Some(text) => scalar_to_string(text),
            None if map.is_empty() => None,
            None => Some(Err("expected a scalar, found an object".to_string())),
        },
        Value::Array(_) => Some(Err("expected a scalar, found a list".to_string())),
    }
}

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match scalar_to_string(value) {
        None => Ok(None),
        Some(Ok(s)) if s.trim().is_empty() => Ok(None),
        Some(Ok(s)) => Ok(Some(s)),
        Some(Err(e)) => Err(D::Error::custom(e)),
    }
}

pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match opt_string(deserializer)? {
        None => Ok(None),
        Some(s) => BigDecimal::from_str(s.trim())
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid amount '{}': {}", s, e))),
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match opt_string(deserializer)? {
        None => Ok(None),
        Some(s) => parse_bool(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid boolean '{}'", s))),
    }
}

/// Accepts RFC 3339 timestamps and the gateway's zone-less local form.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match opt_string(deserializer)? {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", s))),
    }
}

/// `<Entry Name="...">value</Entry>` elements.
#[derive(Debug, Deserialize)]
pub struct NamedValue {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(default, rename = "$text", deserialize_with = "opt_string")]
    pub value: Option<String>,
}

/// A single child element arrives as an object, repeated ones as a list.
pub fn one_or_many<T>(value: Value) -> Result<Vec<T>, serde_json::Error>
where
    T: DeserializeOwned,
{
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(serde_json::from_value)
            .collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

/// Unwraps a wrapper element (`<Services><Service/>...</Services>`) into its children.
pub fn children_of(value: Value, child: &str) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => Ok(Value::Array(items)),
        Value::Object(mut map) => match map.remove(child) {
            Some(children) => Ok(children),
            None if map.is_empty() => Ok(Value::Null),
            None => Err(format!("expected '{}' entries", child)),
        },
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        _ => Err(format!("expected a list of '{}' entries", child)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "opt_string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "opt_decimal")]
        amount: Option<BigDecimal>,
        #[serde(default, deserialize_with = "opt_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "opt_timestamp")]
        at: Option<NaiveDateTime>,
    }

    #[test]
    fn test_accepts_strings_and_native_scalars() {
        let from_xml: Sample = serde_json::from_value(json!({
            "name": "ideal", "amount": "1.23", "flag": "true", "at": "2024-03-01T10:15:00"
        }))
        .unwrap();
        let from_json: Sample =
            serde_json::from_value(json!({"name": 42, "amount": 1.23, "flag": false})).unwrap();

        assert_eq!(from_xml.name.as_deref(), Some("ideal"));
        assert_eq!(from_xml.amount, Some(BigDecimal::from_str("1.23").unwrap()));
        assert_eq!(from_xml.flag, Some(true));
        assert!(from_xml.at.is_some());
        assert_eq!(from_json.name.as_deref(), Some("42"));
        assert_eq!(from_json.amount, Some(BigDecimal::from_str("1.23").unwrap()));
        assert_eq!(from_json.flag, Some(false));
    }

    #[test]
    fn test_missing_and_empty_are_absent() {
        let sample: Sample = serde_json::from_value(json!({"name": null, "amount": ""})).unwrap();
        assert!(sample.name.is_none());
        assert!(sample.amount.is_none());
        assert!(sample.flag.is_none());
        assert!(sample.at.is_none());
    }

    #[test]
    fn test_malformed_scalars_are_errors() {
        assert!(serde_json::from_value::<Sample>(json!({"amount": "abc"})).is_err());
        assert!(serde_json::from_value::<Sample>(json!({"flag": "maybe"})).is_err());
        assert!(serde_json::from_value::<Sample>(json!({"at": "yesterday"})).is_err());
        assert!(serde_json::from_value::<Sample>(json!({"name": ["a"]})).is_err());
    }

    #[test]
    fn test_text_next_to_attributes() {
        let sample: Sample =
            serde_json::from_value(json!({"name": {"Lang": "nl", "$text": "iDEAL"}})).unwrap();
        assert_eq!(sample.name.as_deref(), Some("iDEAL"));
    }

    #[test]
    fn test_one_or_many() {
        let single: Vec<String> = one_or_many(json!("a")).unwrap();
        let many: Vec<String> = one_or_many(json!(["a", "b"])).unwrap();
        let none: Vec<String> = one_or_many(Value::Null).unwrap();
        assert_eq!(single, vec!["a"]);
        assert_eq!(many, vec!["a", "b"]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_children_of_wrapper() {
        let wrapped = json!({"Service": [{"Name": "ideal"}]});
        assert_eq!(
            children_of(wrapped, "Service").unwrap(),
            json!([{"Name": "ideal"}])
        );
        assert_eq!(children_of(json!({}), "Service").unwrap(), Value::Null);
        assert!(children_of(json!({"Other": 1}), "Service").is_err());
    }
}
