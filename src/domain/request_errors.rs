use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::utils::de;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    Channel,
    Service,
    Action,
    Parameter,
    CustomParameter,
}

impl RequestErrorKind {
    const ALL: [(RequestErrorKind, &'static str); 5] = [
        (RequestErrorKind::Channel, "ChannelError"),
        (RequestErrorKind::Service, "ServiceError"),
        (RequestErrorKind::Action, "ActionError"),
        (RequestErrorKind::Parameter, "ParameterError"),
        (RequestErrorKind::CustomParameter, "CustomParameterError"),
    ];

    fn from_element(element: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(_, name)| *name == element)
            .map(|(kind, _)| *kind)
    }
}

/// One rejected part of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: RequestErrorKind,
    /// Machine readable error code, e.g. `ParameterMissing`.
    pub code: Option<String>,
    pub description: Option<String>,
    /// The offending service, action or parameter name.
    pub field: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRequestError {
    #[serde(default, deserialize_with = "de::opt_string")]
    error: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    service: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    action: Option<String>,
    #[serde(default, rename = "$text", deserialize_with = "de::opt_string")]
    text: Option<String>,
}

/// A bare text element (`<ChannelError>Invalid channel</ChannelError>`) has no attributes.
fn normalize(value: Value) -> Value {
    match value {
        Value::String(text) => {
            let mut map = Map::new();
            map.insert(de::TEXT_KEY.to_string(), Value::String(text));
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Errors in the order the gateway reported them. Repeated errors of one kind
/// stay together at the position of the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestErrors(Vec<RequestError>);

impl RequestErrors {
    pub fn new(errors: Vec<RequestError>) -> Self {
        Self(errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestError> {
        self.0.iter()
    }

    pub fn of_kind(&self, kind: RequestErrorKind) -> impl Iterator<Item = &RequestError> {
        self.0.iter().filter(move |e| e.kind == kind)
    }
}

impl<'de> Deserialize<'de> for RequestErrors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = match Value::deserialize(deserializer)? {
            Value::Null => return Ok(RequestErrors::default()),
            Value::Object(map) => map,
            Value::String(s) if s.trim().is_empty() => return Ok(RequestErrors::default()),
            other => {
                return Err(D::Error::custom(format!(
                    "expected request error groups, found {}",
                    other
                )))
            }
        };

        let mut errors = Vec::new();
        for (element, group) in map {
            let Some(kind) = RequestErrorKind::from_element(&element) else {
                continue;
            };
            let raw: Vec<RawRequestError> =
                de::one_or_many(normalize(group)).map_err(D::Error::custom)?;
            errors.extend(raw.into_iter().map(|r| RequestError {
                kind,
                code: r.error,
                description: r.text,
                field: r.name.or(r.action).or(r.service),
            }));
        }

        Ok(RequestErrors(errors))
    }
}
