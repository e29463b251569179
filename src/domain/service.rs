use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::utils::de::{self, NamedValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceParameter {
    pub name: String,
    pub value: String,
}

/// One service entry of a response, with its parameters in gateway order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    name: String,
    action: Option<String>,
    parameters: Vec<ServiceParameter>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(ServiceParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn parameters(&self) -> &[ServiceParameter] {
        &self.parameters
    }

    /// Parameter names are matched case-insensitively, as the gateway does.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawService {
    name: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    action: Option<String>,
    #[serde(default)]
    response_parameter: Value,
    #[serde(default)]
    parameter: Value,
}

impl<'de> Deserialize<'de> for Service {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawService::deserialize(deserializer)?;

        let mut parameters = Vec::new();
        for source in [raw.response_parameter, raw.parameter] {
            let entries: Vec<NamedValue> = de::one_or_many(source).map_err(D::Error::custom)?;
            parameters.extend(entries.into_iter().map(|p| ServiceParameter {
                name: p.name,
                value: p.value.unwrap_or_default(),
            }));
        }

        Ok(Service {
            name: raw.name,
            action: raw.action,
            parameters,
        })
    }
}

/// Ordered collection of services, looked up by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Services(Vec<Service>);

impl Services {
    pub fn new(services: Vec<Service>) -> Self {
        Self(services)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.0.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<'de> Deserialize<'de> for Services {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let children = de::children_of(value, "Service").map_err(D::Error::custom)?;
        let services = de::one_or_many(children).map_err(D::Error::custom)?;
        Ok(Services(services))
    }
}
