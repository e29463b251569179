use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use crate::utils::de::{self, NamedValue};

fn decode_map(value: Value, child: &str) -> Result<HashMap<String, String>, String> {
    let children = de::children_of(value, child)?;
    let entries: Vec<NamedValue> = de::one_or_many(children).map_err(|e| e.to_string())?;
    Ok(entries
        .into_iter()
        .map(|p| (p.name, p.value.unwrap_or_default()))
        .collect())
}

macro_rules! parameter_map {
    ($(#[$meta:meta])* $name:ident, $child:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name(HashMap<String, String>);

        impl $name {
            pub fn get(&self, name: &str) -> Option<&str> {
                self.0.get(name).map(String::as_str)
            }

            pub fn contains(&self, name: &str) -> bool {
                self.0.contains_key(name)
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
                self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
            }
        }

        impl From<HashMap<String, String>> for $name {
            fn from(map: HashMap<String, String>) -> Self {
                Self(map)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = Value::deserialize(deserializer)?;
                decode_map(value, $child).map($name).map_err(D::Error::custom)
            }
        }
    };
}

parameter_map!(
    /// Merchant-defined parameters echoed back by the gateway.
    CustomParameters,
    "CustomParameter"
);

parameter_map!(
    /// Parameters the gateway adds on its own.
    AdditionalParameters,
    "AdditionalParameter"
);
