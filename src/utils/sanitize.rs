use serde_json::Value;

use crate::services::signer::CanonicalParameters;
use crate::utils::de::TEXT_KEY;

/// Masks sensitive fields of a response tree for logging
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key)
                    || (key == TEXT_KEY && is_named_sensitive(map))
                {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

/// Masked copy of outgoing parameters, in canonical order
pub fn sanitize_parameters(parameters: &CanonicalParameters) -> Vec<(String, String)> {
    parameters
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive_field(name) {
                mask(value)
            } else {
                value.to_string()
            };
            (name.to_string(), value)
        })
        .collect()
}

// `<ResponseParameter Name="consumerIBAN">...</ResponseParameter>` carries its secret in the text.
fn is_named_sensitive(map: &serde_json::Map<String, Value>) -> bool {
    map.get("Name")
        .and_then(Value::as_str)
        .map(is_sensitive_field)
        .unwrap_or(false)
}

fn is_sensitive_field(key: &str) -> bool {
    let leaf = key.rsplit('.').next().unwrap_or(key);
    matches!(
        leaf.to_lowercase().as_str(),
        "websitekey"
            | "signature"
            | "brq_signature"
            | "consumeriban"
            | "consumerbic"
            | "consumername"
            | "payerhash"
            | "customeremail"
            | "customername"
    )
}

fn mask(s: &str) -> String {
    if s.len() > 8 && s.is_char_boundary(4) && s.is_char_boundary(s.len() - 4) {
        format!("{}****{}", &s[..4], &s[s.len() - 4..])
    } else {
        "****".to_string()
    }
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask(s)),
        _ => Value::String("****".to_string()),
    }
}
