use serde::Deserialize;

use crate::utils::de;

/// Message the gateway wants shown to the paying consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsumerMessage {
    #[serde(default, deserialize_with = "de::opt_bool")]
    must_read: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_string")]
    culture_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    plain_text: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    html_text: Option<String>,
}

impl ConsumerMessage {
    pub fn must_read(&self) -> bool {
        self.must_read.unwrap_or(false)
    }

    pub fn culture_name(&self) -> Option<&str> {
        self.culture_name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn plain_text(&self) -> Option<&str> {
        self.plain_text.as_deref()
    }

    pub fn html_text(&self) -> Option<&str> {
        self.html_text.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.plain_text.is_none() && self.html_text.is_none()
    }
}
