use serde::{Deserialize, Deserializer};

use crate::utils::de;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredActionType {
    None,
    Redirect,
    Other(String),
}

impl RequiredActionType {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => RequiredActionType::None,
            Some(t) if t.eq_ignore_ascii_case("redirect") => RequiredActionType::Redirect,
            Some(t) if t.eq_ignore_ascii_case("none") => RequiredActionType::None,
            Some(t) => RequiredActionType::Other(t.to_string()),
        }
    }
}

/// Follow-up the consumer has to take before the transaction can complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredAction {
    action_type: RequiredActionType,
    name: Option<String>,
    redirect_url: Option<String>,
}

impl RequiredAction {
    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            action_type: RequiredActionType::Redirect,
            name: Some("Redirect".to_string()),
            redirect_url: Some(url.into()),
        }
    }

    pub fn action_type(&self) -> &RequiredActionType {
        &self.action_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_redirect(&self) -> bool {
        self.action_type == RequiredActionType::Redirect
    }

    /// Only a redirect action carries a URL.
    pub fn redirect_url(&self) -> Option<&str> {
        if self.is_redirect() {
            self.redirect_url.as_deref()
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRequiredAction {
    #[serde(default, rename = "Type", deserialize_with = "de::opt_string")]
    action_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    name: Option<String>,
    #[serde(default, rename = "RedirectURL", deserialize_with = "de::opt_string")]
    redirect_url: Option<String>,
}

impl<'de> Deserialize<'de> for RequiredAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawRequiredAction::deserialize(deserializer)?;
        Ok(RequiredAction {
            action_type: RequiredActionType::parse(raw.action_type.as_deref()),
            name: raw.name,
            redirect_url: raw.redirect_url,
        })
    }
}
