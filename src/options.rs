//! Host-supplied lookup options and their validation.

use crate::config::CredentialsConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single host option, wrapped the way the host delivers it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OptionField {
    #[serde(default)]
    pub value: Value,
}

impl OptionField {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The value if it is a non-empty string.
    fn as_non_empty_str(&self) -> Option<&str> {
        self.value.as_str().filter(|s| !s.is_empty())
    }
}

/// Option bag as provided by the host application.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IntegrationOptions {
    #[serde(default)]
    pub username: OptionField,
    #[serde(default)]
    pub password: OptionField,
}

/// A single option validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl IntegrationOptions {
    /// Check that username and password are non-empty strings.
    ///
    /// Returns one entry per invalid field, empty when both are valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_option(
            &mut errors,
            &self.username,
            "username",
            "You must provide a valid Username.",
        );
        check_option(
            &mut errors,
            &self.password,
            "password",
            "You must provide a valid Password.",
        );
        errors
    }

    /// Convert into per-call credentials, failing with the validation errors.
    pub fn credentials(&self) -> Result<LookupOptions, Vec<ValidationError>> {
        match (
            self.username.as_non_empty_str(),
            self.password.as_non_empty_str(),
        ) {
            (Some(username), Some(password)) => Ok(LookupOptions::new(username, password)),
            _ => Err(self.validate()),
        }
    }
}

fn check_option(errors: &mut Vec<ValidationError>, field: &OptionField, key: &str, message: &str) {
    if field.as_non_empty_str().is_none() {
        errors.push(ValidationError {
            key: key.to_string(),
            message: message.to_string(),
        });
    }
}

impl From<&CredentialsConfig> for IntegrationOptions {
    fn from(credentials: &CredentialsConfig) -> Self {
        Self {
            username: OptionField::new(credentials.username.clone()),
            password: OptionField::new(credentials.password.clone()),
        }
    }
}

/// Per-call IntSights credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct LookupOptions {
    pub username: String,
    pub password: String,
}

impl LookupOptions {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for LookupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupOptions")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
