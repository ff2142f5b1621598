//! Configuration types for the IntSights lookup client.

use crate::options::IntegrationOptions;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Outbound transport settings (TLS material and proxy).
    #[serde(default)]
    pub request: TransportConfig,

    /// IntSights account credentials.
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Process-wide HTTP transport settings.
///
/// Every field is optional. Empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransportConfig {
    /// PEM bundle of additional trust roots.
    #[serde(default)]
    pub ca: Option<PathBuf>,

    /// PEM client certificate.
    #[serde(default)]
    pub cert: Option<PathBuf>,

    /// PEM private key for the client certificate.
    #[serde(default)]
    pub key: Option<PathBuf>,

    /// Passphrase for the private key.
    #[serde(default)]
    pub passphrase: Option<String>,

    /// Whether to validate server certificates. Only honored when the
    /// configured value is an actual boolean.
    #[serde(default, deserialize_with = "strict_bool")]
    pub reject_unauthorized: Option<bool>,

    /// Proxy address all requests are routed through.
    #[serde(default)]
    pub proxy: Option<String>,
}

impl TransportConfig {
    pub fn ca_path(&self) -> Option<&PathBuf> {
        non_empty_path(&self.ca)
    }

    pub fn cert_path(&self) -> Option<&PathBuf> {
        non_empty_path(&self.cert)
    }

    pub fn key_path(&self) -> Option<&PathBuf> {
        non_empty_path(&self.key)
    }

    pub fn passphrase(&self) -> Option<&str> {
        non_empty_str(&self.passphrase)
    }

    pub fn proxy(&self) -> Option<&str> {
        non_empty_str(&self.proxy)
    }
}

fn non_empty_path(path: &Option<PathBuf>) -> Option<&PathBuf> {
    path.as_ref().filter(|p| !p.as_os_str().is_empty())
}

fn non_empty_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Accepts any YAML value, keeping it only when it is a boolean.
fn strict_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}

/// IntSights account credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    /// Account ID (supports ${ENV_VAR} syntax).
    #[serde(default)]
    pub username: String,

    /// API key (supports ${ENV_VAR} syntax).
    #[serde(default)]
    pub password: String,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let errors = IntegrationOptions::from(&self.credentials).validate();
        if let Some(first) = errors.first() {
            anyhow::bail!("credentials.{}: {}", first.key, first.message);
        }

        let request = &self.request;
        if request.cert_path().is_some() != request.key_path().is_some() {
            anyhow::bail!("request.cert and request.key must be configured together");
        }

        for path in [request.ca_path(), request.cert_path(), request.key_path()]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                anyhow::bail!("TLS file does not exist: {}", path.display());
            }
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# IntSights IOC Lookup Configuration

# Outbound HTTP transport (all fields optional)
request:
  ca: ""                       # PEM bundle of extra trust roots
  cert: ""                     # PEM client certificate
  key: ""                      # PEM private key for the client certificate
  passphrase: ""               # Private key passphrase
  reject_unauthorized: true    # Set to false to skip certificate validation
  proxy: ""                    # e.g. "http://proxy.internal:3128"

# IntSights API credentials
credentials:
  username: "${INTSIGHTS_ACCOUNT_ID}"
  password: "${INTSIGHTS_API_KEY}"
"#
        .to_string()
    }
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid");
    re.replace_all(content, |cap: &regex::Captures<'_>| {
        std::env::var(&cap[1]).unwrap_or_default()
    })
    .into_owned()
}
