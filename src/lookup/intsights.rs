//! IntSights `ioc-by-value` source.

use super::{FetchError, IocSource};
use crate::options::LookupOptions;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Public IntSights API root.
pub const DEFAULT_BASE_URL: &str = "https://api.intsights.com";

const IOC_BY_VALUE_PATH: &str = "/public/v2/iocs/ioc-by-value";

/// Looks up IOCs against the IntSights public API.
pub struct IntSightsSource {
    client: Client,
    endpoint: String,
}

impl IntSightsSource {
    /// Create a source against the public IntSights API.
    pub fn new(transport: &HttpTransport) -> Self {
        Self::with_base_url(transport, DEFAULT_BASE_URL)
    }

    /// Create a source against an alternate API root.
    pub fn with_base_url(transport: &HttpTransport, base_url: &str) -> Self {
        Self {
            client: transport.client().clone(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), IOC_BY_VALUE_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IocSource for IntSightsSource {
    async fn fetch(&self, value: &str, options: &LookupOptions) -> Result<Value, FetchError> {
        trace!(ioc = %value, username = %options.username, "Querying IntSights");

        let request = self
            .client
            .get(&self.endpoint)
            .basic_auth(&options.username, Some(&options.password))
            .header(ACCEPT, "application/json")
            .query(&[("iocValue", value)])
            .build()
            .map_err(|e| FetchError::Request(Box::new(e)))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            debug!(ioc = %value, status = status.as_u16(), "IntSights returned error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Decode(Box::new(e)))?;

        // IntSights answers unknown IOCs with an empty body.
        if body.iter().all(u8::is_ascii_whitespace) {
            debug!(ioc = %value, "IntSights has no data");
            return Ok(Value::Object(Map::new()));
        }

        let payload: Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(Box::new(e)))?;

        debug!(ioc = %value, "IntSights lookup complete");
        Ok(payload)
    }

    fn name(&self) -> &str {
        "intsights"
    }
}
