//! Host-facing integration surface.

use crate::config::TransportConfig;
use crate::lookup::intsights::{IntSightsSource, DEFAULT_BASE_URL};
use crate::lookup::{Entity, IocSource, LookupError, LookupResult};
use crate::options::{IntegrationOptions, LookupOptions, ValidationError};
use crate::orchestrator::{IocLookup, MAX_CONCURRENT_LOOKUPS};
use crate::transport::{ConfigureError, HttpTransport};
use std::sync::Arc;
use tracing::info;

/// IntSights IOC lookup integration.
pub struct Integration {
    lookup: IocLookup,
}

impl Integration {
    /// Build the shared transport and the IntSights source.
    ///
    /// Called once at process startup. Errors are fatal.
    pub fn startup(config: &TransportConfig) -> Result<Self, ConfigureError> {
        Self::startup_with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Like [`Integration::startup`], against an alternate API root.
    pub fn startup_with_base_url(
        config: &TransportConfig,
        base_url: &str,
    ) -> Result<Self, ConfigureError> {
        let transport = HttpTransport::configure(config)?;
        let source = IntSightsSource::with_base_url(&transport, base_url);

        info!(
            endpoint = source.endpoint(),
            max_concurrent = MAX_CONCURRENT_LOOKUPS,
            "IntSights integration initialized"
        );

        Ok(Self::with_source(Arc::new(source)))
    }

    /// Build the integration around any IOC source.
    pub fn with_source(source: Arc<dyn IocSource>) -> Self {
        Self {
            lookup: IocLookup::new(source),
        }
    }

    /// Validate host-supplied options.
    pub fn validate_options(options: &IntegrationOptions) -> Vec<ValidationError> {
        options.validate()
    }

    /// Look up a batch of entities.
    pub async fn lookup(
        &self,
        entities: &[Entity],
        options: &LookupOptions,
    ) -> Result<Vec<LookupResult>, LookupError> {
        self.lookup.lookup(entities, options).await
    }

    /// Callback-style lookup. `callback` runs exactly once with the outcome.
    pub async fn do_lookup<F>(&self, entities: &[Entity], options: &LookupOptions, callback: F)
    where
        F: FnOnce(Result<Vec<LookupResult>, LookupError>),
    {
        callback(self.lookup(entities, options).await);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::MockSource;
    use crate::LookupErrorKind;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_startup_default_transport() {
        assert!(Integration::startup(&TransportConfig::default()).is_ok());
    }

    #[test]
    fn test_startup_propagates_tls_errors() {
        let config = TransportConfig {
            ca: Some("/nonexistent/intsights-ca.pem".into()),
            ..Default::default()
        };
        assert!(matches!(
            Integration::startup(&config),
            Err(ConfigureError::Io { .. })
        ));
    }

    #[test]
    fn test_validate_options() {
        let options: IntegrationOptions = serde_json::from_value(json!({
            "username": { "value": "" },
            "password": { "value": "x" }
        }))
        .unwrap();

        let errors = Integration::validate_options(&options);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].key, "username");
    }

    #[tokio::test]
    async fn test_do_lookup_success_callback() {
        let source = MockSource::default().with_payload(
            "evil.example",
            json!({ "Sources": [{}], "SystemTags": ["Malware"] }),
        );
        let integration = Integration::with_source(Arc::new(source));

        let mut outcome = None;
        integration
            .do_lookup(
                &[Entity::new("evil.example"), Entity::new("benign.example")],
                &LookupOptions::new("acct", "key"),
                |result| outcome = Some(result),
            )
            .await;

        let results = outcome.unwrap().unwrap();
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(
            json,
            json!([
                {
                    "entity": { "value": "evil.example" },
                    "data": {
                        "summary": ["Sources: 1", "Malware"],
                        "details": { "Sources": [{}], "SystemTags": ["Malware"] }
                    }
                },
                { "entity": { "value": "benign.example" }, "data": null }
            ])
        );
    }

    #[tokio::test]
    async fn test_do_lookup_error_callback() {
        let source = MockSource::default().with_status("8.8.8.8", 503);
        let integration = Integration::with_source(Arc::new(source));

        let mut calls = 0;
        let mut outcome = None;
        integration
            .do_lookup(
                &[Entity::new("1.1.1.1"), Entity::new("8.8.8.8")],
                &LookupOptions::new("acct", "key"),
                |result| {
                    calls += 1;
                    outcome = Some(result);
                },
            )
            .await;

        assert_eq!(calls, 1);
        let err = outcome.unwrap().unwrap_err();
        assert_eq!(err.detail, "Received unexpected HTTP status 503");
        assert_eq!(err.envelope().entity, "8.8.8.8");
    }

    #[tokio::test]
    async fn test_startup_lookup_fails_batch_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/v2/iocs/ioc-by-value"))
            .and(query_param("iocValue", "bad.example"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/public/v2/iocs/ioc-by-value"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "Sources": [{}], "Tags": ["c2"] })),
            )
            .mount(&server)
            .await;

        let integration =
            Integration::startup_with_base_url(&TransportConfig::default(), &server.uri()).unwrap();
        let entities = [
            Entity::new("good.example"),
            Entity::new("bad.example"),
            Entity::new("other.example"),
        ];
        let options = LookupOptions::new("acct", "key");

        let err = integration.lookup(&entities, &options).await.unwrap_err();
        assert_eq!(err.kind, LookupErrorKind::HttpStatus);
        assert_eq!(err.entity, "bad.example");
        assert!(err.detail.contains("500"));

        let results = integration
            .lookup(&entities[..1], &options)
            .await
            .unwrap();
        assert_eq!(results[0].data.as_ref().unwrap().summary.tags(), ["Sources: 1", "c2"]);
    }
}
