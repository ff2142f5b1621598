//! Bounded-concurrency lookup orchestrator.

use crate::lookup::{Entity, FetchError, IocSource, LookupError, LookupResult};
use crate::options::LookupOptions;
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, trace};

/// Maximum number of lookups in flight at once.
pub const MAX_CONCURRENT_LOOKUPS: usize = 10;

/// Fans out one request per entity and gathers the results in input order.
///
/// The concurrency limit is shared by every batch run through the same
/// orchestrator.
pub struct IocLookup {
    source: Arc<dyn IocSource>,
    limiter: Arc<Semaphore>,
}

impl IocLookup {
    pub fn new(source: Arc<dyn IocSource>) -> Self {
        Self {
            source,
            limiter: Arc::new(Semaphore::new(MAX_CONCURRENT_LOOKUPS)),
        }
    }

    /// Look up every entity.
    ///
    /// The first failure aborts the batch; outstanding requests are dropped
    /// and no partial results are returned.
    pub async fn lookup(
        &self,
        entities: &[Entity],
        options: &LookupOptions,
    ) -> Result<Vec<LookupResult>, LookupError> {
        debug!(
            source = self.source.name(),
            entities = entities.len(),
            "Starting IOC lookup batch"
        );

        let results = self.run_batch(entities, options).await.map_err(|e| {
            error!(
                entity = %e.entity,
                kind = ?e.kind,
                error = %e.cause,
                "Error looking up indicator"
            );
            e
        })?;

        trace!(results = ?results, "Lookup results");
        Ok(results)
    }

    async fn run_batch(
        &self,
        entities: &[Entity],
        options: &LookupOptions,
    ) -> Result<Vec<LookupResult>, LookupError> {
        // try_join_all yields payloads in input order, whatever order they complete in.
        let payloads = try_join_all(entities.iter().map(|entity| self.fetch_one(entity, options))).await?;

        entities
            .iter()
            .zip(payloads)
            .map(|(entity, payload)| {
                LookupResult::from_payload(entity.clone(), payload)
                    .map_err(|e| LookupError::new(entity, e.into()))
            })
            .collect()
    }

    async fn fetch_one(&self, entity: &Entity, options: &LookupOptions) -> Result<Value, LookupError> {
        let _permit = self.limiter.acquire().await.map_err(|_| {
            LookupError::new(
                entity,
                FetchError::Internal("lookup concurrency limiter closed unexpectedly".into()),
            )
        })?;

        trace!(ioc = %entity.value, "Looking up IOC");
        self.source
            .fetch(&entity.value, options)
            .await
            .map_err(|e| LookupError::new(entity, e))
    }
}
