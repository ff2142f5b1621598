//! IOC enrichment client for the IntSights threat intelligence API.
//!
//! Looks up batches of observables (IPs, domains, hashes, URLs) against
//! IntSights and returns a short tag summary plus the raw payload for each
//! entity the provider knows about.
//!
//! # Features
//!
//! - **Bounded fan-out** - One request per entity, at most 10 in flight
//! - **Ordered results** - Results always follow input order
//! - **All-or-nothing batches** - The first failure aborts the batch with a
//!   single classified error
//! - **Shared transport** - TLS trust roots, client identity, certificate
//!   validation and proxy are configured once at startup
//!
//! # Example Configuration
//!
//! ```yaml
//! request:
//!   ca: "/etc/ssl/corp-ca.pem"
//!   proxy: "http://proxy.internal:3128"
//!
//! credentials:
//!   username: "${INTSIGHTS_ACCOUNT_ID}"
//!   password: "${INTSIGHTS_API_KEY}"
//! ```

pub mod config;
pub mod integration;
pub mod lookup;
pub mod options;
pub mod orchestrator;
pub mod transport;

pub use config::{Config, TransportConfig};
pub use integration::Integration;
pub use lookup::{Entity, IocSummary, LookupError, LookupErrorKind, LookupResult};
pub use options::{IntegrationOptions, LookupOptions, ValidationError};
pub use orchestrator::{IocLookup, MAX_CONCURRENT_LOOKUPS};
pub use transport::HttpTransport;
