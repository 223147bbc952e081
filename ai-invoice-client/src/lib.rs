//! Client-side license lifecycle for AI Invoice.
//!
//! - [`LicenseArtifact`]: the opaque token plus an optional expiry hint
//! - [`LicenseStore`] / [`FileLicenseStore`]: encrypted at-rest persistence
//! - [`LicenseManager`]: owns the active artifact; lock-free reads, serialized writes
//! - [`LicenseRefresher`] / [`EnvRefresher`]: where replacement tokens come from
//! - [`LicensedClient`]: attaches the token to requests and refreshes once on 401/403
//!
//! Refresh is lazy: there is no background timer. A refresh only happens
//! inside the call path of a request the server rejected.

mod artifact;
mod config;
mod error;
mod manager;
mod refresher;
mod store;
mod transport;

pub use artifact::LicenseArtifact;
pub use config::ClientConfig;
pub use error::{
    ClientError, ClientResult, LicenseFailure, LicenseFailureReason, StoreError, StoreResult,
};
pub use manager::{LicenseManager, RefreshOutcome};
pub use refresher::{EnvRefresher, LicenseRefresher, RefreshContext};
pub use store::{FileLicenseStore, LicenseStore};
pub use transport::LicensedClient;

pub use ai_invoice_license::LICENSE_HEADER;
pub use tokio_util::sync::CancellationToken;
