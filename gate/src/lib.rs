//! License-gated HTTP boundary for AI Invoice.
//!
//! Every protected route runs [`require_license`] first: the token from the
//! [`LICENSE_HEADER`] header is verified for the route's feature and the
//! resulting claims are handed to the handler as a request extension.

mod config;
mod error;
mod issue;
mod middleware;
mod routes;
mod state;

pub use config::{parse_list, GateConfig};
pub use error::GateError;
pub use issue::{parse_datetime, parse_metadata, IssueArgs};
pub use middleware::{gated, require_license, LicenseGate};
pub use routes::{build_router, FeatureStatus};
pub use state::GateState;

pub use ai_invoice_license::LICENSE_HEADER;

/// Header carrying the administrative token.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";
