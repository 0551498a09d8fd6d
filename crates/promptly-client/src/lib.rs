//! Promptly Client
//!
//! This crate provides the client-side data layer for the Promptly API:
//! - `ApiClient`: authenticated JSON requests with 401 handling
//! - `SessionStore`: token validation, login and logout
//! - `ActivityTracker`: fire-and-forget usage telemetry
//! - `SelectedProfileStore`: the profile that scopes list views

pub mod activity_tracker;
pub mod api;
pub mod client;
pub mod error;
pub mod profile_store;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity_tracker::ActivityTracker;
pub use api::{ApiClient, RequestOptions};
pub use client::{HttpClientConfig, create_client};
pub use error::{ClientError, Result};
pub use profile_store::SelectedProfileStore;
pub use session::{AuthState, SessionPhase, SessionStore};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
