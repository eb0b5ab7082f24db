//! Lender portal HTTP client
//!
//! A session-cookie, CSRF-aware client for the lending backend plus the
//! sign-in orchestration built on top of it.

pub mod auth;
pub mod bids;
pub mod client;
pub mod error;
pub mod leads;
pub mod navigation;
pub mod normalize;
pub mod profile;
pub mod session;

pub use auth::SignedIn;
pub use client::{PortalClient, PortalClientBuilder};
pub use error::{ACCESS_DENIED, ApiError, ApiErrorKind, ClientError};
pub use navigation::{Navigator, RecordingNavigator, RouteContext, TracingNavigator};
pub use session::AuthSession;
