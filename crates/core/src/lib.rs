//! Lender portal core types and utilities
//!
//! Wire types shared with the lending backend, the session gate that guards
//! navigation, the application store and configuration loading.

pub mod config;
pub mod error;
pub mod gate;
pub mod store;
pub mod types;

pub use config::{BackendConfig, PortalConfig, SessionConfig};
pub use error::{CoreError, CoreResult};
pub use gate::{GateConfig, GateDecision, PathKind, SessionGate};
pub use store::AppStore;
pub use types::{
    AuthResponse, Bid, BidStatus, CsrfResponse, EstimateStatus, Lead, LeadStatus, LeadUpdate,
    LoanEstimate, LoginRequest, MessageResponse, Notification, NotificationKind, PlaceBidRequest,
    ProfileUpdate, RegisterRequest, ResourceId, Role, User,
};
