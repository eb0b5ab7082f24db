//! Route context and navigation side effects
//!
//! The request pipeline never looks at a global "current location". Callers
//! pass the route they are rendering as a `RouteContext`, and any redirect the
//! pipeline decides on goes through the `Navigator` the client was built with.

use std::sync::{Arc, Mutex, PoisonError};

/// The page a call is being made from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteContext {
    path: String,
}

impl RouteContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Login and registration pages, where an auth failure is expected and must not redirect
    pub fn is_auth_page(&self) -> bool {
        self.path.contains("/login") || self.path.contains("/register")
    }
}

impl Default for RouteContext {
    fn default() -> Self {
        Self::new("/")
    }
}

impl From<&str> for RouteContext {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Receives full-page navigations requested by the client
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Logs navigations and does nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, target: &str) {
        tracing::info!(target_path = target, "navigation requested");
    }
}

/// Records every navigation so the caller can act on it afterwards
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visits: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.to_string());
    }
}
