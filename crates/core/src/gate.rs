//! Session gate: per-navigation allow/redirect decisions.
//!
//! The gate only looks at whether a session cookie is present. It never
//! decodes the session and never talks to the network.

use serde::{Deserialize, Serialize};

/// Route classification used by the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Pages reachable without a session (login, registration)
    pub public_paths: Vec<String>,

    /// Where unauthenticated navigations are sent
    pub login_path: String,

    /// Where authenticated visitors of public pages are sent
    pub home_path: String,

    /// Prefixes that bypass the gate entirely (API, framework internals, static assets)
    pub excluded_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            public_paths: vec!["/login".to_string(), "/register".to_string()],
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
            excluded_prefixes: vec![
                "/api".to_string(),
                "/_next".to_string(),
                "/static".to_string(),
            ],
        }
    }
}

/// How the gate sees a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Not subject to the gate
    Excluded,
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

impl GateDecision {
    pub const fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Redirect(target) => Some(target),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    config: GateConfig,
}

impl SessionGate {
    pub const fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Classify a navigation target
    pub fn classify(&self, path: &str) -> PathKind {
        let path = normalize(path);

        if self.is_excluded(path) {
            return PathKind::Excluded;
        }

        if self.config.public_paths.iter().any(|p| normalize(p) == path) {
            PathKind::Public
        } else {
            PathKind::Protected
        }
    }

    /// Decide what happens to a navigation given whether a session cookie exists
    pub fn decide(&self, path: &str, has_session: bool) -> GateDecision {
        let decision = match (self.classify(path), has_session) {
            (PathKind::Excluded, _) | (PathKind::Public, false) | (PathKind::Protected, true) => {
                GateDecision::Allow
            }
            (PathKind::Public, true) => GateDecision::Redirect(self.config.home_path.clone()),
            (PathKind::Protected, false) => {
                // The login page itself must stay reachable or every redirect loops
                if is_under(normalize(path), normalize(&self.config.login_path)) {
                    GateDecision::Allow
                } else {
                    GateDecision::Redirect(self.config.login_path.clone())
                }
            }
        };

        tracing::trace!(path, has_session, ?decision, "session gate decision");
        decision
    }

    fn is_excluded(&self, path: &str) -> bool {
        let under_prefix = self
            .config
            .excluded_prefixes
            .iter()
            .any(|prefix| is_under(path, normalize(prefix)));

        let has_extension = path
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.contains('.'));

        under_prefix || has_extension
    }
}

/// Strip query, fragment and any trailing slash
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Segment-wise prefix test: `/api` covers `/api` and `/api/x` but not `/apiary`
fn is_under(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
