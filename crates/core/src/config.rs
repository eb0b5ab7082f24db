//! Configuration management for the portal client

use crate::error::{CoreError, CoreResult};
use crate::gate::GateConfig;
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Environment variable prefix, e.g. `PORTAL_BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "PORTAL";

/// Main portal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Backend connection settings
    pub backend: BackendConfig,

    /// Session cookie and CSRF settings
    pub session: SessionConfig,

    /// Route classification for the session gate
    pub routes: GateConfig,

    /// The only role allowed to sign in through this portal
    pub portal_role: Role,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Origin every API request is sent to
    pub base_url: String,

    /// Request timeout in seconds; transport default when unset
    pub timeout_secs: Option<u64>,

    pub user_agent: String,
}

/// Names the backend uses for its session and anti-forgery machinery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Must match the backend's session cookie name exactly
    pub cookie_name: String,

    pub csrf_header: String,

    pub csrf_path: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            session: SessionConfig::default(),
            routes: GateConfig::default(),
            portal_role: Role::Lender,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: None,
            user_agent: format!("lender-portal/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sessionid".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            csrf_path: "/api/auth/csrf/".to_string(),
        }
    }
}

impl PortalConfig {
    /// Load configuration: defaults, then the optional file, then environment variables
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConfigLoad` if the file cannot be read or parsed,
    /// `CoreError::InvalidConfig` if the result fails validation
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings the request pipeline cannot work without
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` describing the first problem found
    pub fn validate(&self) -> CoreResult<()> {
        let url = Url::parse(&self.backend.base_url).map_err(|e| {
            CoreError::invalid_config(format!(
                "backend.base_url '{}' is not a valid URL: {e}",
                self.backend.base_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::invalid_config(format!(
                "backend.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(CoreError::invalid_config("session.cookie_name is empty"));
        }
        if self.session.csrf_header.trim().is_empty() {
            return Err(CoreError::invalid_config("session.csrf_header is empty"));
        }
        if !self.session.csrf_path.starts_with('/') {
            return Err(CoreError::invalid_config(
                "session.csrf_path must start with '/'",
            ));
        }
        for (name, path) in [
            ("routes.login_path", &self.routes.login_path),
            ("routes.home_path", &self.routes.home_path),
        ] {
            if !path.starts_with('/') {
                return Err(CoreError::invalid_config(format!(
                    "{name} must start with '/'"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.session.cookie_name, "sessionid");
        assert_eq!(config.session.csrf_header, "X-CSRFToken");
        assert_eq!(config.portal_role, Role::Lender);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[backend]
base_url = "https://lending.example.com"
timeout_secs = 15

[routes]
home_path = "/overview"
"#
        )
        .unwrap();

        let config = PortalConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.backend.base_url, "https://lending.example.com");
        assert_eq!(config.backend.timeout_secs, Some(15));
        assert_eq!(config.routes.home_path, "/overview");
        // untouched sections keep their defaults
        assert_eq!(config.routes.login_path, "/login");
        assert_eq!(config.session.cookie_name, "sessionid");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = PortalConfig::default();
        config.backend.base_url = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));

        config.backend.base_url = "ftp://files.example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_route_rejected() {
        let mut config = PortalConfig::default();
        config.routes.login_path = "login".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = PortalConfig::load(Some(Path::new("/nonexistent/portal.toml")));
        assert!(matches!(result, Err(CoreError::ConfigLoad { .. })));
    }

    #[test]
    fn test_loaded_file_is_validated() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[backend]\nbase_url = \"ftp://files.example.com\"").unwrap();

        let result = PortalConfig::load(Some(file.path()));
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }
}
