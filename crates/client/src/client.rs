//! Authenticated request client
//!
//! Every call to the backend goes through [`PortalClient::send`]:
//!
//! 1. Requests with a non-safe method first fetch a fresh CSRF token and carry
//!    it in the CSRF header. A failed fetch is logged and the request goes out
//!    without the header.
//! 2. All requests share one cookie jar, so the backend session cookie rides
//!    along with every call.
//! 3. A 401 or 403 response sends the user to the login page, unless the call
//!    came from the login or registration page itself. The error is returned
//!    to the caller either way.

use crate::error::ClientError;
use crate::navigation::{Navigator, RouteContext, TracingNavigator};
use portal_core::{CsrfResponse, PortalConfig, ResourceId, Role};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Lending backend API client
#[derive(Clone)]
pub struct PortalClient {
    http: Client,
    base_url: String,
    origin: Url,
    jar: Arc<Jar>,
    navigator: Arc<dyn Navigator>,
    csrf_header: HeaderName,
    csrf_path: String,
    login_path: String,
    session_cookie: String,
    portal_role: Role,
}

impl std::fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.base_url)
            .field("csrf_header", &self.csrf_header)
            .field("login_path", &self.login_path)
            .field("session_cookie", &self.session_cookie)
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the base URL is invalid
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> PortalClientBuilder {
        PortalClientBuilder::default()
    }

    /// Builder pre-populated from portal configuration
    pub fn from_config(config: &PortalConfig) -> PortalClientBuilder {
        let mut builder = Self::builder()
            .base_url(&config.backend.base_url)
            .user_agent(&config.backend.user_agent)
            .csrf_header(&config.session.csrf_header)
            .csrf_path(&config.session.csrf_path)
            .session_cookie(&config.session.cookie_name)
            .login_path(&config.routes.login_path)
            .portal_role(config.portal_role);

        if let Some(secs) = config.backend.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub const fn portal_role(&self) -> Role {
        self.portal_role
    }

    /// Create a request builder for a path under the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http.request(method, url)
    }

    /// Create a request builder for one item of a collection.
    ///
    /// The id always lands in a single path segment, percent-encoded, with the
    /// trailing slash the backend routes expect.
    pub fn resource_request(
        &self,
        method: Method,
        collection: &[&str],
        id: &ResourceId,
    ) -> RequestBuilder {
        let mut url = self.origin.clone();
        // http(s) URLs always have path segments; checked in `build`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(collection)
                .push(id.as_str())
                .push("");
        }
        self.http.request(method, url)
    }

    /// Fetch a fresh CSRF token.
    ///
    /// This call bypasses the auth-failure redirect: the token endpoint is public.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body has no token
    pub async fn csrf_token(&self) -> Result<String, ClientError> {
        let response = self.request(Method::GET, &self.csrf_path).send().await?;
        let response = Self::check_status(response).await?;
        let body: CsrfResponse = Self::read_json(response).await?;
        Ok(body.csrf_token)
    }

    /// Send a request through the pipeline
    ///
    /// # Errors
    ///
    /// Returns the transport or status error; 401/403 additionally trigger the
    /// login redirect unless `route` is an auth page
    pub async fn send(
        &self,
        route: &RouteContext,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let mut request = request.build()?;

        if !request.method().is_safe() {
            self.attach_csrf_token(&mut request).await;
        }

        debug!(
            method = %request.method(),
            path = request.url().path(),
            route = route.path(),
            "sending request"
        );

        let response = self.http.execute(request).await?;
        match Self::check_status(response).await {
            Ok(response) => Ok(response),
            Err(error) => {
                if error.is_auth_failure() {
                    self.handle_auth_failure(route);
                }
                Err(error)
            }
        }
    }

    /// Send a request through the pipeline and decode the JSON body
    ///
    /// # Errors
    ///
    /// Returns any error from [`send`](Self::send), or a serialization error
    /// if the body does not decode as `T`
    pub async fn execute<T: DeserializeOwned>(
        &self,
        route: &RouteContext,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(route, request).await?;
        Self::read_json(response).await
    }

    /// Whether the backend session cookie is currently held
    pub fn has_session(&self) -> bool {
        self.cookie_header().is_some_and(|header| {
            header
                .split(';')
                .filter_map(|pair| pair.split_once('='))
                .any(|(name, _)| name.trim() == self.session_cookie)
        })
    }

    /// Cookies held for the backend origin, as a `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.origin)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Put cookies from a previously saved `Cookie` header back into the jar
    pub fn restore_cookies(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.jar.add_cookie_str(pair, &self.origin);
        }
    }

    pub(crate) fn navigate(&self, target: &str) {
        self.navigator.navigate(target);
    }

    async fn attach_csrf_token(&self, request: &mut Request) {
        let token = match self.csrf_token().await {
            Ok(token) => token,
            Err(error) => {
                warn!(error = %error, "failed to fetch CSRF token; sending request without it");
                return;
            }
        };

        match HeaderValue::from_str(&token) {
            Ok(value) => {
                request.headers_mut().insert(self.csrf_header.clone(), value);
            }
            Err(error) => {
                warn!(error = %error, "CSRF token is not a valid header value; sending request without it");
            }
        }
    }

    fn handle_auth_failure(&self, route: &RouteContext) {
        if route.is_auth_page() {
            debug!(route = route.path(), "auth failure on an auth page; not redirecting");
            return;
        }

        info!(
            route = route.path(),
            login = %self.login_path,
            "session rejected by backend; redirecting to login"
        );
        self.navigator.navigate(&self.login_path);
    }

    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Builder for [`PortalClient`]
pub struct PortalClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    navigator: Option<Arc<dyn Navigator>>,
    csrf_header: String,
    csrf_path: String,
    login_path: String,
    session_cookie: String,
    portal_role: Role,
}

impl Default for PortalClientBuilder {
    fn default() -> Self {
        let config = PortalConfig::default();
        Self {
            base_url: None,
            timeout: None,
            user_agent: None,
            navigator: None,
            csrf_header: config.session.csrf_header,
            csrf_path: config.session.csrf_path,
            login_path: config.routes.login_path,
            session_cookie: config.session.cookie_name,
            portal_role: config.portal_role,
        }
    }
}

impl PortalClientBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Where forced navigations (login redirects) are delivered
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    #[must_use]
    pub fn csrf_header(mut self, header: impl Into<String>) -> Self {
        self.csrf_header = header.into();
        self
    }

    #[must_use]
    pub fn csrf_path(mut self, path: impl Into<String>) -> Self {
        self.csrf_path = path.into();
        self
    }

    #[must_use]
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    #[must_use]
    pub const fn portal_role(mut self, role: Role) -> Self {
        self.portal_role = role;
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the base URL is missing or
    /// invalid, or the CSRF header name is not a valid header name
    pub fn build(self) -> Result<PortalClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url: {e}")))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ClientError::Configuration(format!(
                "base_url must use http or https, got '{}'",
                origin.scheme()
            )));
        }

        let csrf_header = HeaderName::from_bytes(self.csrf_header.as_bytes()).map_err(|e| {
            ClientError::Configuration(format!("invalid CSRF header '{}': {e}", self.csrf_header))
        })?;

        let jar = Arc::new(Jar::default());
        let mut client_builder = ClientBuilder::new().cookie_provider(Arc::clone(&jar));

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder.user_agent(concat!(
                "portal-client/",
                env!("CARGO_PKG_VERSION")
            ));
        }

        let http = client_builder.build()?;

        Ok(PortalClient {
            http,
            base_url,
            origin,
            jar,
            navigator: self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator)),
            csrf_header,
            csrf_path: self.csrf_path,
            login_path: self.login_path,
            session_cookie: self.session_cookie,
            portal_role: self.portal_role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::MockNavigator;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builder_requires_base_url() {
        let result = PortalClient::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = PortalClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_builder_rejects_bad_inputs() {
        assert!(matches!(
            PortalClient::new("not a url"),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            PortalClient::builder()
                .base_url("http://localhost:8000")
                .csrf_header("bad header")
                .build(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            PortalClient::new("mailto:ops@lender.test"),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_resource_request_keeps_id_in_one_segment() {
        let client = PortalClient::new("https://lending.example.com/backend/").unwrap();
        let request = client
            .resource_request(Method::GET, &["api", "leads"], &"7/../x?y".into())
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://lending.example.com/backend/api/leads/7%2F..%2Fx%3Fy/"
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = PortalConfig::default();
        config.backend.base_url = "https://lending.example.com/".into();
        config.routes.login_path = "/signin".into();
        config.session.cookie_name = "portal_session".into();

        let client = PortalClient::from_config(&config).build().unwrap();
        assert_eq!(client.base_url(), "https://lending.example.com");
        assert_eq!(client.login_path(), "/signin");

        client.restore_cookies("portal_session=abc");
        assert!(client.has_session());
    }

    #[test]
    fn test_has_session_checks_cookie_name() {
        let client = PortalClient::new("http://localhost:8000").unwrap();
        assert!(!client.has_session());
        assert!(client.cookie_header().is_none());

        client.restore_cookies("csrftoken=t1");
        assert!(!client.has_session());

        client.restore_cookies("sessionid=s1; csrftoken=t2");
        assert!(client.has_session());
        let header = client.cookie_header().unwrap();
        assert!(header.contains("sessionid=s1"));
        assert!(header.contains("csrftoken=t2"));
    }

    #[tokio::test]
    async fn test_forbidden_triggers_single_navigation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bids/my-bids/"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|target| target == "/login")
            .times(1)
            .return_const(());

        let client = PortalClient::builder()
            .base_url(server.uri())
            .navigator(Arc::new(navigator))
            .build()
            .unwrap();

        let route = RouteContext::new("/bids");
        let result = client
            .send(&route, client.request(Method::GET, "/api/bids/my-bids/"))
            .await;
        assert!(matches!(result, Err(ClientError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_auth_page_never_navigates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/user/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().times(0);

        let client = PortalClient::builder()
            .base_url(server.uri())
            .navigator(Arc::new(navigator))
            .build()
            .unwrap();

        let route = RouteContext::new("/register");
        let result = client
            .send(&route, client.request(Method::GET, "/api/auth/user/"))
            .await;
        assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    }
}
