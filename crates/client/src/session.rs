//! Sign-in state tied to the application store.
//!
//! Wraps the auth calls of [`PortalClient`] and performs the follow-up steps
//! each one implies: caching the user, clearing state on logout and moving
//! to the right page.

use crate::auth::SignedIn;
use crate::client::PortalClient;
use crate::error::ApiError;
use crate::navigation::RouteContext;
use portal_core::{AppStore, GateConfig, LoginRequest, MessageResponse, RegisterRequest, User};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AuthSession {
    client: PortalClient,
    store: AppStore,
    home_path: String,
}

impl AuthSession {
    pub fn new(client: PortalClient, store: AppStore) -> Self {
        Self::with_routes(client, store, &GateConfig::default())
    }

    /// Use the home page from the gate configuration
    pub fn with_routes(client: PortalClient, store: AppStore, routes: &GateConfig) -> Self {
        Self {
            client,
            store,
            home_path: routes.home_path.clone(),
        }
    }

    pub const fn client(&self) -> &PortalClient {
        &self.client
    }

    pub const fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn user(&self) -> Option<User> {
        self.store.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Refresh the cached user from the backend.
    ///
    /// Login and registration pages never look the user up; the cached value
    /// is returned as is.
    ///
    /// # Errors
    ///
    /// Any lookup failure other than "not signed in"
    pub async fn load_user(&self, route: &RouteContext) -> Result<Option<User>, ApiError> {
        if route.is_auth_page() {
            return Ok(self.store.user());
        }

        let user = self.client.current_user(route).await?;
        self.store.set_user(user.clone());
        Ok(user)
    }

    /// Sign in, cache the user and go to the home page
    ///
    /// # Errors
    ///
    /// See [`PortalClient::login`]; nothing is cached on failure
    pub async fn login(
        &self,
        route: &RouteContext,
        credentials: &LoginRequest,
    ) -> Result<SignedIn, ApiError> {
        let signed_in = self.client.login(route, credentials).await?;
        self.enter(&signed_in);
        Ok(signed_in)
    }

    /// Register, cache the new user and go to the home page
    ///
    /// # Errors
    ///
    /// See [`PortalClient::register`]; nothing is cached on failure
    pub async fn register(
        &self,
        route: &RouteContext,
        registration: &RegisterRequest,
    ) -> Result<SignedIn, ApiError> {
        let signed_in = self.client.register(route, registration).await?;
        self.enter(&signed_in);
        Ok(signed_in)
    }

    /// Sign out, drop all session state and go to the login page
    ///
    /// # Errors
    ///
    /// See [`PortalClient::logout`]; state is kept on failure
    pub async fn logout(&self, route: &RouteContext) -> Result<MessageResponse, ApiError> {
        let response = self.client.logout(route).await?;
        self.store.reset();
        info!("signed out");
        self.client.navigate(self.client.login_path());
        Ok(response)
    }

    fn enter(&self, signed_in: &SignedIn) {
        self.store.set_user(Some(signed_in.user.clone()));
        info!(email = %signed_in.user.email, "signed in");
        self.client.navigate(&self.home_path);
    }
}
