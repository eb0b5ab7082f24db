//! Authentication API client methods

use crate::client::PortalClient;
use crate::error::{ApiError, ClientError};
use crate::navigation::RouteContext;
use portal_core::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, User};
use reqwest::Method;
use tracing::warn;

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";
const LOGOUT_FAILED: &str = "Logout failed. Please try again.";
const CURRENT_USER_FAILED: &str = "Failed to fetch current user";

/// A login or registration that passed the portal role check
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub user: User,
    pub message: Option<String>,
}

impl PortalClient {
    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure, or an access-denied
    /// error when the account does not have the portal role
    pub async fn login(
        &self,
        route: &RouteContext,
        credentials: &LoginRequest,
    ) -> Result<SignedIn, ApiError> {
        let request = self
            .request(Method::POST, "/api/auth/login/")
            .json(credentials);
        let response = self
            .execute::<AuthResponse>(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, LOGIN_FAILED))?;
        self.check_portal_role(response)
    }

    /// Create a new account
    ///
    /// # Errors
    ///
    /// Returns the per-field validation messages on failure, or an
    /// access-denied error when the new account does not have the portal role
    pub async fn register(
        &self,
        route: &RouteContext,
        registration: &RegisterRequest,
    ) -> Result<SignedIn, ApiError> {
        let request = self
            .request(Method::POST, "/api/auth/register/")
            .json(registration);
        let response = self
            .execute::<AuthResponse>(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, REGISTER_FAILED))?;
        self.check_portal_role(response)
    }

    /// End the backend session
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn logout(&self, route: &RouteContext) -> Result<MessageResponse, ApiError> {
        let request = self.request(Method::POST, "/api/auth/logout/");
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, LOGOUT_FAILED))
    }

    /// Fetch the signed-in user. A 401 means nobody is signed in and yields `None`.
    ///
    /// # Errors
    ///
    /// Any failure other than a 401
    pub async fn current_user(&self, route: &RouteContext) -> Result<Option<User>, ApiError> {
        let request = self.request(Method::GET, "/api/auth/user/");
        match self.execute::<User>(route, request).await {
            Ok(user) => Ok(Some(user)),
            Err(ClientError::AuthenticationFailed(_)) => Ok(None),
            Err(error) => Err(ApiError::from_client(error, CURRENT_USER_FAILED)),
        }
    }

    fn check_portal_role(&self, response: AuthResponse) -> Result<SignedIn, ApiError> {
        match response.user {
            Some(user) if user.has_role(self.portal_role()) => Ok(SignedIn {
                user,
                message: response.message,
            }),
            Some(user) => {
                warn!(email = %user.email, role = %user.role, "account role not allowed in this portal");
                Err(ApiError::access_denied())
            }
            None => {
                warn!("auth response carried no user");
                Err(ApiError::access_denied())
            }
        }
    }
}
