//! Profile and loan estimate API client methods

use crate::client::PortalClient;
use crate::error::ApiError;
use crate::navigation::RouteContext;
use portal_core::{LoanEstimate, MessageResponse, ProfileUpdate, ResourceId};
use reqwest::Method;

impl PortalClient {
    /// Update company, phone or location on the lender profile
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn update_profile(
        &self,
        route: &RouteContext,
        update: &ProfileUpdate,
    ) -> Result<MessageResponse, ApiError> {
        let request = self.request(Method::PATCH, "/api/profile/").json(update);
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, "Failed to update profile"))
    }

    /// List loan estimates open for bidding
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn loan_estimates(&self, route: &RouteContext) -> Result<Vec<LoanEstimate>, ApiError> {
        let request = self.request(Method::GET, "/api/loan-estimates/");
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, "Failed to fetch loan estimates"))
    }

    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn loan_estimate(
        &self,
        route: &RouteContext,
        id: &ResourceId,
    ) -> Result<LoanEstimate, ApiError> {
        let request = self.resource_request(Method::GET, &["api", "loan-estimates"], id);
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, "Failed to fetch loan estimate"))
    }
}
