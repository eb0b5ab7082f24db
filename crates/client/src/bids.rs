//! Bid API client methods

use crate::client::PortalClient;
use crate::error::ApiError;
use crate::navigation::RouteContext;
use portal_core::{Bid, PlaceBidRequest, ResourceId};
use reqwest::Method;

impl PortalClient {
    /// List the bids placed by the signed-in lender
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn my_bids(&self, route: &RouteContext) -> Result<Vec<Bid>, ApiError> {
        let request = self.request(Method::GET, "/api/bids/my-bids/");
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, "Failed to fetch bids"))
    }

    /// Bid on a loan estimate
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn place_bid(
        &self,
        route: &RouteContext,
        loan_estimate_id: ResourceId,
        amount: f64,
    ) -> Result<Bid, ApiError> {
        let request = self
            .request(Method::POST, "/api/bids/")
            .json(&PlaceBidRequest {
                loan_estimate_id,
                amount,
            });
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, "Failed to place bid"))
    }
}
