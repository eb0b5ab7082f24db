//! Lead API client methods

use crate::client::PortalClient;
use crate::error::ApiError;
use crate::navigation::RouteContext;
use portal_core::{Lead, LeadStatus, LeadUpdate, ResourceId};
use reqwest::Method;

impl PortalClient {
    /// List the leads assigned to the signed-in lender
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn my_leads(&self, route: &RouteContext) -> Result<Vec<Lead>, ApiError> {
        let request = self.request(Method::GET, "/api/leads/my-leads/");
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, "Failed to fetch leads"))
    }

    /// Move a lead to a new status, optionally replacing its notes
    ///
    /// # Errors
    ///
    /// Returns the normalized backend message on failure
    pub async fn update_lead(
        &self,
        route: &RouteContext,
        lead_id: &ResourceId,
        status: LeadStatus,
        notes: Option<String>,
    ) -> Result<Lead, ApiError> {
        let request = self
            .resource_request(Method::PATCH, &["api", "leads"], lead_id)
            .json(&LeadUpdate { status, notes });
        self.execute(route, request)
            .await
            .map_err(|e| ApiError::from_client(e, "Failed to update lead status"))
    }
}
