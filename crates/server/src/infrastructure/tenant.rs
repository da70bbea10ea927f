//! Tenant and identity resolution (MyCareHub)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clinical_core::{ClinicalError, Result};

/// Tenant scope of an inbound request, taken from its headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantContext {
    pub organization_id: String,
    pub program_id: Option<String>,
    pub facility_id: Option<String>,
    /// Caller credentials, forwarded to MyCareHub
    pub authorization: Option<String>,
}

/// Identifiers used to tag resources for multi-tenant filtering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantIdentifiers {
    #[serde(rename = "organizationID")]
    pub organization_id: String,
    #[serde(rename = "programID", default)]
    pub program_id: String,
    #[serde(rename = "facilityID", default)]
    pub facility_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[async_trait]
pub trait TenantService: Send + Sync {
    async fn get_tenant_identifiers(&self, ctx: &TenantContext) -> Result<TenantIdentifiers>;

    async fn get_logged_in_user(&self, ctx: &TenantContext) -> Result<UserInfo>;
}

#[derive(Clone)]
pub struct MyCareHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl MyCareHubClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        ctx: &TenantContext,
        context: &str,
    ) -> Result<T> {
        let mut request = self.http.get(url).header("OrganizationID", &ctx.organization_id);
        if let Some(auth) = &ctx.authorization {
            request = request.header("Authorization", auth);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ClinicalError::upstream("mycarehub", context, e))?;
        if !response.status().is_success() {
            return Err(ClinicalError::upstream("mycarehub", context, response.status()));
        }
        response
            .json()
            .await
            .map_err(|e| ClinicalError::upstream("mycarehub", context, e))
    }
}

#[async_trait]
impl TenantService for MyCareHubClient {
    /// Program and facility named on the request win; whatever is missing is
    /// looked up from the organisation.
    async fn get_tenant_identifiers(&self, ctx: &TenantContext) -> Result<TenantIdentifiers> {
        if ctx.organization_id.is_empty() {
            return Err(ClinicalError::validation("organisation id is required"));
        }
        if let (Some(program_id), Some(facility_id)) = (&ctx.program_id, &ctx.facility_id) {
            return Ok(TenantIdentifiers {
                organization_id: ctx.organization_id.clone(),
                program_id: program_id.clone(),
                facility_id: facility_id.clone(),
            });
        }

        let url = format!(
            "{}/api/v1/organisations/{}/tenant-identifiers",
            self.base_url, ctx.organization_id
        );
        let resolved: TenantIdentifiers = self
            .get_json(&url, ctx, "resolve tenant identifiers")
            .await?;
        Ok(TenantIdentifiers {
            organization_id: ctx.organization_id.clone(),
            program_id: ctx.program_id.clone().unwrap_or(resolved.program_id),
            facility_id: ctx.facility_id.clone().unwrap_or(resolved.facility_id),
        })
    }

    async fn get_logged_in_user(&self, ctx: &TenantContext) -> Result<UserInfo> {
        let url = format!("{}/api/v1/users/me", self.base_url);
        self.get_json(&url, ctx, "get logged in user").await
    }
}
