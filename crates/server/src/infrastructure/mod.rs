//! Clients for every external collaborator.

pub mod events;
pub mod fhir;
pub mod media;
pub mod resources;
pub mod tenant;
pub mod terminology;
pub mod verification;

use std::sync::Arc;

use clinical_core::{ClinicalError, ContactVerifier, MediaUploader, Result};

use crate::config::Config;
use events::{EventPublisher, PubSubPublisher};
use fhir::{FhirRepository, HttpFhirRepository};
use media::HttpMediaUploader;
use tenant::{MyCareHubClient, TenantService};
use terminology::{OclClient, Terminology};
use verification::HttpContactVerifier;

/// Shared handles to the external services, cheap to clone
#[derive(Clone)]
pub struct Infrastructure {
    pub fhir: Arc<dyn FhirRepository>,
    pub terminology: Arc<dyn Terminology>,
    pub tenant: Arc<dyn TenantService>,
    pub events: Arc<dyn EventPublisher>,
    pub verifier: Arc<dyn ContactVerifier>,
    pub media: Arc<dyn MediaUploader>,
}

impl Infrastructure {
    /// Build HTTP clients for every service from configuration.
    ///
    /// All clients share one connection pool and request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("clinical-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClinicalError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            fhir: Arc::new(HttpFhirRepository::new(
                http.clone(),
                &config.fhir_base_url,
                config.fhir_access_token.clone(),
            )),
            terminology: Arc::new(OclClient::new(
                http.clone(),
                &config.ocl_base_url,
                config.ocl_token.clone(),
            )),
            tenant: Arc::new(MyCareHubClient::new(http.clone(), &config.mycarehub_base_url)),
            events: Arc::new(PubSubPublisher::new(
                http.clone(),
                &config.pubsub_base_url,
                &config.google_cloud_project,
                config.pubsub_access_token.clone(),
                &config.service_name,
                &config.environment,
            )),
            verifier: Arc::new(HttpContactVerifier::new(http.clone(), &config.otp_service_url)),
            media: Arc::new(HttpMediaUploader::new(http, &config.media_service_url)),
        })
    }
}
