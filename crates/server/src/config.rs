//! Server configuration

use std::time::Duration;

use clinical_core::RegistrationDefaults;
use clinical_core::model::Language;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Base URL of the remote FHIR store, e.g. `https://fhir.example.com/fhir`
    pub fhir_base_url: String,
    pub fhir_access_token: Option<String>,
    pub ocl_base_url: String,
    pub ocl_token: Option<String>,
    pub mycarehub_base_url: String,
    pub otp_service_url: String,
    pub media_service_url: String,
    pub pubsub_base_url: String,
    pub google_cloud_project: String,
    pub pubsub_access_token: Option<String>,
    pub environment: String,
    pub service_name: String,
    pub http_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub defaults: RegistrationDefaults,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut defaults = RegistrationDefaults::default();
        if let Some(country) = optional_var("DEFAULT_COUNTRY") {
            defaults.country = country;
        }
        if let Some(language) = optional_var("DEFAULT_LANGUAGE") {
            match language.parse::<Language>() {
                Ok(language) => defaults.language = language,
                Err(e) => tracing::warn!(error = %e, "Ignoring DEFAULT_LANGUAGE"),
            }
        }

        Self {
            bind_address: var_or("BIND_ADDRESS", "0.0.0.0:8080"),
            fhir_base_url: var_or("FHIR_BASE_URL", "http://localhost:8081/fhir"),
            fhir_access_token: optional_var("FHIR_ACCESS_TOKEN"),
            ocl_base_url: var_or("OCL_BASE_URL", "https://api.openconceptlab.org"),
            ocl_token: optional_var("OCL_TOKEN"),
            mycarehub_base_url: var_or("MYCAREHUB_BASE_URL", "http://localhost:8082"),
            otp_service_url: var_or("OTP_SERVICE_URL", "http://localhost:8083"),
            media_service_url: var_or("MEDIA_SERVICE_URL", "http://localhost:8084"),
            pubsub_base_url: var_or("PUBSUB_BASE_URL", "https://pubsub.googleapis.com"),
            google_cloud_project: var_or("GOOGLE_CLOUD_PROJECT", "local"),
            pubsub_access_token: optional_var("PUBSUB_ACCESS_TOKEN"),
            environment: var_or("ENVIRONMENT", "local"),
            service_name: var_or("SERVICE_NAME", "clinical"),
            http_timeout: Duration::from_secs(
                var_or("HTTP_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            ),
            cors_origins: var_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            rate_limit_rps: var_or("RATE_LIMIT_RPS", "100").parse().unwrap_or(100),
            defaults,
        }
    }
}
