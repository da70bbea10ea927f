//! OTP and email verification

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use clinical_core::{ClinicalError, ContactVerifier, Result};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OtpVerification {
    is_verified: bool,
}

/// [`ContactVerifier`] backed by the OTP service
#[derive(Clone)]
pub struct HttpContactVerifier {
    http: reqwest::Client,
    base_url: String,
}

impl HttpContactVerifier {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[async_trait]
impl ContactVerifier for HttpContactVerifier {
    async fn verify_otp(&self, msisdn: &str, otp: &str) -> Result<bool> {
        let url = format!("{}/verify_otp/", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({"msisdn": msisdn, "verificationCode": otp}))
            .send()
            .await
            .map_err(|e| ClinicalError::upstream("otp", "verify otp", e))?;
        if !response.status().is_success() {
            return Err(ClinicalError::upstream("otp", "verify otp", response.status()));
        }
        let verification: OtpVerification = response
            .json()
            .await
            .map_err(|e| ClinicalError::upstream("otp", "verify otp", e))?;
        Ok(verification.is_verified)
    }

    /// Checks the address locally, then records the opt-in choice.
    async fn validate_email(&self, email: &str, communication_opt_in: bool) -> Result<()> {
        if !is_plausible_email(email) {
            return Err(ClinicalError::validation(format!("invalid email: {email}")));
        }
        if !communication_opt_in {
            return Ok(());
        }

        let url = format!("{}/email_opt_in/", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({"email": email, "optIn": true}))
            .send()
            .await
            .map_err(|e| ClinicalError::upstream("otp", "record email opt-in", e))?;
        if !response.status().is_success() {
            return Err(ClinicalError::upstream(
                "otp",
                "record email opt-in",
                response.status(),
            ));
        }
        Ok(())
    }
}
