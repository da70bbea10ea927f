//! Event publication to Google Cloud Pub/Sub

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::json;

use clinical_core::{ClinicalError, Result};

pub const PATIENT_CREATED_TOPIC: &str = "patient.create";
pub const VITALS_TOPIC: &str = "vitals.create";
pub const ORGANIZATION_TOPIC: &str = "organization.create";

const TOPIC_VERSION: &str = "v1";

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `payload` to the un-namespaced `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
}

/// `<service>-<topic>-<environment>-v1`
pub fn namespaced_topic(service: &str, topic: &str, environment: &str) -> String {
    format!("{service}-{topic}-{environment}-{TOPIC_VERSION}")
}

/// Serialize and publish an event, logging instead of failing.
///
/// Events are a side channel: the resource they describe is already stored
/// when this runs, so a publication failure must not fail the request.
pub async fn publish_best_effort<E: Serialize>(publisher: &dyn EventPublisher, topic: &str, event: &E) {
    let payload = match serde_json::to_vec(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(target: "error_tracking", topic, error = %e, "Failed to encode event");
            return;
        }
    };

    if let Err(e) = publisher.publish(topic, payload).await {
        metrics::counter!("event_publish_failures_total", "topic" => topic.to_string()).increment(1);
        tracing::error!(target: "error_tracking", topic, error = %e, "Failed to publish event");
    }
}

#[derive(Clone)]
pub struct PubSubPublisher {
    http: reqwest::Client,
    base_url: String,
    project: String,
    access_token: Option<String>,
    service_name: String,
    environment: String,
}

impl PubSubPublisher {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        project: &str,
        access_token: Option<String>,
        service_name: &str,
        environment: &str,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.to_string(),
            access_token,
            service_name: service_name.to_string(),
            environment: environment.to_string(),
        }
    }
}

#[async_trait]
impl EventPublisher for PubSubPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let topic_id = namespaced_topic(&self.service_name, topic, &self.environment);
        let url = format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.base_url, self.project, topic_id
        );
        let body = json!({
            "messages": [{
                "data": STANDARD.encode(&payload),
                "attributes": {
                    "topicID": topic,
                    "serviceName": self.service_name,
                    "version": TOPIC_VERSION,
                }
            }]
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let context = format!("publish to {topic_id}");
        let response = request
            .send()
            .await
            .map_err(|e| ClinicalError::upstream("pubsub", &context, e))?;
        if !response.status().is_success() {
            return Err(ClinicalError::upstream("pubsub", &context, response.status()));
        }
        tracing::debug!(topic = %topic_id, "Published event");
        Ok(())
    }
}
