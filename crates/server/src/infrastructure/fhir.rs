//! Remote FHIR store adapter

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::Value as JsonValue;

use clinical_core::{Bundle, ClinicalError, OperationOutcome, Result};

/// Upper bound on followed `next` links for one search
const MAX_SEARCH_PAGES: usize = 50;

/// CRUD and search over raw FHIR JSON.
///
/// Implementations own no business logic; they only move payloads to and
/// from the store and translate transport failures into [`ClinicalError`].
#[async_trait]
pub trait FhirRepository: Send + Sync {
    async fn get_resource(&self, resource_type: &str, id: &str) -> Result<JsonValue>;

    /// Create a resource. A payload that already carries an `id` is stored
    /// under that id.
    async fn create_resource(&self, resource_type: &str, payload: JsonValue) -> Result<JsonValue>;

    async fn update_resource(
        &self,
        resource_type: &str,
        id: &str,
        payload: JsonValue,
    ) -> Result<JsonValue>;

    async fn delete_resource(&self, resource_type: &str, id: &str) -> Result<()>;

    /// Every matching resource, following the store's pagination.
    async fn search(
        &self,
        resource_type: &str,
        params: &[(String, String)],
    ) -> Result<Vec<JsonValue>>;

    /// Cheap reachability check used by `/health`
    async fn ping(&self) -> Result<()>;
}

/// [`FhirRepository`] over the FHIR REST API
#[derive(Clone)]
pub struct HttpFhirRepository {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpFhirRepository {
    pub fn new(http: reqwest::Client, base_url: &str, access_token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/fhir+json")
            .header("Prefer", "return=representation");
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send_error(context: &str, err: reqwest::Error) -> ClinicalError {
        ClinicalError::upstream("fhir", context, err)
    }

    /// Map a non-success response onto the error taxonomy.
    async fn check(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let detail = OperationOutcome::from_body(&body)
            .map(|o| o.diagnostics())
            .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());

        Err(match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => ClinicalError::NotFound(context.to_string()),
            StatusCode::CONFLICT => ClinicalError::AlreadyExists(format!("{context}: {detail}")),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClinicalError::validation(format!("{context} rejected by FHIR store: {detail}"))
            }
            _ => ClinicalError::upstream("fhir", context, format!("{status}: {detail}")),
        })
    }

    /// Whether `url` points into this store. Only such links get the
    /// bearer token.
    fn is_store_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.base_url)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    }

    async fn json(response: Response, context: &str) -> Result<JsonValue> {
        response
            .json::<JsonValue>()
            .await
            .map_err(|e| ClinicalError::upstream("fhir", context, e))
    }
}

#[async_trait]
impl FhirRepository for HttpFhirRepository {
    async fn get_resource(&self, resource_type: &str, id: &str) -> Result<JsonValue> {
        let context = format!("{resource_type}/{id}");
        let url = format!("{}/{}/{}", self.base_url, resource_type, id);
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| Self::send_error(&context, e))?;
        let response = Self::check(response, &context).await?;
        Self::json(response, &context).await
    }

    async fn create_resource(&self, resource_type: &str, payload: JsonValue) -> Result<JsonValue> {
        let context = format!("create {resource_type}");
        // Client-assigned ids go through update-as-create so the id survives.
        let request = match payload.get("id").and_then(JsonValue::as_str) {
            Some(id) => self.request(
                reqwest::Method::PUT,
                &format!("{}/{}/{}", self.base_url, resource_type, id),
            ),
            None => self.request(
                reqwest::Method::POST,
                &format!("{}/{}", self.base_url, resource_type),
            ),
        };
        let response = request
            .header("Content-Type", "application/fhir+json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Self::send_error(&context, e))?;
        let response = Self::check(response, &context).await?;
        tracing::debug!(resource_type, "Created FHIR resource");
        Self::json(response, &context).await
    }

    async fn update_resource(
        &self,
        resource_type: &str,
        id: &str,
        payload: JsonValue,
    ) -> Result<JsonValue> {
        let context = format!("update {resource_type}/{id}");
        let url = format!("{}/{}/{}", self.base_url, resource_type, id);
        let response = self
            .request(reqwest::Method::PUT, &url)
            .header("Content-Type", "application/fhir+json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Self::send_error(&context, e))?;
        let response = Self::check(response, &context).await?;
        Self::json(response, &context).await
    }

    async fn delete_resource(&self, resource_type: &str, id: &str) -> Result<()> {
        let context = format!("delete {resource_type}/{id}");
        let url = format!("{}/{}/{}", self.base_url, resource_type, id);
        let response = self
            .request(reqwest::Method::DELETE, &url)
            .send()
            .await
            .map_err(|e| Self::send_error(&context, e))?;
        Self::check(response, &context).await?;
        Ok(())
    }

    async fn search(
        &self,
        resource_type: &str,
        params: &[(String, String)],
    ) -> Result<Vec<JsonValue>> {
        let context = format!("search {resource_type}");
        let first = self
            .request(reqwest::Method::GET, &format!("{}/{}", self.base_url, resource_type))
            .query(params);

        let mut resources = Vec::new();
        let mut next_request = Some(first);
        let mut pages = 0;

        while let Some(request) = next_request.take() {
            let response = request
                .send()
                .await
                .map_err(|e| Self::send_error(&context, e))?;
            let response = Self::check(response, &context).await?;
            let bundle: Bundle = response
                .json()
                .await
                .map_err(|e| ClinicalError::upstream("fhir", &context, e))?;

            pages += 1;
            match bundle.next_link() {
                Some(url) if !self.is_store_url(url) => {
                    return Err(ClinicalError::upstream(
                        "fhir",
                        &context,
                        format!("next link {url} is outside {}", self.base_url),
                    ));
                }
                Some(url) if pages < MAX_SEARCH_PAGES => {
                    next_request = Some(self.request(reqwest::Method::GET, url));
                }
                Some(_) => tracing::warn!(resource_type, pages, "Search truncated at page limit"),
                None => {}
            }
            resources.extend(bundle.into_resources());
        }

        Ok(resources)
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/metadata", self.base_url);
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| Self::send_error("metadata", e))?;
        Self::check(response, "metadata").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo(server: &MockServer) -> HttpFhirRepository {
        HttpFhirRepository::new(reqwest::Client::new(), &server.uri(), None)
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Patient/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = repo(&server).get_resource("Patient", "missing").await.unwrap_err();
        assert_eq!(err, ClinicalError::NotFound("Patient/missing".to_string()));
    }

    #[tokio::test]
    async fn test_create_with_id_uses_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/Patient/abc"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"resourceType": "Patient", "id": "abc"})))
            .expect(1)
            .mount(&server)
            .await;

        let created = repo(&server)
            .create_resource("Patient", json!({"resourceType": "Patient", "id": "abc"}))
            .await
            .unwrap();
        assert_eq!(created["id"], "abc");
    }

    #[tokio::test]
    async fn test_search_follows_next_link() {
        let server = MockServer::start().await;
        let next = format!("{}/Observation/page2", server.uri());
        Mock::given(method("GET"))
            .and(path("/Observation"))
            .and(query_param("patient", "Patient/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "type": "searchset",
                "link": [{"relation": "next", "url": next}],
                "entry": [{"resource": {"resourceType": "Observation", "id": "o1"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Observation/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "type": "searchset",
                "entry": [{"resource": {"resourceType": "Observation", "id": "o2"}}]
            })))
            .mount(&server)
            .await;

        let params = vec![("patient".to_string(), "Patient/p1".to_string())];
        let found = repo(&server).search("Observation", &params).await.unwrap();
        let ids: Vec<_> = found.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
    }

    #[tokio::test]
    async fn test_server_error_is_wrapped_with_context() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Encounter/e1"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "resourceType": "OperationOutcome",
                "issue": [{"severity": "error", "code": "transient", "diagnostics": "store down"}]
            })))
            .mount(&server)
            .await;

        let err = repo(&server).get_resource("Encounter", "e1").await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ClinicalError::Upstream { dependency: "fhir", .. }));
        assert!(message.contains("Encounter/e1"));
        assert!(message.contains("store down"));
    }

    #[tokio::test]
    async fn test_foreign_next_link_is_not_followed() {
        let server = MockServer::start().await;
        let elsewhere = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Condition"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "type": "searchset",
                "link": [{"relation": "next", "url": format!("{}/Condition/page2", elsewhere.uri())}],
                "entry": [{"resource": {"resourceType": "Condition", "id": "c1"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&elsewhere)
            .await;

        let repo = HttpFhirRepository::new(reqwest::Client::new(), &server.uri(), Some("secret".into()));
        let err = repo.search("Condition", &[]).await.unwrap_err();
        assert!(matches!(err, ClinicalError::Upstream { dependency: "fhir", .. }));
        assert!(err.to_string().contains("outside"), "{err}");
    }

    #[test]
    fn test_store_url_prefix() {
        let repo = HttpFhirRepository::new(reqwest::Client::new(), "https://store.example/fhir/", None);
        assert!(repo.is_store_url("https://store.example/fhir/Patient?_page_token=x"));
        assert!(repo.is_store_url("https://store.example/fhir?_getpages=abc"));
        assert!(!repo.is_store_url("https://store.example/fhirish/Patient"));
        assert!(!repo.is_store_url("https://evil.example/fhir/Patient"));
    }

    #[tokio::test]
    async fn test_update_puts_payload_at_id() {
        let server = MockServer::start().await;
        let payload = json!({"resourceType": "Encounter", "id": "e1", "status": "finished"});
        Mock::given(method("PUT"))
            .and(path("/Encounter/e1"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
            .expect(1)
            .mount(&server)
            .await;

        let updated = repo(&server)
            .update_resource("Encounter", "e1", payload.clone())
            .await
            .unwrap();
        assert_eq!(updated, payload);
    }

    #[tokio::test]
    async fn test_update_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/Encounter/e1"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "resourceType": "OperationOutcome",
                "issue": [{"severity": "error", "code": "conflict", "diagnostics": "version mismatch"}]
            })))
            .mount(&server)
            .await;

        let err = repo(&server)
            .update_resource("Encounter", "e1", json!({"resourceType": "Encounter", "id": "e1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicalError::AlreadyExists(ref m) if m.contains("version mismatch")));
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/Patient/p1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/Patient/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let repo = repo(&server);
        repo.delete_resource("Patient", "p1").await.unwrap();
        let err = repo.delete_resource("Patient", "gone").await.unwrap_err();
        assert!(matches!(err, ClinicalError::NotFound(_)));
    }
}
