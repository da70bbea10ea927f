//! OpenConceptLab terminology client

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use clinical_core::{ClinicalError, Result};

/// A coded clinical term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub concept_class: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mappings: Vec<JsonValue>,
}

#[async_trait]
pub trait Terminology: Send + Sync {
    async fn get_concept(
        &self,
        org: &str,
        source: &str,
        concept_id: &str,
        include_mappings: bool,
        include_inverse_mappings: bool,
    ) -> Result<Concept>;

    /// Free-text search within a source, optionally restricted to one
    /// concept class. At most `limit` concepts are returned.
    async fn search_concepts(
        &self,
        org: &str,
        source: &str,
        query: &str,
        concept_class: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Concept>>;
}

#[derive(Clone)]
pub struct OclClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl OclClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Token {token}")),
            None => request,
        }
    }
}

#[async_trait]
impl Terminology for OclClient {
    async fn get_concept(
        &self,
        org: &str,
        source: &str,
        concept_id: &str,
        include_mappings: bool,
        include_inverse_mappings: bool,
    ) -> Result<Concept> {
        let context = format!("concept {org}/{source}/{concept_id}");
        let url = format!(
            "{}/orgs/{}/sources/{}/concepts/{}/",
            self.base_url, org, source, concept_id
        );

        let request = self.http.get(&url).query(&[
            ("includeMappings", include_mappings),
            ("includeInverseMappings", include_inverse_mappings),
        ]);

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ClinicalError::upstream("terminology", &context, e))?;

        match response.status() {
            status if status.is_success() => response
                .json::<Concept>()
                .await
                .map_err(|e| ClinicalError::upstream("terminology", &context, e)),
            StatusCode::NOT_FOUND => Err(ClinicalError::NotFound(context)),
            status => Err(ClinicalError::upstream("terminology", &context, status)),
        }
    }

    async fn search_concepts(
        &self,
        org: &str,
        source: &str,
        query: &str,
        concept_class: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Concept>> {
        let context = format!("concept search {org}/{source} q={query}");
        let url = format!("{}/orgs/{}/sources/{}/concepts/", self.base_url, org, source);

        let mut params = vec![("q", query.to_string()), ("limit", limit.to_string())];
        if let Some(class) = concept_class {
            params.push(("conceptClass", class.to_string()));
        }

        let response = self
            .authorized(self.http.get(&url).query(&params))
            .send()
            .await
            .map_err(|e| ClinicalError::upstream("terminology", &context, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClinicalError::upstream("terminology", &context, status));
        }
        let mut concepts: Vec<Concept> = response
            .json()
            .await
            .map_err(|e| ClinicalError::upstream("terminology", &context, e))?;
        concepts.truncate(limit);
        Ok(concepts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_concept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/CIEL/sources/CIEL/concepts/5088/"))
            .and(query_param("includeMappings", "false"))
            .and(header("Authorization", "Token secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "5088",
                "display_name": "Temperature (C)",
                "concept_class": "Finding",
                "datatype": "Numeric"
            })))
            .mount(&server)
            .await;

        let client = OclClient::new(reqwest::Client::new(), &server.uri(), Some("secret".into()));
        let concept = client.get_concept("CIEL", "CIEL", "5088", false, false).await.unwrap();
        assert_eq!(concept.display_name, "Temperature (C)");
        assert_eq!(concept.datatype.as_deref(), Some("Numeric"));
    }

    #[tokio::test]
    async fn test_failure_names_dependency() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = OclClient::new(reqwest::Client::new(), &server.uri(), None);
        let err = client.get_concept("CIEL", "CIEL", "5088", false, false).await.unwrap_err();
        assert!(err.to_string().starts_with("terminology error: concept CIEL/CIEL/5088"));
    }

    #[tokio::test]
    async fn test_search_concepts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/CIEL/sources/CIEL/concepts/"))
            .and(query_param("q", "penicillin"))
            .and(query_param("conceptClass", "Drug"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "81724", "display_name": "Penicillin", "concept_class": "Drug"},
                {"id": "784", "display_name": "Penicillin G", "concept_class": "Drug"},
                {"id": "71160", "display_name": "Penicillin V", "concept_class": "Drug"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = OclClient::new(reqwest::Client::new(), &server.uri(), None);
        let concepts = client
            .search_concepts("CIEL", "CIEL", "penicillin", Some("Drug"), 2)
            .await
            .unwrap();
        let ids: Vec<_> = concepts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["81724", "784"]);
    }

    #[tokio::test]
    async fn test_search_failure_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = OclClient::new(reqwest::Client::new(), &server.uri(), None);
        let err = client
            .search_concepts("CIEL", "CIEL", "penicillin", None, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicalError::Upstream { .. }));
    }
}
