//! In-process fakes of every external collaborator, recording their calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use clinical_core::dto::{Upload, UploadInput};
use clinical_core::{ClinicalError, ContactVerifier, MediaUploader, RegistrationDefaults, Result};

use super::ClinicalUseCases;
use crate::infrastructure::Infrastructure;
use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::fhir::FhirRepository;
use crate::infrastructure::tenant::{TenantContext, TenantIdentifiers, TenantService, UserInfo};
use crate::infrastructure::terminology::{Concept, Terminology};

#[derive(Default)]
pub struct FakeFhir {
    store: Mutex<HashMap<String, JsonValue>>,
    pub creates: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<String>>,
    pub searches: Mutex<Vec<String>>,
    failing_searches: Mutex<HashSet<String>>,
    fail_writes: Mutex<bool>,
}

impl FakeFhir {
    pub fn insert(&self, payload: JsonValue) {
        let key = format!(
            "{}/{}",
            payload["resourceType"].as_str().unwrap_or_default(),
            payload["id"].as_str().unwrap_or_default()
        );
        self.store.lock().unwrap().insert(key, payload);
    }

    pub fn stored(&self, resource_type: &str, id: &str) -> Option<JsonValue> {
        self.store.lock().unwrap().get(&format!("{resource_type}/{id}")).cloned()
    }

    pub fn fail_search(&self, resource_type: &str) {
        self.failing_searches.lock().unwrap().insert(resource_type.to_string());
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub fn create_count(&self, resource_type: &str) -> usize {
        self.creates.lock().unwrap().iter().filter(|t| *t == resource_type).count()
    }

    fn write_error(&self, resource_type: &str) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(ClinicalError::upstream("fhir", format!("write {resource_type}"), "unavailable"));
        }
        Ok(())
    }
}

fn reference_is(value: &JsonValue, expected: &str) -> bool {
    value["reference"].as_str() == Some(expected)
}

fn matches(resource: &JsonValue, key: &str, value: &str) -> bool {
    match key {
        "patient" => reference_is(&resource["subject"], value) || reference_is(&resource["patient"], value),
        "phone" => resource["telecom"]
            .as_array()
            .is_some_and(|t| t.iter().any(|c| c["value"].as_str() == Some(value))),
        "episode-of-care" => resource["episodeOfCare"]
            .as_array()
            .is_some_and(|refs| refs.iter().any(|r| reference_is(r, value))),
        "code" => resource["code"]["coding"]
            .as_array()
            .is_some_and(|c| c.iter().any(|c| c["code"].as_str() == Some(value))),
        _ => true,
    }
}

#[async_trait]
impl FhirRepository for FakeFhir {
    async fn get_resource(&self, resource_type: &str, id: &str) -> Result<JsonValue> {
        self.stored(resource_type, id)
            .ok_or_else(|| ClinicalError::NotFound(format!("{resource_type}/{id}")))
    }

    async fn create_resource(&self, resource_type: &str, mut payload: JsonValue) -> Result<JsonValue> {
        self.creates.lock().unwrap().push(resource_type.to_string());
        self.write_error(resource_type)?;
        if payload["id"].is_null() {
            payload["id"] = json!(uuid::Uuid::new_v4().to_string());
        }
        self.insert(payload.clone());
        Ok(payload)
    }

    async fn update_resource(&self, resource_type: &str, id: &str, payload: JsonValue) -> Result<JsonValue> {
        self.updates.lock().unwrap().push(resource_type.to_string());
        self.write_error(resource_type)?;
        if self.stored(resource_type, id).is_none() {
            return Err(ClinicalError::NotFound(format!("{resource_type}/{id}")));
        }
        self.insert(payload.clone());
        Ok(payload)
    }

    async fn delete_resource(&self, resource_type: &str, id: &str) -> Result<()> {
        self.store.lock().unwrap().remove(&format!("{resource_type}/{id}"));
        Ok(())
    }

    async fn search(&self, resource_type: &str, params: &[(String, String)]) -> Result<Vec<JsonValue>> {
        self.searches.lock().unwrap().push(resource_type.to_string());
        if self.failing_searches.lock().unwrap().contains(resource_type) {
            return Err(ClinicalError::upstream("fhir", format!("search {resource_type}"), "timeout"));
        }
        let prefix = format!("{resource_type}/");
        let store = self.store.lock().unwrap();
        let mut found: Vec<JsonValue> = store
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, v)| v)
            .filter(|v| params.iter().all(|(k, val)| matches(v, k, val)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
        Ok(found)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTerminology {
    pub lookups: Mutex<Vec<String>>,
    pub searches: Mutex<Vec<(String, Option<String>)>>,
    concepts: Mutex<Vec<Concept>>,
    fail: Mutex<bool>,
}

impl FakeTerminology {
    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// Make a concept findable through `search_concepts`.
    pub fn add_concept(&self, id: &str, display_name: &str, concept_class: &str) {
        self.concepts.lock().unwrap().push(Concept {
            id: id.to_string(),
            display_name: display_name.to_string(),
            concept_class: Some(concept_class.to_string()),
            datatype: None,
            url: Some(format!("/orgs/CIEL/sources/CIEL/concepts/{id}/")),
            mappings: vec![],
        });
    }
}

#[async_trait]
impl Terminology for FakeTerminology {
    async fn get_concept(&self, _org: &str, _source: &str, concept_id: &str, _: bool, _: bool) -> Result<Concept> {
        self.lookups.lock().unwrap().push(concept_id.to_string());
        if *self.fail.lock().unwrap() {
            return Err(ClinicalError::upstream("terminology", format!("concept {concept_id}"), "502 Bad Gateway"));
        }
        Ok(Concept {
            id: concept_id.to_string(),
            display_name: format!("Concept {concept_id}"),
            concept_class: None,
            datatype: None,
            url: None,
            mappings: vec![],
        })
    }

    async fn search_concepts(
        &self,
        _org: &str,
        _source: &str,
        query: &str,
        concept_class: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Concept>> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), concept_class.map(str::to_string)));
        if *self.fail.lock().unwrap() {
            return Err(ClinicalError::upstream("terminology", format!("concept search {query}"), "502 Bad Gateway"));
        }
        let query = query.to_lowercase();
        Ok(self
            .concepts
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.display_name.to_lowercase().contains(&query))
            .filter(|c| concept_class.is_none() || c.concept_class.as_deref() == concept_class)
            .take(limit)
            .cloned()
            .collect())
    }
}

pub struct FakeTenant {
    identifiers: Mutex<TenantIdentifiers>,
    fail: Mutex<bool>,
}

impl Default for FakeTenant {
    fn default() -> Self {
        Self {
            identifiers: Mutex::new(TenantIdentifiers {
                organization_id: "org-1".into(),
                program_id: "prog-1".into(),
                facility_id: "fac-1".into(),
            }),
            fail: Mutex::new(false),
        }
    }
}

impl FakeTenant {
    pub fn set_identifiers(&self, org: &str, program: &str, facility: &str) {
        *self.identifiers.lock().unwrap() = TenantIdentifiers {
            organization_id: org.into(),
            program_id: program.into(),
            facility_id: facility.into(),
        };
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl TenantService for FakeTenant {
    async fn get_tenant_identifiers(&self, _ctx: &TenantContext) -> Result<TenantIdentifiers> {
        if *self.fail.lock().unwrap() {
            return Err(ClinicalError::upstream("mycarehub", "resolve tenant identifiers", "503"));
        }
        Ok(self.identifiers.lock().unwrap().clone())
    }

    async fn get_logged_in_user(&self, _ctx: &TenantContext) -> Result<UserInfo> {
        Ok(UserInfo {
            user_id: "user-1".into(),
            name: "Nurse Wanjiru".into(),
            ..Default::default()
        })
    }
}

#[derive(Default)]
pub struct FakeEvents {
    pub published: Mutex<Vec<(String, JsonValue)>>,
    fail: Mutex<bool>,
}

impl FakeEvents {
    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn topics(&self) -> Vec<String> {
        self.published.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl EventPublisher for FakeEvents {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(ClinicalError::upstream("pubsub", format!("publish {topic}"), "unavailable"));
        }
        let body = serde_json::from_slice(&payload).unwrap_or(JsonValue::Null);
        self.published.lock().unwrap().push((topic.to_string(), body));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeVerifier {
    pub otp_checks: Mutex<Vec<String>>,
}

#[async_trait]
impl ContactVerifier for FakeVerifier {
    async fn verify_otp(&self, msisdn: &str, otp: &str) -> Result<bool> {
        self.otp_checks.lock().unwrap().push(msisdn.to_string());
        Ok(otp == "1234")
    }

    async fn validate_email(&self, _email: &str, _communication_opt_in: bool) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUploader;

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(&self, input: UploadInput) -> Result<Upload> {
        Ok(Upload {
            id: "upload-1".into(),
            url: format!("https://media.example.com/{}", input.filename),
            hash: "abc123".into(),
            base64data: input.base64data,
            content_type: input.content_type,
        })
    }
}

/// Every fake, shared with the use cases built from it
#[derive(Clone, Default)]
pub struct Fakes {
    pub fhir: Arc<FakeFhir>,
    pub terminology: Arc<FakeTerminology>,
    pub tenant: Arc<FakeTenant>,
    pub events: Arc<FakeEvents>,
    pub verifier: Arc<FakeVerifier>,
    pub media: Arc<FakeUploader>,
}

impl Fakes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infrastructure(&self) -> Infrastructure {
        Infrastructure {
            fhir: self.fhir.clone(),
            terminology: self.terminology.clone(),
            tenant: self.tenant.clone(),
            events: self.events.clone(),
            verifier: self.verifier.clone(),
            media: self.media.clone(),
        }
    }

    pub fn usecases(&self) -> ClinicalUseCases {
        ClinicalUseCases::new(self.infrastructure(), RegistrationDefaults::default())
    }
}

pub fn tenant() -> TenantContext {
    TenantContext {
        organization_id: "org-1".into(),
        ..Default::default()
    }
}

/// Store an encounter for patient `p1` in the given status.
pub fn seed_encounter(fhir: &FakeFhir, id: &str, status: &str) {
    fhir.insert(json!({
        "resourceType": "Encounter",
        "id": id,
        "status": status,
        "class": {"system": "http://terminology.hl7.org/CodeSystem/v3-ActCode", "code": "AMB", "display": "ambulatory"},
        "subject": {"reference": "Patient/p1", "type": "Patient"},
        "period": {"start": "2024-01-01T08:00:00Z"}
    }));
}

/// Store an episode of care for patient `p1` in the given status.
pub fn seed_episode(fhir: &FakeFhir, id: &str, status: &str) {
    fhir.insert(json!({
        "resourceType": "EpisodeOfCare",
        "id": id,
        "status": status,
        "patient": {"reference": "Patient/p1", "type": "Patient"},
        "period": {"start": "2024-01-01T08:00:00Z"}
    }));
}
