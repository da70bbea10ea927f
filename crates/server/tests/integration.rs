//! Integration tests for the clinical server.
//!
//! Every upstream (FHIR store, OCL, MyCareHub, OTP, media, Pub/Sub) is a
//! wiremock server, and requests go through the full Axum router.

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

use clinical_core::RegistrationDefaults;
use clinical_server::config::Config;
use clinical_server::infrastructure::Infrastructure;
use clinical_server::usecases::ClinicalUseCases;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ORGANIZATION_ID: &str = "org-1";
const PATIENT_ID: &str = "8ac3d1d4-2f6e-4b8e-9a0e-6b4b2f0c6a11";

/// Answers a write with the resource it was sent, as a FHIR store does.
struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        ResponseTemplate::new(201).set_body_bytes(request.body.clone())
    }
}

/// One mock server standing in for every upstream service
async fn upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/pubsub/v1/projects/.+:publish$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageIds": ["1"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mycarehub/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userID": "user-1"})))
        .mount(&server)
        .await;
    server
}

fn test_app(server: &MockServer) -> Router {
    let base = server.uri();
    let config = Config {
        bind_address: "0.0.0.0:0".to_string(),
        fhir_base_url: format!("{base}/fhir"),
        fhir_access_token: None,
        ocl_base_url: format!("{base}/ocl"),
        ocl_token: None,
        mycarehub_base_url: format!("{base}/mycarehub"),
        otp_service_url: format!("{base}/otp"),
        media_service_url: format!("{base}/media"),
        pubsub_base_url: format!("{base}/pubsub"),
        google_cloud_project: "test".to_string(),
        pubsub_access_token: None,
        environment: "test".to_string(),
        service_name: "clinical".to_string(),
        http_timeout: Duration::from_secs(5),
        cors_origins: vec!["*".to_string()],
        rate_limit_rps: 1000,
        defaults: RegistrationDefaults::default(),
    };
    let infrastructure = Infrastructure::from_config(&config).expect("Failed to build clients");
    let usecases = ClinicalUseCases::new(infrastructure, config.defaults.clone());
    clinical_server::build_app(usecases, &config)
}

/// Send a request to the app and return (status, body as JSON).
async fn request(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };

    (status, body)
}

/// GET with the tenant header.
fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("OrganizationID", ORGANIZATION_ID)
        .body(Body::empty())
        .unwrap()
}

/// POST a JSON body with the tenant header.
fn post(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("OrganizationID", ORGANIZATION_ID)
        .header("ProgramID", "prog-1")
        .header("FacilityID", "fac-1")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn searchset(resources: Vec<JsonValue>) -> JsonValue {
    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": resources.len(),
        "entry": resources.into_iter().map(|r| json!({"resource": r})).collect::<Vec<_>>()
    })
}

fn sample_patient() -> JsonValue {
    json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "birthDate": "1990-05-17",
        "gender": "female",
        "identificationDocuments": [{"type": "national_id", "number": "12345678"}],
        "phoneNumbers": ["0712345678"]
    })
}

async fn mount_encounter(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/fhir/Encounter/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Encounter",
            "id": "e1",
            "status": status,
            "class": {
                "system": "http://terminology.hl7.org/CodeSystem/v3-ActCode",
                "code": "AMB"
            },
            "subject": {"reference": format!("Patient/{PATIENT_ID}"), "type": "Patient"},
            "period": {"start": "2024-01-01T08:00:00Z"}
        })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_organization_header() {
    let server = upstream().await;
    let app = test_app(&server);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/patients/{PATIENT_ID}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = request(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["resourceType"], "OperationOutcome");
    assert_eq!(body["issue"][0]["code"], "required");
    assert!(
        body["issue"][0]["diagnostics"]
            .as_str()
            .unwrap()
            .contains("OrganizationID")
    );
}

#[tokio::test]
async fn test_create_patient() {
    let server = upstream().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .and(query_param("phone", "+254712345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/fhir/Patient/[0-9a-f-]{36}$"))
        .respond_with(EchoBody)
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let response = app
        .clone()
        .oneshot(post("/api/patients", sample_patient()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()["Location"].to_str().unwrap().to_string();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(location, format!("/api/patients/{}", body["id"].as_str().unwrap()));
    assert_eq!(body["phoneNumbers"], json!(["+254712345678"]));
    assert_eq!(body["gender"], "female");
}

#[tokio::test]
async fn test_duplicate_phone_is_conflict() {
    let server = upstream().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![json!({
            "resourceType": "Patient",
            "id": "existing",
            "telecom": [{"system": "phone", "value": "+254712345678"}]
        })])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(EchoBody)
        .expect(0)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = request(&app, post("/api/patients", sample_patient())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["resourceType"], "OperationOutcome");
}

#[tokio::test]
async fn test_invalid_patient_input() {
    let server = upstream().await;
    let app = test_app(&server);

    let mut patient = sample_patient();
    patient["firstName"] = json!("  ");
    let (status, _) = request(&app, post("/api/patients", patient)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut patient = sample_patient();
    patient["phoneNumbers"] = json!(["12"]);
    let (status, _) = request(&app, post("/api/patients", patient)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vital_on_finished_encounter_is_rejected() {
    let server = upstream().await;
    mount_encounter(&server, "finished").await;
    Mock::given(method("POST"))
        .and(path("/fhir/Observation"))
        .respond_with(EchoBody)
        .expect(0)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = request(
        &app,
        post(
            "/api/observations/pulse-rate",
            json!({"status": "final", "encounterId": "e1", "value": "72"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["resourceType"], "OperationOutcome");
}

#[tokio::test]
async fn test_record_vital_sign() {
    let server = upstream().await;
    mount_encounter(&server, "in-progress").await;
    Mock::given(method("GET"))
        .and(path("/ocl/orgs/CIEL/sources/CIEL/concepts/5087/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "5087",
            "display_name": "Pulse"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/fhir/Observation"))
        .respond_with(EchoBody)
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = request(
        &app,
        post(
            "/api/observations/pulse-rate",
            json!({"status": "final", "encounterId": "e1", "value": "72"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Pulse");
    assert_eq!(body["patientId"], PATIENT_ID);
    assert_eq!(body["encounterId"], "e1");
}

#[tokio::test]
async fn test_unknown_vital_sign() {
    let server = upstream().await;
    let app = test_app(&server);

    let (status, _) = request(
        &app,
        post(
            "/api/observations/mood",
            json!({"status": "final", "encounterId": "e1", "value": "good"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_timeline_survives_failed_allergy_query() {
    let server = upstream().await;
    let subject = json!({"reference": format!("Patient/{PATIENT_ID}")});
    Mock::given(method("GET"))
        .and(path("/fhir/AllergyIntolerance"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/Observation"))
        .and(query_param("patient", format!("Patient/{PATIENT_ID}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![json!({
            "resourceType": "Observation",
            "id": "o1",
            "status": "final",
            "code": {"text": "Pulse"},
            "subject": subject,
            "effectiveInstant": "2024-02-01T10:00:00Z",
            "valueString": "72"
        })])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/MedicationStatement"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![json!({
            "resourceType": "MedicationStatement",
            "id": "m1",
            "status": "active",
            "medicationCodeableConcept": {"text": "Paracetamol"},
            "subject": subject,
            "effectiveDateTime": "2024-03-01T09:00:00Z"
        })])))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = request(&app, get(&format!("/api/patients/{PATIENT_ID}/timeline"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["timeline"][0]["resourceType"], "MedicationStatement");
    assert_eq!(body["timeline"][1]["resourceType"], "Observation");
    assert_eq!(body["timeline"][1]["timelineDate"], "2024-02-01T10:00:00Z");
    assert_eq!(body["failedResourceTypes"], json!(["AllergyIntolerance"]));
}

#[tokio::test]
async fn test_timeline_rejects_non_uuid() {
    let server = upstream().await;
    let app = test_app(&server);

    let (status, body) = request(&app, get("/api/patients/abc/timeline?offset=0&limit=5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["issue"][0]["diagnostics"].as_str().unwrap().contains("invalid patient id"));
}

#[tokio::test]
async fn test_conditions_are_paginated() {
    let server = upstream().await;
    let conditions = ["2024-01-01", "2024-03-01", "2024-02-01"]
        .iter()
        .enumerate()
        .map(|(i, day)| {
            json!({
                "resourceType": "Condition",
                "id": format!("c{i}"),
                "subject": {"reference": format!("Patient/{PATIENT_ID}")},
                "recordedDate": format!("{day}T08:00:00Z")
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/fhir/Condition"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(conditions)))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let uri = format!("/api/patients/{PATIENT_ID}/conditions?offset=1&limit=1");
    let (status, body) = request(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["hasNextPage"], true);
    assert_eq!(body["conditions"][0]["id"], "c2");

    let uri = format!("/api/patients/{PATIENT_ID}/conditions?limit=1000");
    let (status, _) = request(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_allergy() {
    let server = upstream().await;
    Mock::given(method("GET"))
        .and(path("/ocl/orgs/CIEL/sources/CIEL/concepts/"))
        .and(query_param("q", "penicillin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "81724", "display_name": "Penicillin", "concept_class": "Drug"}
        ])))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = request(&app, get("/api/allergies/search?name=penicillin")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"code": "81724", "system": "/orgs/CIEL/sources/CIEL/concepts", "name": "Penicillin"}])
    );

    let (status, _) = request(&app, get("/api/allergies/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_end_episode_of_care() {
    let server = upstream().await;
    Mock::given(method("GET"))
        .and(path("/fhir/EpisodeOfCare/ep1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "EpisodeOfCare",
            "id": "ep1",
            "status": "active",
            "patient": {"reference": format!("Patient/{PATIENT_ID}")},
            "period": {"start": "2024-01-01T08:00:00Z"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/Encounter"))
        .and(query_param("episode-of-care", "EpisodeOfCare/ep1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![json!({
            "resourceType": "Encounter",
            "id": "e1",
            "status": "in-progress",
            "class": {"system": "http://terminology.hl7.org/CodeSystem/v3-ActCode", "code": "AMB"},
            "subject": {"reference": format!("Patient/{PATIENT_ID}")},
            "episodeOfCare": [{"reference": "EpisodeOfCare/ep1"}],
            "period": {"start": "2024-01-02T08:00:00Z"}
        })])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fhir/Encounter/e1"))
        .respond_with(EchoBody)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fhir/EpisodeOfCare/ep1"))
        .respond_with(EchoBody)
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = request(&app, post("/api/episodes-of-care/ep1/end", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "finished");
    assert_eq!(body["patientId"], PATIENT_ID);
    assert!(body["end"].is_string());
}

#[tokio::test]
async fn test_validate_operation() {
    let server = upstream().await;
    let app = test_app(&server);

    let (status, body) = request(
        &app,
        post(
            "/api/fhir/Patient/$validate",
            json!({"resourceType": "Patient", "gender": "female"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issue"][0]["severity"], "information");

    let (status, _) = request(
        &app,
        post(
            "/api/fhir/Patient/$validate",
            json!({"resourceType": "Encounter", "status": "planned"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let server = upstream().await;
    Mock::given(method("GET"))
        .and(path("/fhir/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "CapabilityStatement"
        })))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = request(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_health_when_store_is_down() {
    let server = upstream().await;
    Mock::given(method("GET"))
        .and(path("/fhir/metadata"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = request(&app, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_metadata_lists_resource_types() {
    let server = upstream().await;
    let app = test_app(&server);

    let req = Request::builder().uri("/metadata").body(Body::empty()).unwrap();
    let (status, body) = request(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resourceType"], "CapabilityStatement");
    let types: Vec<&str> = body["rest"][0]["resource"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["type"].as_str())
        .collect();
    assert!(types.contains(&"Encounter"));
    assert!(types.contains(&"AllergyIntolerance"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = upstream().await;
    let app = test_app(&server);

    let req = Request::builder()
        .uri("/metadata")
        .header("X-Request-ID", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.headers()["X-Request-ID"], "req-42");

    let req = Request::builder().uri("/metadata").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert!(response.headers().contains_key("X-Request-ID"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = upstream().await;
    let app = test_app(&server);

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}
