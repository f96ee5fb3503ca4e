//! Tests for the Firestore record store against a mock REST endpoint

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use shared::ApiFailure;
use crate::error::OrchestratorError;
use crate::services::firestore::FirestoreRecordStore;
use crate::traits::RecordStore;
use super::common::{client, credentials, enriched_record};

const QUERY_PATH: &str = "/v1/projects/project-search/databases/(default)/documents:runQuery";
const DOC_PATH: &str = "/v1/projects/project-search/databases/(default)/documents/image-data/abc123";

fn store(server: &MockServer) -> FirestoreRecordStore<enricher::StaticTokenProvider> {
    FirestoreRecordStore::new(client(), server.uri(), "project-search", "image-data", credentials())
}

fn document(id: &str) -> serde_json::Value {
    json!({
        "document": {
            "name": format!("projects/project-search/databases/(default)/documents/image-data/{id}"),
            "fields": {
                "bucket": {"stringValue": "imgs"},
                "imagePath": {"stringValue": format!("{id}.jpg")},
                "published": {"booleanValue": true}
            }
        },
        "readTime": "2024-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_fetch_sends_bounded_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_json(json!({
            "structuredQuery": {"from": [{"collectionId": "image-data"}], "limit": 2}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([document("a"), document("b")])))
        .expect(1)
        .mount(&server)
        .await;

    let records = store(&server).fetch_candidates(2).await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(records[0].path, "a.jpg");
}

#[tokio::test]
async fn test_fetch_truncates_oversized_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            document("a"),
            document("b"),
            document("c")
        ])))
        .mount(&server)
        .await;

    assert_eq!(store(&server).fetch_candidates(2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_fetch_exhausted_collection_is_not_error() {
    let server = MockServer::start().await;
    // An empty collection answers with a single progress entry and no document
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"readTime": "2024-05-01T10:00:00Z"}])))
        .mount(&server)
        .await;

    assert!(store(&server).fetch_candidates(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_zero_limit_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(store(&server).fetch_candidates(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_is_store_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    assert!(matches!(
        store(&server).fetch_candidates(5).await,
        Err(OrchestratorError::Store { operation: "fetch", failure: ApiFailure::ServerError(_), .. })
    ));
}

#[tokio::test]
async fn test_persist_patches_owned_fields_only() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(DOC_PATH))
        .and(body_partial_json(json!({
            "fields": {
                "imageDescription": {"stringValue": "A dark brown sofa in a living room."},
                "metadata": {"mapValue": {"fields": {
                    "labels": {"arrayValue": {"values": [
                        {"stringValue": "sofa"},
                        {"stringValue": "living room"}
                    ]}}
                }}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    store(&server).persist(&enriched_record("abc123")).await.unwrap();

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let request = &requests[0];

    let mask: Vec<String> = request
        .url
        .query_pairs()
        .filter(|(key, _)| key == "updateMask.fieldPaths")
        .map(|(_, value)| value.to_string())
        .collect();
    assert_eq!(
        mask,
        vec!["imageDescription", "textEmbeddings", "imageEmbeddings", "metadata.labels", "metadata.colors"]
    );

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    let fields = body["fields"].as_object().unwrap();
    assert!(!fields.contains_key("bucket"));
    assert!(!fields.contains_key("published"));
    assert!(body["fields"]["metadata"]["mapValue"]["fields"].get("width").is_none());
}

#[tokio::test]
async fn test_persist_failure_names_document() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    match store(&server).persist(&enriched_record("abc123")).await {
        Err(OrchestratorError::Store { operation, id, failure }) => {
            assert_eq!(operation, "persist");
            assert_eq!(id, "abc123");
            assert_eq!(failure, ApiFailure::RateLimitExceeded);
        }
        other => panic!("expected store error, got {other:?}"),
    }
}
