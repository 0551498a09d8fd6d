//! Integration tests for the request client using wiremock
//!
//! These tests run the real reqwest transport against a mock Promptly API.

use std::sync::Arc;

use promptly_client::{ApiClient, AuthState, ClientError};
use promptly_core::models::{EvaluatePromptRequest, GeneratePromptRequest, ProfileDraft};
use promptly_core::storage::{SELECTED_PROFILE_KEY, TOKEN_KEY};
use promptly_core::{ClientConfig, KeyValueStore, LoggingNavigator, MemoryKeyValueStore};
use promptly_storage::FileKeyValueStore;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api_base_url: format!("{}/v1", server.uri()),
        ..Default::default()
    }
}

fn client(
    server: &MockServer,
    storage: Arc<dyn KeyValueStore>,
) -> (ApiClient, Arc<LoggingNavigator>) {
    let navigator = Arc::new(LoggingNavigator::new());
    let api = ApiClient::from_config(&config_for(server), storage, navigator.clone()).unwrap();
    (api, navigator)
}

#[tokio::test]
async fn test_list_profiles_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/profiles"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "p1", "name": "Work"},
            {"id": "p2", "name": "Home", "description": "evenings"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let storage = Arc::new(MemoryKeyValueStore::new());
    storage.set(TOKEN_KEY, "tok-123").unwrap();
    let (api, _) = client(&mock_server, storage);

    let profiles = api.list_profiles().await.unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[1].description.as_deref(), Some("evenings"));
}

#[tokio::test]
async fn test_scoped_list_uses_profile_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/templates"))
        .and(query_param("profile_id", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "t1",
            "name": "Summarize",
            "persona_id": "per1",
            "version": 2,
            "meta_role": "editor",
            "task": "summarize",
            "answer_guideline": "short",
            "template": "Summarize {{text}}",
            "variables": ["text"],
            "profile_id": "p1"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (api, _) = client(&mock_server, Arc::new(MemoryKeyValueStore::new()));

    let templates = api.list_templates(Some("p1")).await.unwrap();
    assert_eq!(templates[0].version, 2);
    assert_eq!(templates[0].variables, vec!["text".to_string()]);
}

#[tokio::test]
async fn test_create_profile_posts_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/profiles"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"name": "Research"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({"id": "p9", "name": "Research"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (api, _) = client(&mock_server, Arc::new(MemoryKeyValueStore::new()));

    let created = api
        .create_profile(&ProfileDraft {
            name: "Research".to_string(),
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, "p9");
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate-prompt"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"error": "Missing variable: text"})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/evaluate-prompt"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let (api, _) = client(&mock_server, Arc::new(MemoryKeyValueStore::new()));

    let err = api
        .generate_prompt(&GeneratePromptRequest {
            template_id: "t1".to_string(),
            name: "Draft".to_string(),
            variable_values: Default::default(),
            profile_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing variable: text");
    assert_eq!(err.status(), Some(422));

    let err = api
        .evaluate_prompt(&EvaluatePromptRequest {
            content: "Say hi".to_string(),
            prompt_id: None,
            criteria: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 502");
}

#[tokio::test]
async fn test_delete_and_no_content_resolve_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/templates/t1"))
        .and(query_param("version", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/v1/prompts/pr1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let (api, _) = client(&mock_server, Arc::new(MemoryKeyValueStore::new()));

    api.delete_template("t1", 3).await.unwrap();

    let none: Option<serde_json::Value> = api
        .request(
            "/prompts/pr1",
            promptly_client::RequestOptions::put(&serde_json::json!({"name": "x"})).unwrap(),
        )
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/personas"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "Token expired"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("storage.json");
    let storage = Arc::new(FileKeyValueStore::open(&store_path).unwrap());
    storage.set(TOKEN_KEY, "expired").unwrap();
    storage.set(SELECTED_PROFILE_KEY, "p1").unwrap();

    let (api, navigator) = client(&mock_server, storage);

    let err = api.list_personas(None).await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationRequired));
    assert_eq!(err.to_string(), "Authentication required");

    // Token is gone from disk, other keys survive
    let reopened = FileKeyValueStore::open(&store_path).unwrap();
    assert_eq!(reopened.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(reopened.get(SELECTED_PROFILE_KEY).unwrap().as_deref(), Some("p1"));

    assert_eq!(api.auth_state().get(), AuthState::signed_out());
    assert_eq!(
        navigator.last(),
        Some(format!("{}/v1/api/auth/login", mock_server.uri()))
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on the reserved port
    let config = ClientConfig {
        api_base_url: "http://127.0.0.1:9/v1".to_string(),
        ..Default::default()
    };
    let api = ApiClient::from_config(
        &config,
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(LoggingNavigator::new()),
    )
    .unwrap();

    let err = api.list_intents().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(err.status(), None);
}
