//! Wire-level tests for the Gemini embedding provider against a local mock
//! of the Generative Language API.

use httpmock::prelude::*;
use serde_json::json;

use paperstack::config::EmbeddingConfig;
use paperstack::embedding::{EmbeddingProvider, GeminiProvider};
use paperstack::error::Error;

const BATCH_PATH: &str = "/v1beta/models/text-embedding-004:batchEmbedContents";

fn gemini_config(endpoint: &str) -> EmbeddingConfig {
    EmbeddingConfig {
        provider: "gemini".to_string(),
        model: Some("models/text-embedding-004".to_string()),
        dims: Some(3),
        endpoint: endpoint.to_string(),
        batch_size: 64,
        timeout_secs: 5,
    }
}

fn provider_for(server: &MockServer) -> GeminiProvider {
    std::env::set_var("GEMINI_API_KEY", "test-key");
    GeminiProvider::new(&gemini_config(&server.base_url())).unwrap()
}

#[tokio::test]
async fn test_request_shape_and_response_parsing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(BATCH_PATH)
                .query_param("key", "test-key")
                .json_body(json!({
                    "requests": [
                        {
                            "model": "models/text-embedding-004",
                            "content": { "parts": [ { "text": "first passage" } ] }
                        },
                        {
                            "model": "models/text-embedding-004",
                            "content": { "parts": [ { "text": "second passage" } ] }
                        }
                    ]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "embeddings": [
                        { "values": [1.0, 0.0, 0.0] },
                        { "values": [0.0, 1.0, 0.0] }
                    ]
                }));
        })
        .await;

    let provider = provider_for(&server);
    let vectors = provider
        .embed(&["first passage".to_string(), "second passage".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
}

#[tokio::test]
async fn test_http_error_is_fatal_and_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(BATCH_PATH);
            then.status(500).body("internal");
        })
        .await;

    let provider = provider_for(&server);
    let err = provider.embed(&["x".to_string()]).await.unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    assert!(err.to_string().contains("500"), "got: {err}");
    assert_eq!(
        mock.hits_async().await,
        1,
        "a failed call must not be retried"
    );
}

#[tokio::test]
async fn test_embedding_count_mismatch_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(BATCH_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "embeddings": [ { "values": [1.0, 0.0, 0.0] } ]
                }));
        })
        .await;

    let provider = provider_for(&server);
    let err = provider
        .embed(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    assert!(
        err.to_string().contains("1 embeddings for 2 texts"),
        "got: {err}"
    );
}

#[tokio::test]
async fn test_dims_mismatch_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(BATCH_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "embeddings": [ { "values": [1.0, 0.0] } ]
                }));
        })
        .await;

    let provider = provider_for(&server);
    let err = provider.embed(&["a".to_string()]).await.unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    assert!(err.to_string().contains("dims"), "got: {err}");
}

#[tokio::test]
async fn test_batches_split_at_the_api_limit() {
    let server = MockServer::start_async().await;

    // Answer every call with a full batch of 100. The first call (100
    // texts) succeeds; the second call carries the single leftover text and
    // trips the count check, which proves the split happened at 100.
    let full_batch: Vec<serde_json::Value> =
        (0..100).map(|_| json!({ "values": [1.0, 0.0, 0.0] })).collect();
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(BATCH_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "embeddings": full_batch }));
        })
        .await;

    let provider = provider_for(&server);
    let texts: Vec<String> = (0..101).map(|i| format!("text {i}")).collect();
    let err = provider.embed(&texts).await.unwrap_err();

    assert!(
        err.to_string().contains("100 embeddings for 1 texts"),
        "got: {err}"
    );
    assert_eq!(mock.hits_async().await, 2);
}

#[tokio::test]
async fn test_unknown_response_fields_are_ignored() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(BATCH_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "embeddings": [
                        { "values": [0.5, 0.5, 0.0], "statistics": { "truncated": false } }
                    ],
                    "metadata": { "billableCharacterCount": 12 }
                }));
        })
        .await;

    let provider = provider_for(&server);
    let vectors = provider.embed(&["a".to_string()]).await.unwrap();
    assert_eq!(vectors, vec![vec![0.5, 0.5, 0.0]]);
}
