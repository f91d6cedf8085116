use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use syntra_core::{Embedding, EmbeddingService, LibraryConfig, Result, Syntra, SyntraError};
use syntra_server::{create_router, AppState};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

/// Embeds by keyword so tests control which nodes link up.
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingService for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        if text.contains("offline") {
            return Err(SyntraError::Embedding("service unavailable".into()));
        }
        Ok(if text.contains("rust") {
            vec![1.0, 0.1, 0.0]
        } else if text.contains("cargo") {
            vec![0.9, 0.2, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        })
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

fn test_app() -> (Router, TempDir) {
    let dir = tempdir().unwrap();
    let syntra = Syntra::open(
        dir.path().join("syntra.redb"),
        Arc::new(KeywordEmbedder),
        LibraryConfig::default(),
    )
    .unwrap();
    (create_router(AppState::new(Arc::new(syntra))), dir)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create(app: &Router, title: &str, content: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/nodes",
        Some(json!({ "type": "note", "title": title, "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    body
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_root_and_health() {
    let (app, _dir) = test_app();

    for uri in ["/api", "/api/"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "banner missing at {}", uri);
        assert_eq!(body["message"], "Syntra API - Personal Knowledge Operating System");
    }

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["embeddingModel"], "keyword");
    assert!(body["uptimeSeconds"].is_u64());
    assert_eq!(body["stats"]["nodeCount"], 0);
    assert_eq!(body["stats"]["connectionCount"], 0);
    assert!(body.get("uptime_seconds").is_none());
}

// ── Node lifecycle ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_links_similar_nodes() {
    let (app, _dir) = test_app();

    let first = create(&app, "Ownership", "rust borrow checker").await;
    assert_eq!(first["connections"].as_array().unwrap().len(), 0);
    assert_eq!(first["node"]["type"], "note");
    assert!(first["node"]["createdAt"].is_string());

    let second = create(&app, "Builds", "cargo workspaces").await;
    let connections = second["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["node"]["id"], first["node"]["id"]);
    assert!(connections[0]["similarityScore"].as_f64().unwrap() >= 0.75);

    create(&app, "Dinner", "pasta with tomatoes").await;

    let (_, graph) = send(&app, Method::GET, "/api/graph", None).await;
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
    let edges = graph["connections"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["fromNodeId"], second["node"]["id"]);
    assert_eq!(edges[0]["toNodeId"], first["node"]["id"]);

    let uri = format!("/api/nodes/{}", first["node"]["id"].as_str().unwrap());
    let (status, view) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["connections"][0]["node"]["title"], "Builds");
}

#[tokio::test]
async fn test_create_validation_errors() {
    let (app, _dir) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/nodes",
        Some(json!({ "type": "note", "title": "Blank", "content": "  \n " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/nodes",
        Some(json!({ "type": "note", "title": "x".repeat(501), "content": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, nodes) = send(&app, Method::GET, "/api/nodes", None).await;
    assert!(nodes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_embedding_failure_is_server_error() {
    let (app, _dir) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/nodes",
        Some(json!({ "type": "note", "title": "Down", "content": "offline thoughts" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate embedding"));

    let (_, nodes) = send(&app, Method::GET, "/api/nodes", None).await;
    assert!(nodes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_cascades() {
    let (app, _dir) = test_app();

    let a = create(&app, "A", "rust traits").await;
    let b = create(&app, "B", "cargo features").await;
    let b_id = b["node"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::DELETE, &format!("/api/nodes/{}", b_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Node deleted successfully");

    let (status, _) = send(&app, Method::GET, &format!("/api/nodes/{}", b_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let a_uri = format!("/api/nodes/{}", a["node"]["id"].as_str().unwrap());
    let (_, view) = send(&app, Method::GET, &a_uri, None).await;
    assert!(view["connections"].as_array().unwrap().is_empty());

    let (_, graph) = send(&app, Method::GET, "/api/graph", None).await;
    assert!(graph["connections"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let (app, _dir) = test_app();

    let missing = format!("/api/nodes/{}", uuid::Uuid::now_v7());
    let (status, body) = send(&app, Method::GET, &missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Node not found");

    let (status, _) = send(&app, Method::DELETE, &missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/nodes/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Node not found");
}

// ── Search ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_ranks_and_caps() {
    let (app, _dir) = test_app();

    for i in 0..12 {
        create(&app, &format!("Meal {}", i), "pasta").await;
    }
    create(&app, "Lifetimes", "rust lifetimes").await;

    let (status, results) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "query": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 10);
    assert_eq!(results[0]["node"]["title"], "Lifetimes");
    let scores: Vec<f64> = results
        .iter()
        .map(|r| r["similarity"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let (app, _dir) = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "query": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}
