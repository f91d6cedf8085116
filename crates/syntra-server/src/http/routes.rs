use super::{AppError, AppResult, AppState};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use syntra_core::{
    GraphSnapshot, NewNode, Node, NodeId, NodeWithConnections, SearchResult, StorageStats,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    // Full paths: a "/" nested under "/api" would not answer "/api/"
    Router::new()
        .route("/api", get(root))
        .route("/api/", get(root))
        .route("/api/health", get(health))
        .route("/api/nodes", get(list_nodes).post(create_node))
        .route("/api/nodes/:id", get(get_node).delete(delete_node))
        .route("/api/search", post(search))
        .route("/api/graph", get(graph))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Syntra API - Personal Knowledge Operating System".into(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    version: &'static str,
    uptime_seconds: u64,
    embedding_model: String,
    stats: StorageStats,
}

async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let stats = state.syntra.stats()?;

    Ok(Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        embedding_model: state.syntra.embedder().model_name().to_string(),
        stats,
    }))
}

async fn create_node(
    State(state): State<AppState>,
    Json(body): Json<NewNode>,
) -> AppResult<Json<NodeWithConnections>> {
    let created = state.syntra.create_node(body).await?;
    Ok(Json(created))
}

async fn list_nodes(State(state): State<AppState>) -> AppResult<Json<Vec<Node>>> {
    Ok(Json(state.syntra.list_nodes().await?))
}

/// A malformed id cannot name a stored node, so it is reported as missing.
fn parse_node_id(raw: &str) -> AppResult<NodeId> {
    raw.parse().map_err(|_| AppError::not_found("Node not found"))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<NodeWithConnections>> {
    let id = parse_node_id(&id)?;
    Ok(Json(state.syntra.get_node_with_connections(id).await?))
}

async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_node_id(&id)?;
    state.syntra.delete_node(id).await?;
    Ok(Json(MessageResponse {
        message: "Node deleted successfully".into(),
    }))
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

async fn search(
    State(state): State<AppState>,
    Json(body): Json<SearchRequest>,
) -> AppResult<Json<Vec<SearchResult>>> {
    Ok(Json(state.syntra.search(&body.query).await?))
}

async fn graph(State(state): State<AppState>) -> AppResult<Json<GraphSnapshot>> {
    Ok(Json(state.syntra.get_graph().await?))
}
