use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

use super::error::ApiError;
use super::sse;
use crate::connector::api::Container;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub conversation_id: i64,
    #[serde(default)]
    pub content: String,
}

/// Builds the local HTTP API.
pub fn router(container: Arc<Container>) -> Router {
    Router::new()
        .route("/v1/status", get(status))
        .route(
            "/v1/conversations",
            post(create_conversation).get(list_conversations),
        )
        .route(
            "/v1/conversations/{id}",
            get(get_conversation).patch(rename_conversation),
        )
        .route("/v1/chat", post(chat))
        .route("/v1/export/{id}", post(export_conversation))
        .with_state(container)
}

/// Serves the API on `addr` until Ctrl-C.
pub async fn serve(container: Arc<Container>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(container))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

async fn status(State(container): State<Arc<Container>>) -> impl IntoResponse {
    Json(container.status_use_case().execute().await)
}

async fn create_conversation(
    State(container): State<Arc<Container>>,
    body: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let conversation = container
        .create_conversation_use_case()
        .execute(&body.role, &body.tier, body.title.as_deref())
        .await?;
    Ok(Json(conversation))
}

async fn list_conversations(
    State(container): State<Arc<Container>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = container
        .conversations_use_case()
        .list(
            query.limit.map(|l| l.max(1) as usize),
            query.offset.map(|o| o.max(0) as usize),
            query.q.as_deref(),
        )
        .await?;
    Ok(Json(page))
}

async fn get_conversation(
    State(container): State<Arc<Container>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(container.conversations_use_case().get(id).await?))
}

async fn rename_conversation(
    State(container): State<Arc<Container>>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let conversation = container
        .conversations_use_case()
        .rename(id, &body.title)
        .await?;
    Ok(Json(conversation))
}

async fn chat(
    State(container): State<Arc<Container>>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let turn = container
        .chat_turn_use_case()
        .begin(body.conversation_id, &body.content)
        .await?;
    debug!(conversation_id = body.conversation_id, "starting chat stream");

    let response = sse::spawn_relay(|mut sink, cancel| async move {
        turn.run(&mut sink, cancel).await;
    });

    Ok(response.into_response())
}

async fn export_conversation(
    State(container): State<Arc<Container>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(container.export_use_case().execute(id).await?))
}
