//! HTTP API for the sonlist item service.

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sonlist_service::{Created, ErrorKind, Fetched, ItemService, ServiceError};
use sonlist_storage::DeleteResult;
use sonlist_types::Document;
use tracing::debug;

/// Header carrying the caller's identity. Requests without it are anonymous.
pub const USER_HEADER: &str = "x-sonlist-user";

/// A service error rendered as `{"error": kind, "message": text}`.
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = StatusCode::from_u16(kind.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if kind == ErrorKind::InternalServerError {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = json!({ "error": kind, "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchParams {
    /// Relaxed filter applied to a list's children.
    pub filter: Option<String>,
    #[serde(default)]
    pub exclude_children: bool,
}

fn caller(headers: &HeaderMap, service: &ItemService) -> String {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .unwrap_or(&service.config().anonymous_identity)
        .to_string()
}

fn object(body: Value) -> Result<Document, ApiError> {
    match body {
        Value::Object(doc) => Ok(doc),
        _ => Err(ServiceError::BadRequest("request body must be a JSON object".into()).into()),
    }
}

fn deleted(result: DeleteResult) -> Json<Value> {
    Json(json!({ "deleted_count": result.deleted_count }))
}

async fn create_handler(
    State(service): State<Arc<ItemService>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let user = caller(&headers, &service);
    debug!("POST item as {}", user);
    let created = service.validate_and_create(&user, object(body)?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_handler(
    State(service): State<Arc<ItemService>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Document>, ApiError> {
    let user = caller(&headers, &service);
    let updated = service.validate_and_patch(&user, &id, object(body)?).await?;
    Ok(Json(updated))
}

async fn fetch_handler(
    State(service): State<Arc<ItemService>>,
    Path(id): Path<String>,
    Query(params): Query<FetchParams>,
    headers: HeaderMap,
) -> Result<Json<Fetched>, ApiError> {
    let user = caller(&headers, &service);
    let fetched = service
        .fetch(&user, &id, params.filter.as_deref(), params.exclude_children)
        .await?;
    Ok(Json(fetched))
}

async fn delete_handler(
    State(service): State<Arc<ItemService>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = caller(&headers, &service);
    Ok(deleted(service.delete_item(&user, &id).await?))
}

async fn delete_all_handler(
    State(service): State<Arc<ItemService>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = caller(&headers, &service);
    Ok(deleted(service.delete_all(&user).await?))
}

/// Build the HTTP API router around the given service.
pub fn build_router(service: Arc<ItemService>) -> Router {
    Router::new()
        .route("/api/v1/items", post(create_handler).delete(delete_all_handler))
        .route(
            "/api/v1/items/{id}",
            patch(patch_handler).get(fetch_handler).delete(delete_handler),
        )
        .with_state(service)
}
