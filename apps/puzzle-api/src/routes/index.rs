use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IndexResponse {
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Greeting", body = IndexResponse),
    ),
)]
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "HELLO WORLD!".to_string(),
    })
}
