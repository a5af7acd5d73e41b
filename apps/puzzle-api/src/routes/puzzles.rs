//! Puzzle CRUD endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use puzzle_common::PrefixedId;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::puzzle::{
    random_attendance, Puzzle, PuzzleDetailResponse, PuzzleDraft, PuzzleResponse, TITLE_MAX_CHARS,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/puzzles", get(list_puzzles).post(create_puzzle))
        .route("/puzzles/{id}", get(get_puzzle).delete(delete_puzzle))
}

// ---------------------------------------------------------------------------
// GET /api/puzzles
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/puzzles",
    tag = "Puzzles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All puzzles, oldest first", body = Vec<PuzzleResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_puzzles(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PuzzleResponse>>, ApiError> {
    let records = state.store.list_puzzles().await?;

    let items = records
        .into_iter()
        .map(|record| PuzzleResponse::new(record, random_attendance()))
        .collect();

    Ok(Json(items))
}

// ---------------------------------------------------------------------------
// POST /api/puzzles
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePuzzleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl CreatePuzzleRequest {
    fn into_draft(self) -> Result<PuzzleDraft, ApiError> {
        let mut errors = Vec::new();

        let title = required_field(self.title, "title", &mut errors);
        let description = required_field(self.description, "description", &mut errors);
        let tags = required_field(self.tags, "tags", &mut errors);

        if title.chars().count() > TITLE_MAX_CHARS {
            errors.push(FieldError::new(
                "title",
                format!("Title must be {TITLE_MAX_CHARS} characters or fewer"),
            ));
        }

        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        Ok(PuzzleDraft {
            title,
            description,
            tags,
        })
    }
}

fn required_field(value: Option<String>, field: &str, errors: &mut Vec<FieldError>) -> String {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            String::new()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/puzzles",
    tag = "Puzzles",
    security(("bearer" = [])),
    request_body = CreatePuzzleRequest,
    responses(
        (status = 200, description = "Puzzle created", body = PuzzleDetailResponse),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn create_puzzle(
    user: AuthUser,
    State(state): State<AppState>,
    body: Result<Json<CreatePuzzleRequest>, JsonRejection>,
) -> Result<Json<PuzzleDetailResponse>, ApiError> {
    let Json(body) = body?;
    let draft = body.into_draft()?;
    let author = user.author_profile();

    let record = state.store.create_puzzle(&author, &draft).await?;

    tracing::info!(
        puzzle_id = %record.puzzle.id,
        author_id = %record.author.id,
        "puzzle created"
    );

    Ok(Json(record.into()))
}

// ---------------------------------------------------------------------------
// GET /api/puzzles/{id}
// ---------------------------------------------------------------------------

fn check_puzzle_id(id: &str) -> Result<(), ApiError> {
    if Puzzle::is_valid(id) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid puzzle id"))
    }
}

#[utoipa::path(
    get,
    path = "/api/puzzles/{id}",
    tag = "Puzzles",
    security(("bearer" = [])),
    params(
        ("id" = String, Path, description = "Puzzle ID"),
    ),
    responses(
        (status = 200, description = "Puzzle details", body = PuzzleDetailResponse),
        (status = 400, description = "Malformed puzzle id", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Puzzle not found", body = ApiErrorBody),
    ),
)]
pub async fn get_puzzle(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PuzzleDetailResponse>, ApiError> {
    check_puzzle_id(&id)?;

    let record = state
        .store
        .find_puzzle(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Puzzle not found"))?;

    Ok(Json(record.into()))
}

// ---------------------------------------------------------------------------
// DELETE /api/puzzles/{id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/puzzles/{id}",
    tag = "Puzzles",
    security(("bearer" = [])),
    params(
        ("id" = String, Path, description = "Puzzle ID"),
    ),
    responses(
        (status = 204, description = "Puzzle deleted"),
        (status = 400, description = "Malformed puzzle id", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Puzzle not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_puzzle(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    check_puzzle_id(&id)?;

    if !state.store.delete_puzzle(&id).await? {
        return Err(ApiError::not_found("Puzzle not found"));
    }

    tracing::info!(puzzle_id = %id, user_id = %user.user_id, "puzzle deleted");

    Ok(StatusCode::NO_CONTENT)
}
