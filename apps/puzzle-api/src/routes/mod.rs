pub mod health;
pub mod index;
pub mod puzzles;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(index::router())
        .merge(health::router())
        .merge(crate::chat::server::router())
        .nest("/api", puzzles::router())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        index::index,
        health::health,
        puzzles::list_puzzles,
        puzzles::create_puzzle,
        puzzles::get_puzzle,
        puzzles::delete_puzzle,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            crate::models::puzzle::PuzzleResponse,
            crate::models::puzzle::PuzzleDetailResponse,
            index::IndexResponse,
            health::HealthResponse,
            puzzles::CreatePuzzleRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and greeting"),
        (name = "Puzzles", description = "Puzzle stories"),
    )
)]
pub struct ApiDoc;
