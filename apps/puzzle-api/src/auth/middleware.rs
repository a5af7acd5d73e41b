//! Caller identity extraction for the puzzle endpoints.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::identity;
use crate::models::user::AuthorProfile;
use crate::AppState;

/// User id assigned to every caller when authentication is disabled.
pub const GUEST_USER_ID: &str = "guest";
const GUEST_NAME: &str = "Guest";

/// Caller identity, from a verified `Authorization: Bearer <id token>` header
/// or the guest identity when authentication is off.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn guest() -> Self {
        Self {
            user_id: GUEST_USER_ID.to_string(),
            name: Some(GUEST_NAME.to_string()),
            picture: None,
            email: None,
        }
    }

    /// Author record for puzzles this caller creates. Falls back to the email
    /// or the user id when the token carries no display name.
    pub fn author_profile(&self) -> AuthorProfile {
        let name = self
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.user_id.clone());

        AuthorProfile {
            id: self.user_id.clone(),
            name,
            avatar: self.picture.clone().unwrap_or_default(),
        }
    }
}

/// Rejection returned when the bearer token is missing or invalid.
pub struct AuthError {
    message: String,
}

impl AuthError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "UNAUTHORIZED",
                "message": self.message
            }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.config.auth_required {
            return Ok(AuthUser::guest());
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthError::new("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError::new("Invalid Authorization header format"))?;

        let claims = identity::verify_id_token(
            token,
            &state.jwks,
            &state.config.identity_audience,
            &state.config.identity_issuer,
        )
        .await
        .map_err(|e| AuthError::new(e.message))?;

        Ok(AuthUser {
            user_id: claims.sub,
            name: claims.name,
            picture: claims.picture,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_profile() {
        let profile = AuthUser::guest().author_profile();
        assert_eq!(profile.id, "guest");
        assert_eq!(profile.name, "Guest");
        assert_eq!(profile.avatar, "");
    }

    #[test]
    fn profile_falls_back_to_email_then_id() {
        let mut user = AuthUser {
            user_id: "uid-1".into(),
            name: Some("  ".into()),
            picture: Some("https://example.com/p.png".into()),
            email: Some("kate@example.com".into()),
        };
        let profile = user.author_profile();
        assert_eq!(profile.name, "kate@example.com");
        assert_eq!(profile.avatar, "https://example.com/p.png");

        user.email = None;
        assert_eq!(user.author_profile().name, "uid-1");
    }
}
