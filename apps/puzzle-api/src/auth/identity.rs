//! ID token verification against the external identity provider.

use jsonwebtoken::{Algorithm, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::jwks::JwksClient;
use crate::error::ApiError;

/// Claims carried in a provider-issued ID token.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signing algorithms accepted from the provider.
const ACCEPTED_ALGORITHMS: [Algorithm; 2] = [Algorithm::RS256, Algorithm::EdDSA];

/// Validate an ID token and return its claims.
///
/// Checks:
///   1. Algorithm is RS256 or EdDSA, and the header names a `kid`
///   2. Signature via the provider JWKS
///   3. `exp` (jsonwebtoken handles this)
///   4. `aud` matches the configured project
///   5. `iss` matches the configured issuer
///   6. `sub` is non-empty
pub async fn verify_id_token(
    token: &str,
    jwks: &JwksClient,
    expected_audience: &str,
    expected_issuer: &str,
) -> Result<IdentityClaims, ApiError> {
    let header = jsonwebtoken::decode_header(token).map_err(|e| {
        tracing::debug!(?e, "ID token header decode failed");
        ApiError::unauthorized("Invalid ID token")
    })?;

    if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
        return Err(ApiError::unauthorized("Unsupported ID token algorithm"));
    }

    let kid = header
        .kid
        .ok_or_else(|| ApiError::unauthorized("ID token missing kid"))?;

    let key = jwks.get_key(&kid).await?;

    let mut validation = Validation::new(header.alg);
    validation.set_audience(&[expected_audience]);
    validation.set_issuer(&[expected_issuer]);

    let token_data =
        jsonwebtoken::decode::<IdentityClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!(?e, "ID token validation failed");
            ApiError::unauthorized("Invalid or expired ID token")
        })?;

    let claims = token_data.claims;
    if claims.sub.is_empty() {
        return Err(ApiError::unauthorized("ID token has empty subject"));
    }

    Ok(claims)
}
