//! Chat session identity carried in the `chat_session` cookie.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;

pub const SESSION_COOKIE: &str = "chat_session";

const SESSION_ID_PREFIX: &str = "chat";
const SESSION_ID_BYTES: usize = 24;
const MAX_SESSION_ID_LEN: usize = 64;

/// The session id chosen for an incoming connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub id: String,
    /// True when the id was generated for this request and must be set as a cookie.
    pub fresh: bool,
}

/// Reuse a well-formed `chat_session` cookie or mint a new id.
pub fn resolve(headers: &HeaderMap) -> SessionIdentity {
    match cookie_value(headers, SESSION_COOKIE).filter(|v| is_well_formed(v)) {
        Some(id) => SessionIdentity { id, fresh: false },
        None => SessionIdentity {
            id: generate_session_id(),
            fresh: true,
        },
    }
}

/// Random URL-safe id from the thread-local CSPRNG.
pub fn generate_session_id() -> String {
    let mut buf = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill(&mut buf[..]);
    format!("{}_{}", SESSION_ID_PREFIX, URL_SAFE_NO_PAD.encode(buf))
}

pub fn is_well_formed(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// `Set-Cookie` value scoping the id to the chat endpoint.
pub fn set_cookie_value(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/chat; HttpOnly; SameSite=Lax")
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}
