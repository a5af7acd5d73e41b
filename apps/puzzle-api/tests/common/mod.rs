#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use ed25519_dalek::{SigningKey, VerifyingKey};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use puzzle_api::auth::jwks::JwksClient;
use puzzle_api::chat::ChatHub;
use puzzle_api::config::Config;
use puzzle_api::db::{MemoryPuzzleStore, PuzzleStore};
use puzzle_api::AppState;

pub const TEST_PROJECT: &str = "puzzle-test-project";
pub const TEST_ISSUER: &str = "https://securetoken.google.com/puzzle-test-project";

/// Ed25519 signing keys standing in for the identity provider.
pub struct TestSigningKeys {
    pub kid: String,
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl TestSigningKeys {
    /// Derive deterministic keys from a seed string.
    pub fn from_seed(seed: &str) -> Self {
        let hash = Sha256::digest(seed.as_bytes());
        let mut secret_bytes = [0u8; 32];
        secret_bytes.copy_from_slice(&hash);

        let signing_key = SigningKey::from_bytes(&secret_bytes);
        let verifying_key: VerifyingKey = (&signing_key).into();

        let secret = signing_key.to_bytes();
        let public_bytes = verifying_key.to_bytes();

        let pkcs8_der = wrap_ed25519_private_pkcs8(&secret);
        let encoding = EncodingKey::from_ed_der(&pkcs8_der);
        let decoding = DecodingKey::from_ed_der(&public_bytes);

        let kid_hash = Sha256::digest(public_bytes);
        let kid = format!(
            "test-{}",
            kid_hash
                .iter()
                .take(4)
                .map(|b| format!("{b:02x}"))
                .collect::<String>()
        );

        Self {
            kid,
            encoding,
            decoding,
        }
    }
}

fn wrap_ed25519_private_pkcs8(secret: &[u8; 32]) -> Vec<u8> {
    let mut der = Vec::with_capacity(48);
    der.extend_from_slice(&[0x30, 0x2e]);
    der.extend_from_slice(&[0x02, 0x01, 0x00]);
    der.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    der.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    der.extend_from_slice(secret);
    der
}

/// ID token claims as issued by the provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct TestIdClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl TestIdClaims {
    pub fn valid(user_id: &str, name: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            iss: TEST_ISSUER.to_string(),
            sub: user_id.to_string(),
            aud: TEST_PROJECT.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(3600)).timestamp(),
            name: Some(name.to_string()),
            picture: Some(format!("https://example.com/{user_id}.png")),
            email: None,
        }
    }
}

pub fn mint_token(keys: &TestSigningKeys, claims: &TestIdClaims) -> String {
    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(keys.kid.clone());
    jsonwebtoken::encode(&header, claims, &keys.encoding).expect("mint test ID token")
}

/// Mint a valid ID token for `user_id`.
pub fn mint_test_token(keys: &TestSigningKeys, user_id: &str, name: &str) -> String {
    mint_token(keys, &TestIdClaims::valid(user_id, name))
}

/// Mint an ID token that expired five minutes ago.
pub fn mint_expired_token(keys: &TestSigningKeys, user_id: &str) -> String {
    let now = chrono::Utc::now();
    let claims = TestIdClaims {
        iat: (now - chrono::Duration::seconds(3900)).timestamp(),
        exp: (now - chrono::Duration::seconds(300)).timestamp(),
        ..TestIdClaims::valid(user_id, "Expired User")
    };
    mint_token(keys, &claims)
}

pub fn test_config(auth_required: bool) -> Config {
    Config {
        database_url: "postgres://unused/puzzles_test".to_string(),
        port: 0,
        auth_required,
        identity_jwks_url: String::new(),
        identity_issuer: TEST_ISSUER.to_string(),
        identity_audience: TEST_PROJECT.to_string(),
        seed_demo_data: false,
    }
}

/// Build a test AppState with an in-memory store and a static JWKS key.
pub fn test_state(auth_required: bool) -> (AppState, TestSigningKeys) {
    let signing_keys = TestSigningKeys::from_seed("puzzle-test-seed-do-not-use-in-production");

    // Pre-load the JWKS client with the test key so it doesn't hit the network.
    let jwks = JwksClient::with_static_key(&signing_keys.kid, signing_keys.decoding.clone());

    let store: Arc<dyn PuzzleStore> = Arc::new(MemoryPuzzleStore::new());

    let state = AppState {
        store,
        jwks,
        config: Arc::new(test_config(auth_required)),
        chat: ChatHub::new(),
    };

    (state, signing_keys)
}

/// Build the full application router wired to the test state.
pub fn test_app(auth_required: bool) -> (Router, AppState, TestSigningKeys) {
    let (state, keys) = test_state(auth_required);
    let app = puzzle_api::routes::router().with_state(state.clone());
    (app, state, keys)
}

/// Start a real TCP server in the background for WebSocket tests.
pub async fn start_server() -> (SocketAddr, AppState) {
    let (app, state, _) = test_app(true);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    (addr, state)
}
