pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use auth::jwks::JwksClient;
use chat::ChatHub;
use config::Config;
use db::PuzzleStore;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PuzzleStore>,
    pub jwks: JwksClient,
    pub config: Arc<Config>,
    pub chat: ChatHub,
}
