//! Standalone migration runner for puzzle-api.
//!
//! Usage:
//!   cargo run -p puzzle-api --bin puzzle-migrate
//!   cargo run -p puzzle-api --bin puzzle-migrate -- --test
//!   cargo run -p puzzle-api --bin puzzle-migrate -- --revert
//!
//! Reads DATABASE_URL from the environment (or .env via dotenvy).

use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

fn main() {
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL env var is required");
    let database_url = if args.iter().any(|arg| arg == "--test") {
        with_test_db_suffix(&base_url)
    } else {
        base_url
    };

    println!("Connecting to database...");
    let mut conn = PgConnection::establish(&database_url).expect("failed to connect to database");

    if args.iter().any(|arg| arg == "--revert") {
        let reverted = conn
            .revert_last_migration(MIGRATIONS)
            .expect("failed to revert migration");
        println!("  Reverted: {reverted}");
        return;
    }

    println!("Running pending migrations...");
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .expect("failed to run migrations");

    if applied.is_empty() {
        println!("No pending migrations.");
    } else {
        for migration in &applied {
            println!("  Applied: {migration}");
        }
        println!("{} migration(s) applied.", applied.len());
    }
}

/// Point `database_url` at `<db>_test`, keeping any query string.
fn with_test_db_suffix(database_url: &str) -> String {
    let (base, query) = match database_url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (database_url, None),
    };

    let Some((prefix, db_name)) = base.rsplit_once('/') else {
        return database_url.to_string();
    };
    if db_name.is_empty() || db_name.ends_with("_test") {
        return database_url.to_string();
    }

    match query {
        Some(query) => format!("{prefix}/{db_name}_test?{query}"),
        None => format!("{prefix}/{db_name}_test"),
    }
}
