/// Issuer prefix used by the default identity provider; the project ID is appended.
pub const DEFAULT_ISSUER_BASE: &str = "https://securetoken.google.com/";

/// Public signing keys of the default identity provider.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Puzzle API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Whether `/api/puzzles*` requires a bearer ID token.
    pub auth_required: bool,
    /// JWKS endpoint of the identity provider.
    pub identity_jwks_url: String,
    /// Expected `iss` claim of ID tokens.
    pub identity_issuer: String,
    /// Expected `aud` claim of ID tokens (the provider project ID).
    pub identity_audience: String,
    /// Seed a demo author and puzzles when the puzzle table is empty.
    pub seed_demo_data: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        let auth_required = flag_var("AUTH_REQUIRED", true);

        let project_id = match optional_var("IDENTITY_PROJECT_ID") {
            Some(id) => id,
            None if auth_required => {
                panic!("IDENTITY_PROJECT_ID env var is required when AUTH_REQUIRED is enabled")
            }
            None => String::new(),
        };

        Self {
            database_url: required_var("DATABASE_URL"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            auth_required,
            identity_jwks_url: optional_var("IDENTITY_JWKS_URL")
                .unwrap_or_else(|| DEFAULT_JWKS_URL.to_string()),
            identity_issuer: optional_var("IDENTITY_ISSUER")
                .unwrap_or_else(|| format!("{DEFAULT_ISSUER_BASE}{project_id}")),
            identity_audience: project_id,
            seed_demo_data: flag_var("SEED_DEMO_DATA", false),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn flag_var(name: &str, default: bool) -> bool {
    optional_var(name)
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

/// Parse a boolean-ish env value. Unknown values yield `None`.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
