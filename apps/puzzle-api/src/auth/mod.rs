pub mod identity;
pub mod jwks;
pub mod middleware;
