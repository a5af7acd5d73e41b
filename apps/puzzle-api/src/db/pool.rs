use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

pub type DbPool = Pool<AsyncPgConnection>;

/// Maximum pooled PostgreSQL connections.
const MAX_CONNECTIONS: usize = 20;

/// Create a Diesel async connection pool.
///
/// Connections are opened lazily, so this succeeds even if the database is
/// not reachable yet.
pub fn connect(database_url: &str) -> Result<DbPool, diesel_async::pooled_connection::deadpool::BuildError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager).max_size(MAX_CONNECTIONS).build()?;

    tracing::info!(max_size = MAX_CONNECTIONS, "database pool created");

    Ok(pool)
}
