//! SQLite connection pool
//!
//! r2d2 pool over `r2d2_sqlite`. Every new connection applies the optional
//! SQLCipher key first, then the connection pragmas.

use std::path::Path;
use std::time::Duration;

use ksef_domain::{KsefError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::errors::InfraError;

pub type SqlitePool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode=WAL;
PRAGMA wal_autocheckpoint=1000;
PRAGMA synchronous=NORMAL;
PRAGMA foreign_keys=ON;";

/// Build the pool and verify the first connection can read the schema.
///
/// # Errors
/// `Security` when the key does not open the file, `Database` otherwise.
pub fn create_pool(
    path: &Path,
    max_size: u32,
    encryption_key: Option<String>,
) -> Result<SqlitePool> {
    let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
        if let Some(key) = encryption_key.as_deref() {
            conn.pragma_update(None, "key", key)?;
        }
        apply_connection_pragmas(conn)
    });

    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
        .map_err(|err| {
            warn!(error = %err, "failed to create connection pool");
            KsefError::from(InfraError::from(err))
        })?;

    let conn = pool.get().map_err(|err| KsefError::from(InfraError::from(err)))?;
    verify_readable(&conn)?;
    debug!(max_size = pool.max_size(), "connection pool verified");

    Ok(pool)
}

fn apply_connection_pragmas(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CONNECTION_PRAGMAS)?;
    conn.busy_timeout(BUSY_TIMEOUT)
}

/// Reading `sqlite_master` forces SQLCipher to decrypt the first page.
fn verify_readable(conn: &Connection) -> Result<()> {
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map(|_| ())
        .map_err(|err| KsefError::from(InfraError::from(err)))
}
