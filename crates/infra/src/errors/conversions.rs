//! Conversions from external infrastructure errors into domain errors.

use ksef_domain::KsefError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KsefError);

impl From<InfraError> for KsefError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<KsefError> for InfraError {
    fn from(value: KsefError) -> Self {
        InfraError(value)
    }
}

trait IntoKsefError {
    fn into_ksef(self) -> KsefError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → KsefError */
/* -------------------------------------------------------------------------- */

impl IntoKsefError for SqlError {
    fn into_ksef(self) -> KsefError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        fn looks_like_wrong_key(message: &str) -> bool {
            let lower = message.to_ascii_lowercase();
            lower.contains("not a database") || lower.contains("encrypted")
        }

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => KsefError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        KsefError::Database("database is locked".into())
                    }
                    (ErrorCode::NotADatabase, _) => KsefError::Security(
                        "database key rejected or database not encrypted".into(),
                    ),
                    (ErrorCode::ConstraintViolation, 2067) => {
                        KsefError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        KsefError::Database("foreign key constraint violation".into())
                    }
                    (_, _) if looks_like_wrong_key(&message) => KsefError::Security(
                        "database key rejected or database not encrypted".into(),
                    ),
                    _ => KsefError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => KsefError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                KsefError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                KsefError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => KsefError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => KsefError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_ksef())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → KsefError */
/* -------------------------------------------------------------------------- */

impl IntoKsefError for PoolError {
    fn into_ksef(self) -> KsefError {
        let message = self.to_string();
        let lower = message.to_ascii_lowercase();
        if lower.contains("file is not a database") || lower.contains("file is encrypted") {
            KsefError::Security("database key rejected or database not encrypted".into())
        } else {
            KsefError::Database(format!("connection pool error: {message}"))
        }
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(value.into_ksef())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → KsefError */
/* -------------------------------------------------------------------------- */

impl IntoKsefError for HttpError {
    fn into_ksef(self) -> KsefError {
        if self.is_timeout() {
            return KsefError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return KsefError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => KsefError::Security(message),
                404 => KsefError::NotFound(message),
                400..=499 => KsefError::InvalidInput(message),
                _ => KsefError::Network(message),
            };
        }

        if self.is_decode() {
            return KsefError::Network(format!("unexpected response body: {self}"));
        }

        KsefError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_ksef())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
