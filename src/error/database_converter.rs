use crate::error::AppError;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to structured AppError variants.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = info.message();

        match kind {
            DatabaseErrorKind::UniqueViolation => {
                match info.details().and_then(Self::parse_key_detail) {
                    Some((field, value)) => AppError::Duplicate {
                        entity: info.table_name().unwrap_or("resource").to_string(),
                        field,
                        value,
                    },
                    None => AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::msg(format!(
                            "Unique constraint violation: {}",
                            message
                        )),
                    },
                }
            }
            DatabaseErrorKind::ClosedConnection => AppError::ConnectionPool {
                source: anyhow::Error::msg(message.to_string()),
            },
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", message)),
            },
        }
    }

    /// Extracts `(column, value)` from a PostgreSQL detail line such as
    /// `Key (id)=(7) already exists.`
    fn parse_key_detail(detail: &str) -> Option<(String, String)> {
        let rest = detail.trim().strip_prefix("Key (")?;
        let (field, rest) = rest.split_once(")=(")?;
        let (value, _) = rest.rsplit_once(')')?;
        Some((field.to_string(), value.to_string()))
    }
}
