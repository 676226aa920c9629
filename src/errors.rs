//! # Pagination errors
//!
//! Client input never produces an error: unknown columns, disallowed filter
//! operators and malformed sort pairs are dropped. What remains are
//! configuration mistakes, which are reported as `503 Service Unavailable`
//! because they are deployment bugs, and database failures, which are logged
//! and reported as a sanitised `500`.
//!
//! ```rust,ignore
//! async fn list_cats(
//!     State(db): State<DatabaseConnection>,
//!     query: PaginateQuery,
//! ) -> Result<Json<Paginated<cat::Model>>, PaginateError> {
//!     Ok(Json(paginate(&query, &db, &cat_config()).await?))
//! }
//! ```
//!
//! Internal details are logged with `tracing` when the error is turned into a
//! response; nothing is printed unless the application installs a subscriber.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum PaginateError {
    /// 503 Service Unavailable - the endpoint's `PaginateConfig` is unusable
    Misconfigured {
        /// Description of the configuration problem
        message: String,
    },

    /// 500 Internal Server Error - query execution failed (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - a row did not map into the requested type
    Row {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },
}

impl PaginateError {
    /// Create a 503 configuration error
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(PaginateError::misconfigured("No sortable columns configured"));
    /// ```
    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self::Misconfigured {
            message: message.into(),
        }
    }

    /// Create a 500 error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 error for a row that does not map into the requested type
    ///
    /// The mapping error is logged but NOT sent to the user.
    pub fn row(err: DbErr) -> Self {
        Self::Row {
            message: "A result row could not be read".to_string(),
            internal: err,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Misconfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database { .. } | Self::Row { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Misconfigured { message }
            | Self::Database { message, .. }
            | Self::Row { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error during pagination");
            }
            Self::Row { internal, .. } => {
                tracing::error!(error = ?internal, "Failed to map paginated row");
            }
            Self::Misconfigured { message } => {
                tracing::error!(details = %message, "Pagination misconfigured");
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for PaginateError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for PaginateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misconfigured { message } => write!(f, "{message}"),
            Self::Database { message, internal } | Self::Row { message, internal } => {
                write!(f, "{message}: {internal}")
            }
        }
    }
}

impl std::error::Error for PaginateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Misconfigured { .. } => None,
            Self::Database { internal, .. } | Self::Row { internal, .. } => Some(internal),
        }
    }
}

impl From<DbErr> for PaginateError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}
