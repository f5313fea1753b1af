use axum::extract::rejection::FormRejection;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

use crate::service::credential_checker::AuthOutcome;

/// Postgres SQLSTATE for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, ThisError)]
pub enum DeskError {
    #[error("data already exists under key `{0}`")]
    DuplicateKey(String),

    #[error("no data under key `{0}`")]
    NotFound(String),

    #[error("authentication failed: {0:?}")]
    InvalidCredentials(AuthOutcome),

    #[error("`{0}` is not a valid integer")]
    InvalidNumericInput(String),

    #[error("invalid form: {message}")]
    InvalidForm { status: StatusCode, message: String },

    #[error("database unavailable: {0}")]
    DatabaseUnavailable(SqlxError),

    #[error("student table does not exist")]
    SchemaMissing,

    #[error("Database error: {0}")]
    DatabaseError(SqlxError),

    #[error("action `{action}` is not permitted for role `{role}`")]
    Forbidden { action: String, role: String },

    #[error("`{event}` does not apply to screen `{screen}`")]
    InvalidTransition { screen: String, event: String },

    #[error("sign-up is not available")]
    SignupUnavailable,

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("credential file error: {0}")]
    CredentialFile(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),
}

impl From<SqlxError> for DeskError {
    fn from(e: SqlxError) -> Self {
        let unreachable = matches!(
            e,
            SqlxError::PoolTimedOut
                | SqlxError::PoolClosed
                | SqlxError::Io(_)
                | SqlxError::Tls(_)
                | SqlxError::WorkerCrashed
        );
        let missing_table = matches!(
            &e,
            SqlxError::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE)
        );

        if unreachable {
            DeskError::DatabaseUnavailable(e)
        } else if missing_table {
            DeskError::SchemaMissing
        } else {
            DeskError::DatabaseError(e)
        }
    }
}

impl From<FormRejection> for DeskError {
    fn from(rejection: FormRejection) -> Self {
        DeskError::InvalidForm {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl DeskError {
    pub fn status(&self) -> StatusCode {
        match self {
            DeskError::DuplicateKey(_) | DeskError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            DeskError::NotFound(_) | DeskError::SchemaMissing => StatusCode::NOT_FOUND,
            DeskError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            DeskError::InvalidNumericInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DeskError::InvalidForm { status, .. } => *status,
            DeskError::DatabaseUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DeskError::Forbidden { .. } => StatusCode::FORBIDDEN,
            DeskError::SignupUnavailable => StatusCode::NOT_IMPLEMENTED,
            DeskError::DatabaseError(_)
            | DeskError::Cipher(_)
            | DeskError::CredentialFile(_)
            | DeskError::JsonError(_)
            | DeskError::RactorError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ApiErrorBody {
        let (code, message) = match self {
            DeskError::DuplicateKey(_) => ("DUPLICATE_KEY", self.to_string()),
            DeskError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            DeskError::InvalidCredentials(outcome) => match outcome {
                AuthOutcome::UserNotFound => {
                    ("USER_NOT_FOUND", "No user with this login exists.".to_string())
                }
                AuthOutcome::WrongPassword => {
                    ("WRONG_PASSWORD", "The password is incorrect.".to_string())
                }
                AuthOutcome::AdminRejected => (
                    "ADMIN_REJECTED",
                    "Do not impersonate the administrator.".to_string(),
                ),
                AuthOutcome::Success | AuthOutcome::Other => (
                    "AUTH_FAILED",
                    "An unexpected problem occurred during sign-in.".to_string(),
                ),
            },
            DeskError::InvalidNumericInput(_) => ("INVALID_NUMBER", self.to_string()),
            DeskError::InvalidForm { message, .. } => ("INVALID_FORM", message.clone()),
            DeskError::DatabaseUnavailable(_) => (
                "DATABASE_UNAVAILABLE",
                "The database is unreachable.".to_string(),
            ),
            DeskError::SchemaMissing => (
                "SCHEMA_MISSING",
                "The database appears to be empty.".to_string(),
            ),
            DeskError::Forbidden { .. } => ("FORBIDDEN", self.to_string()),
            DeskError::InvalidTransition { .. } => ("INVALID_TRANSITION", self.to_string()),
            DeskError::SignupUnavailable => (
                "SIGNUP_UNAVAILABLE",
                "Creating accounts is not available.".to_string(),
            ),
            DeskError::DatabaseError(_)
            | DeskError::Cipher(_)
            | DeskError::CredentialFile(_)
            | DeskError::JsonError(_)
            | DeskError::RactorError(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };
        ApiErrorBody {
            code: code.to_string(),
            message,
        }
    }
}

impl IntoResponse for DeskError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status(),
            Json(ApiErrorResponse { error: self.body() }),
        )
            .into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
