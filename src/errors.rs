use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the local key-value layer. These always reach the caller.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing {key} ({needed} of {quota} bytes)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("failed to write store file: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid goal: {0}")]
    InvalidGoal(String),

    #[error("invalid session: {0}")]
    InvalidSession(String),

    #[error("invalid todo: {0}")]
    InvalidTodo(String),

    #[error("goal not found: {0}")]
    GoalNotFound(String),

    #[error("todo not found: {0}")]
    TodoNotFound(String),
}

/// Failures talking to the remote API. Logged and dropped by the sync shim.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote responded with status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("invalid remote base url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidGoal(_)
            | StorageError::InvalidSession(_)
            | StorageError::InvalidTodo(_) => {
                Self::bad_request(err.to_string())
            }
            StorageError::GoalNotFound(_) | StorageError::TodoNotFound(_) => {
                Self::not_found(err.to_string())
            }
            other => Self::internal(other),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = axum::Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_http_status() {
        let invalid: AppError = StorageError::InvalidGoal("missing title".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let missing: AppError = StorageError::GoalNotFound("abc".into()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let quota: AppError = StorageError::QuotaExceeded {
            key: "k".into(),
            needed: 10,
            quota: 5,
        }
        .into();
        assert_eq!(quota.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
