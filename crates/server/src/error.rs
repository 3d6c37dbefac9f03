use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use services::services::{subtask::SubtaskServiceError, task::TaskServiceError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskServiceError),
    #[error(transparent)]
    Subtask(#[from] SubtaskServiceError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Task(err) => match err {
                TaskServiceError::TaskNotFound => StatusCode::NOT_FOUND,
                TaskServiceError::Validation(_)
                | TaskServiceError::InvalidAssignee
                | TaskServiceError::NoFieldsProvided => StatusCode::BAD_REQUEST,
                TaskServiceError::Database(err) => db_status(err),
            },
            ApiError::Subtask(err) => match err {
                SubtaskServiceError::SubtaskNotFound | SubtaskServiceError::TaskNotFound => {
                    StatusCode::NOT_FOUND
                }
                SubtaskServiceError::Validation(_)
                | SubtaskServiceError::InvalidTaskId
                | SubtaskServiceError::InvalidAssignee
                | SubtaskServiceError::NoFieldsProvided => StatusCode::BAD_REQUEST,
                SubtaskServiceError::Database(err) => db_status(err),
            },
            ApiError::Database(err) => db_status(err),
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn db_status(err: &DbErr) -> StatusCode {
    match err {
        DbErr::RecordNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<&'static str> for ApiError {
    fn from(msg: &'static str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        // Unexpected failures are logged with their cause but never echoed
        // to the caller.
        let message = if status_code.is_server_error() {
            tracing::error!("API error: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status_code, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = ApiError::Task(TaskServiceError::Validation(vec![
            "title must be at least 3 characters".to_string(),
            "priority must be one of low, medium, high".to_string(),
        ]));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("title"));
        assert!(err.to_string().contains("priority"));
    }

    #[test]
    fn missing_records_map_to_not_found() {
        assert_eq!(
            ApiError::Task(TaskServiceError::TaskNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Subtask(SubtaskServiceError::SubtaskNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Subtask(SubtaskServiceError::TaskNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn referential_failures_map_to_bad_request() {
        assert_eq!(
            ApiError::Subtask(SubtaskServiceError::InvalidTaskId).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Task(TaskServiceError::InvalidAssignee).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Task(TaskServiceError::NoFieldsProvided).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unexpected_database_errors_are_internal() {
        let err = ApiError::Database(DbErr::Custom("connection reset".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::Database(DbErr::RecordNotFound("task".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn server_error_bodies_carry_a_generic_message() {
        let err = ApiError::Task(TaskServiceError::Database(DbErr::Custom(
            "connection reset".to_string(),
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("connection reset"));
        assert!(body.contains("Internal server error"));
    }

    #[tokio::test]
    async fn client_error_bodies_keep_the_specific_message() {
        let err = ApiError::Task(TaskServiceError::Validation(vec![
            "title must be between 3 and 255 characters".to_string(),
        ]));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("title must be between 3 and 255 characters"));
    }
}
