use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::errors::{BoardError, FieldErrors};

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthenticated(String),
    Conflict(String),
    Validation(FieldErrors),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({"errors": errors})),
                )
                    .into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        classify(&err)
    }
}

/// Storage errors arrive as `anyhow::Error`; typed board errors inside are
/// recovered by downcast, anything else is a 500.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<BoardError>() {
            Some(board_err) => classify(board_err),
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

fn classify(err: &BoardError) -> ApiError {
    let msg = err.to_string();
    match err {
        BoardError::NotFound { .. } => ApiError::NotFound(msg),
        BoardError::Unauthenticated => ApiError::Unauthenticated(msg),
        BoardError::InvalidTransition { .. }
        | BoardError::Conflict(_)
        | BoardError::LastOwner { .. } => ApiError::Conflict(msg),
        BoardError::Validation(errors) => ApiError::Validation(errors.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Entity;
    use http_body_util::BodyExt;

    async fn status_and_body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_through_anyhow_context() {
        let err = anyhow::Error::from(BoardError::not_found(Entity::Board, 9))
            .context("Failed to load board");
        let (status, body) = status_and_body(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Board 9 not found");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let err = anyhow::Error::from(BoardError::invalid("name", "Please enter a board name"));
        let (status, body) = status_and_body(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"][0], "Please enter a board name");
    }

    #[tokio::test]
    async fn test_conflicts_map_to_409() {
        for err in [
            BoardError::Conflict("taken".into()),
            BoardError::LastOwner { board_id: 1 },
            BoardError::InvalidTransition {
                sprint_id: 1,
                action: "start",
                state: "active",
            },
        ] {
            let (status, _) = status_and_body(ApiError::from(err)).await;
            assert_eq!(status, StatusCode::CONFLICT);
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_is_401() {
        let (status, _) = status_and_body(ApiError::from(BoardError::Unauthenticated)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_untyped_error_is_500() {
        let (status, body) = status_and_body(ApiError::from(anyhow::anyhow!("disk full"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "disk full");
    }
}
