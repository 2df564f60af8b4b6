use axum::http::StatusCode;
use axum::Json;
use order_service::ServiceError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiRejection = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(message: impl Into<String>) -> ApiRejection {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn forbidden(message: impl Into<String>) -> ApiRejection {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map service errors to transport results. Client-facing bodies stay
/// non-sensitive: infrastructure detail is logged, not returned.
pub fn map_service_error(e: ServiceError) -> ApiRejection {
    match e {
        ServiceError::Validation(e) => bad_request(e.to_string()),
        ServiceError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Order not found: {id}"),
            }),
        ),
        ServiceError::Forbidden(_) => forbidden("Caller may not act on this order"),
        ServiceError::TransitionRejected(rejection) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: rejection.to_string(),
            }),
        ),
        ServiceError::ConflictExhausted(id) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: format!("Order {id} is under concurrent modification, retry later"),
            }),
        ),
        ServiceError::Store(e) => {
            error!(error = %e, "store failure while serving request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal error".to_string(),
                }),
            )
        }
    }
}
