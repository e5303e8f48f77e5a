use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::task::JoinError;
use tower::BoxError;
use tracing::error;

/// Body of every failed request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, text: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                name: "routeError",
                kind,
                text: text.into(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<snaproute_core::Error> for ApiError {
    fn from(err: snaproute_core::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.kind().as_str(), err.text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let kind = snaproute_core::ErrorKind::InvalidParameter.as_str();
        Self::new(StatusCode::BAD_REQUEST, kind, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let kind = snaproute_core::ErrorKind::InvalidParameter.as_str();
        Self::new(StatusCode::BAD_REQUEST, kind, rejection.body_text())
    }
}

/// Query parameters that do not fit the request shape
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        let kind = snaproute_core::ErrorKind::InvalidParameter.as_str();
        Self::new(StatusCode::BAD_REQUEST, kind, err.to_string())
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        error!(error = %err, "engine task failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalError",
            "internal error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub(crate) async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::new(
            StatusCode::REQUEST_TIMEOUT,
            "CanNotCompute",
            "request timed out",
        )
    } else {
        error!(error = %err, "unhandled middleware error");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalError",
            err.to_string(),
        )
    }
}
