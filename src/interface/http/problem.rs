use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::ProductError;

pub type ApiResult<T> = Result<T, ApiProblem>;

const BAD_REQUEST_TYPE: &str = "https://datatracker.ietf.org/doc/html/rfc7231#section-6.5.1";
const NOT_FOUND_TYPE: &str = "https://datatracker.ietf.org/doc/html/rfc7231#section-6.5.4";
const SERVER_ERROR_TYPE: &str = "https://datatracker.ietf.org/doc/html/rfc7231#section-6.6.1";

#[derive(Debug)]
pub struct ApiProblem {
    status: StatusCode,
    title: &'static str,
    detail: String,
    kind: &'static str,
    invalid_fields: Vec<&'static str>,
    correlation_id: String,
}

impl ApiProblem {
    pub fn from_domain(error: ProductError) -> Self {
        let detail = error.to_string();
        match error {
            ProductError::Validation(errors) => Self::new(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                BAD_REQUEST_TYPE,
                detail,
            )
            .with_invalid_fields(errors.fields()),
            ProductError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "Not found", NOT_FOUND_TYPE, detail)
            }
            ProductError::Decode(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid data file",
                BAD_REQUEST_TYPE,
                detail,
            ),
            ProductError::Io(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage error",
                SERVER_ERROR_TYPE,
                detail,
            ),
            ProductError::Internal(_) => Self::internal(detail),
        }
    }

    /// Malformed or incomplete request bodies rejected before reaching the service.
    pub fn from_rejection(rejection: JsonRejection) -> Self {
        Self::invalid_body(rejection.body_text())
    }

    pub fn invalid_body(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            BAD_REQUEST_TYPE,
            detail,
        )
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            SERVER_ERROR_TYPE,
            detail,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn new(
        status: StatusCode,
        title: &'static str,
        kind: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            title,
            detail: detail.into(),
            kind,
            invalid_fields: Vec::new(),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }

    fn with_invalid_fields(mut self, fields: Vec<&'static str>) -> Self {
        self.invalid_fields = fields;
        self
    }
}

impl From<ProductError> for ApiProblem {
    fn from(error: ProductError) -> Self {
        Self::from_domain(error)
    }
}

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    invalid_fields: Vec<&'static str>,
    correlation_id: String,
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                status = self.status.as_u16(),
                correlation_id = %self.correlation_id,
                detail = %self.detail,
                "request failed"
            );
        } else {
            debug!(
                status = self.status.as_u16(),
                correlation_id = %self.correlation_id,
                detail = %self.detail,
                "request rejected"
            );
        }

        let payload = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_fields: self.invalid_fields,
            correlation_id: self.correlation_id,
        };

        let mut response = (self.status, Json(payload)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );

        response
    }
}
