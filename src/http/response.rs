//! Rendering of pipeline outcomes.
//!
//! # Responsibilities
//! - Map `ProxyOutcome` to a status code and body
//! - Relay the upstream content type on success
//! - Emit generic JSON errors that never leak resolution detail
//!
//! # Design Decisions
//! - Rejections are 400, upstream failures are 500
//! - CORS headers are added by a layer, independent of the outcome

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::ProxyOutcome;

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub code: &'static str,
}

pub fn status_for(outcome: &ProxyOutcome) -> StatusCode {
    match outcome {
        ProxyOutcome::Success { .. } => StatusCode::OK,
        ProxyOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
        ProxyOutcome::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ProxyOutcome {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        match self {
            ProxyOutcome::Success { content_type, body } => {
                (status, [(header::CONTENT_TYPE, content_type)], Body::from(body)).into_response()
            }
            ProxyOutcome::Rejected(reason) => (
                status,
                Json(ErrorBody {
                    error: reason.message(),
                    code: reason.code(),
                }),
            )
                .into_response(),
            ProxyOutcome::UpstreamFailure(reason) => (
                status,
                Json(ErrorBody {
                    error: reason.message(),
                    code: reason.code(),
                }),
            )
                .into_response(),
        }
    }
}
