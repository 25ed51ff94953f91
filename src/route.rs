use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{error::LookupError, service::LineService, source::ByteSource, Indexable, Result};

/// A request target the line service knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Welcome,
    /// `/lines`
    LineCount,
    /// `/lines/<line>`, holding the unparsed line parameter
    Line(String),
}

/// A plain text answer of the line service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new<B: Into<Vec<u8>>>(status: StatusCode, body: B) -> Response {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response with the reason phrase of `status` as body
    pub fn status(status: StatusCode) -> Response {
        Self::new(status, status.canonical_reason().unwrap_or_default())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body,
        )
            .into_response()
    }
}

/// Answers `route` using `service`.
///
/// Invalid or out of range line numbers are answered with `400` and `413` and never reach the
/// resolver. Errors of the resolver itself are returned to the caller.
pub async fn respond<S: ByteSource>(service: &LineService<S>, route: &Route) -> Result<Response> {
    match route {
        Route::Welcome => Ok(Response::new(
            StatusCode::OK,
            format!(
                "Welcome to the line server. Currently serving lines from {}.",
                service.filename()
            ),
        )),
        Route::LineCount => Ok(Response::new(
            StatusCode::OK,
            format!(
                "{} contains {} lines.",
                service.filename(),
                service.total_lines()
            ),
        )),
        Route::Line(param) => {
            let mut buf = Vec::new();
            match service.lookup_raw(param, &mut buf).await {
                Ok(_) => Ok(Response::new(StatusCode::OK, buf)),
                Err(LookupError::InvalidLineNumber(param)) => {
                    tracing::debug!("Rejecting invalid line number '{}'", param);
                    Ok(Response::status(StatusCode::BAD_REQUEST))
                }
                Err(LookupError::LineOutOfRange { requested, .. }) => {
                    tracing::debug!("Rejecting out of range line {}", requested);
                    Ok(Response::status(StatusCode::PAYLOAD_TOO_LARGE))
                }
                Err(LookupError::Core(err)) => Err(err),
            }
        }
    }
}
