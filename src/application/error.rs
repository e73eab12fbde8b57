use std::error::Error as StdError;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{
    application::{generate::GenerateError, resolver::ResolveError, source::SourceError},
    config::LoadError,
    infra::error::InfraError,
    presentation::views::TemplateRenderError,
};

/// Error chain attached to a response so the logging middleware can report it.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
enum ErrorBody {
    Text(&'static str),
    Html(String),
    Json(String),
}

/// An error response: public body plus the internal report.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    body: ErrorBody,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: ErrorBody::Text(public_message),
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            body: ErrorBody::Text(public_message),
            report: ErrorReport::from_error(source, status, error),
        }
    }

    /// Replace the public body with a prepared HTML page.
    pub fn with_html(mut self, page: impl Into<String>) -> Self {
        self.body = ErrorBody::Html(page.into());
        self
    }

    /// Replace the public body with `{"error": message}`.
    pub fn with_json_message(mut self, message: impl Into<String>) -> Self {
        self.body = ErrorBody::Json(message.into());
        self
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            ErrorBody::Text(message) => (
                self.status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response(),
            ErrorBody::Html(page) => (self.status, Html(page)).into_response(),
            ErrorBody::Json(message) => {
                (self.status, Json(json!({ "error": message }))).into_response()
            }
        };
        self.report.attach(&mut response);
        response
    }
}

/// Failure of the single-entry pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("slug parameter is missing")]
    MissingSlug,
    #[error("no published entry with slug `{slug}`")]
    NotFound { slug: String },
    #[error(transparent)]
    Upstream(#[from] SourceError),
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

impl From<ResolveError> for PipelineError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NotFound { slug } => PipelineError::NotFound { slug },
            ResolveError::Upstream(err) => PipelineError::Upstream(err),
        }
    }
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::MissingSlug => StatusCode::BAD_REQUEST,
            PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::Upstream(_) | PipelineError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_collects_the_source_chain() {
        let err = PipelineError::from(ResolveError::Upstream(SourceError::Transport(
            "connection reset".to_string(),
        )));
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &err);
        assert_eq!(
            report.messages,
            vec!["request to content source failed: connection reset".to_string()]
        );
    }

    #[test]
    fn pipeline_errors_map_to_statuses() {
        assert_eq!(PipelineError::MissingSlug.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PipelineError::NotFound {
                slug: "x".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PipelineError::Upstream(SourceError::Decode("eof".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn http_error_keeps_report_in_extensions() {
        let response = HttpError::new(
            "test",
            StatusCode::BAD_REQUEST,
            "Slug parameter is missing",
            "no slug",
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let report = response.extensions().get::<ErrorReport>().expect("report");
        assert_eq!(report.messages, vec!["no slug".to_string()]);
    }
}
