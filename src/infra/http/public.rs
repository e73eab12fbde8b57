use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        error::{HttpError, PipelineError},
        posts::PostService,
        resolver::ResolveError,
    },
    presentation::views::TemplateRenderError,
};

use super::middleware::{log_responses, set_request_context};

const REDACTED_LISTING_MESSAGE: &str = "Failed to fetch blog posts";

/// Fixed pages rendered once at startup.
#[derive(Debug)]
struct FixedPages {
    not_found: String,
    error: String,
}

#[derive(Clone)]
pub struct HttpState {
    posts: Arc<PostService>,
    pages: Arc<FixedPages>,
    redact_errors: bool,
}

impl HttpState {
    pub fn new(posts: Arc<PostService>, redact_errors: bool) -> Result<Self, TemplateRenderError> {
        let assembler = posts.assembler();
        let pages = FixedPages {
            not_found: assembler.not_found_page()?,
            error: assembler.error_page()?,
        };

        Ok(Self {
            posts,
            pages: Arc::new(pages),
            redact_errors,
        })
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/fetch-blog", get(listing))
        .route("/api/posts", get(listing))
        .route("/api/blog", get(post_by_query))
        .route("/api/blog/{slug}", get(post_by_path))
        .route("/blog/{slug}", get(post_by_path))
        .route("/_health", get(health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SlugQuery {
    slug: Option<String>,
}

async fn listing(State(state): State<HttpState>) -> Response {
    match state.posts.listing().await {
        Ok(items) => Json(items).into_response(),
        Err(err) => {
            let message = match &err {
                _ if state.redact_errors => REDACTED_LISTING_MESSAGE.to_string(),
                ResolveError::Upstream(source) => source.message().to_string(),
                other => other.to_string(),
            };
            HttpError::from_error(
                "infra::http::public::listing",
                StatusCode::INTERNAL_SERVER_ERROR,
                REDACTED_LISTING_MESSAGE,
                &err,
            )
            .with_json_message(message)
            .into_response()
        }
    }
}

async fn post_by_query(State(state): State<HttpState>, Query(query): Query<SlugQuery>) -> Response {
    render_post(&state, query.slug.as_deref().unwrap_or_default()).await
}

async fn post_by_path(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    render_post(&state, &slug).await
}

async fn render_post(state: &HttpState, slug: &str) -> Response {
    match state.posts.render_post(slug).await {
        Ok(post) => Html(post.document).into_response(),
        Err(err) => pipeline_error_to_http(state, err).into_response(),
    }
}

fn pipeline_error_to_http(state: &HttpState, err: PipelineError) -> HttpError {
    const SOURCE: &str = "infra::http::public::render_post";

    let status = err.status_code();
    match &err {
        PipelineError::MissingSlug => HttpError::new(
            SOURCE,
            status,
            "Slug parameter is missing",
            "slug parameter absent or empty",
        ),
        PipelineError::NotFound { .. } => HttpError::from_error(SOURCE, status, "Not found", &err)
            .with_html(state.pages.not_found.clone()),
        PipelineError::Upstream(_) | PipelineError::Template(_) => {
            HttpError::from_error(SOURCE, status, "Internal server error", &err)
                .with_html(state.pages.error.clone())
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fallback(State(state): State<HttpState>) -> Response {
    HttpError::new(
        "infra::http::public::fallback",
        StatusCode::NOT_FOUND,
        "Not found",
        "no route matched",
    )
    .with_html(state.pages.not_found.clone())
    .into_response()
}
