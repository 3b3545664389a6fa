//! Response-shaping result objects.
//!
//! A handler can return any `IntoResponse` value directly, or one of these
//! result objects when it wants to take over response writing. The dispatcher
//! only knows the [`ActionResult`] capability; adding a variant means
//! implementing the trait, nothing else.

use crate::extract::RequestCtx;
use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// The one capability a result object has: write itself to the response.
/// Created by a handler's return value and consumed exactly once.
#[async_trait]
pub trait ActionResult: Send + 'static {
    async fn apply(self: Box<Self>, ctx: &RequestCtx) -> Response;
}

/// Redirects the client, carrying no body.
#[derive(Debug, Clone)]
pub struct Redirect {
    status: StatusCode,
    location: String,
}

impl Redirect {
    /// 302 Found.
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FOUND,
            location: location.into(),
        }
    }

    /// 303 See Other.
    pub fn see_other(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SEE_OTHER,
            location: location.into(),
        }
    }

    /// 301 Moved Permanently.
    pub fn permanent(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::MOVED_PERMANENTLY,
            location: location.into(),
        }
    }

    /// 307 Temporary Redirect.
    pub fn temporary(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TEMPORARY_REDIRECT,
            location: location.into(),
        }
    }
}

#[async_trait]
impl ActionResult for Redirect {
    async fn apply(self: Box<Self>, _ctx: &RequestCtx) -> Response {
        (self.status, [(header::LOCATION, self.location)]).into_response()
    }
}

/// 204 No Content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

#[async_trait]
impl ActionResult for NoContent {
    async fn apply(self: Box<Self>, _ctx: &RequestCtx) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method};
    use std::collections::HashMap;

    fn ctx() -> RequestCtx {
        RequestCtx::new(
            Method::GET,
            "/".parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn redirect_writes_status_and_location() {
        let response = Box::new(Redirect::to("/")).apply(&ctx()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn no_content_has_no_body() {
        let response = Box::new(NoContent).apply(&ctx()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
