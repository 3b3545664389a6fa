use async_trait::async_trait;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

/// Middleware attached to a controller or a single route.
///
/// Declaration order is execution order: the first declared middleware sees
/// the request first and may short-circuit by not calling `next`.
/// Controller-level middleware runs before route-level middleware.
///
/// # Example
/// ```rust,ignore
/// struct RequireAuth;
///
/// #[async_trait]
/// impl Middleware for RequireAuth {
///     async fn handle(&self, request: Request, next: Next) -> Response {
///         if request.headers().get("authorization").is_none() {
///             return StatusCode::UNAUTHORIZED.into_response();
///         }
///         next.run(request).await
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, request: Request, next: Next) -> Response;
}

/// Built-in middleware that logs method, uri, status and latency.
#[derive(Clone, Copy, Default)]
pub struct RequestLogger;

#[async_trait]
impl Middleware for RequestLogger {
    async fn handle(&self, request: Request, next: Next) -> Response {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let start = Instant::now();

        let response = next.run(request).await;

        tracing::info!(
            %method,
            %uri,
            status = %response.status(),
            elapsed = ?start.elapsed(),
            "request handled"
        );
        response
    }
}
