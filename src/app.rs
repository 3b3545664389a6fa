//! Application assembly.
//!
//! The builder collects controller types and the provider container, then
//! `build()` constructs every controller through the resolver and mounts its
//! routes. `before`/`after` hooks let the embedding application touch the
//! router around controller registration. Note that axum layers apply to
//! routes added *before* the `layer` call, so cross-cutting layers belong in
//! the `after` hook.

use crate::bind;
use crate::controller::Controller;
use crate::di::Container;
use crate::error::{Result, TachiError};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

type Hook = Box<dyn FnOnce(Router) -> Router + Send>;
type MountFn = Box<dyn FnOnce(&Container, Router) -> Result<Router> + Send>;

/// Builder for a [`App`]: controllers, container and router hooks.
pub struct AppBuilder {
    container: Container,
    mounts: Vec<MountFn>,
    before: Option<Hook>,
    after: Option<Hook>,
}

impl AppBuilder {
    fn new() -> Self {
        Self {
            container: Container::new(),
            mounts: Vec::new(),
            before: None,
            after: None,
        }
    }

    /// Provider container used to construct the controllers.
    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Register a controller type. Construction and binding are deferred to
    /// [`build`](Self::build), so configuration errors surface there.
    pub fn controller<C: Controller>(mut self) -> Self {
        self.mounts.push(Box::new(|container, router| {
            let instance =
                container
                    .construct::<C>()
                    .map_err(|source| TachiError::ControllerBuild {
                        controller: C::name(),
                        source: Box::new(source),
                    })?;
            bind::mount(router, Arc::new(instance))
        }));
        self
    }

    /// Hook run on the bare router before any controller is mounted.
    pub fn before(mut self, hook: impl FnOnce(Router) -> Router + Send + 'static) -> Self {
        self.before = Some(Box::new(hook));
        self
    }

    /// Hook run after every controller is mounted.
    pub fn after(mut self, hook: impl FnOnce(Router) -> Router + Send + 'static) -> Self {
        self.after = Some(Box::new(hook));
        self
    }

    /// Construct every controller and bind its routes.
    ///
    /// # Errors
    /// Configuration errors (missing providers, dependency cycles, invalid
    /// paths, routes without handlers) are fatal here, before serving starts.
    pub fn build(self) -> Result<App> {
        let mut router = Router::new();

        if let Some(hook) = self.before {
            router = hook(router);
        }
        for mount in self.mounts {
            router = mount(&self.container, router)?;
        }
        if let Some(hook) = self.after {
            router = hook(router);
        }

        Ok(App {
            router,
            container: Arc::new(self.container),
        })
    }
}

/// A fully wired application, ready to serve or to embed as a router.
#[derive(Debug)]
pub struct App {
    router: Router,
    container: Arc<Container>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Bind `addr` and serve until the process stops.
    pub async fn listen(self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| TachiError::Serve {
                message: format!("{addr}: {err}"),
            })?;
        tracing::info!(%addr, "server listening");
        axum::serve(listener, self.router)
            .await
            .map_err(|err| TachiError::Serve {
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{ContainerBuilder, Injectable, Resolver};
    use crate::extract::{body_json, extractor, path_param, query, RequestCtx};
    use crate::meta::{ControllerMeta, Route};
    use crate::middleware::Middleware;
    use crate::result::Redirect;
    use async_trait::async_trait;
    use axum::body::{Body, Bytes};
    use axum::extract::Request;
    use axum::http::{header, Method, StatusCode};
    use axum::middleware::Next;
    use axum::response::Response;
    use axum::Json;
    use http_body_util::BodyExt;
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use tower::ServiceExt;

    async fn send(router: Router, method: Method, uri: &str, body: Body) -> (StatusCode, Bytes) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes)
    }

    async fn get_response(router: Router, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap()
    }

    struct GreetingService {
        message: String,
    }

    impl Injectable for GreetingService {
        fn inject(_resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self {
                message: "value".to_string(),
            })
        }
    }

    struct HomeController {
        greetings: std::sync::Arc<GreetingService>,
    }

    impl Injectable for HomeController {
        fn inject(resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self {
                greetings: resolver.resolve()?,
            })
        }
    }

    impl HomeController {
        async fn index(self: Arc<Self>) -> Json<Value> {
            Json(json!({ "test": self.greetings.message }))
        }

        async fn redirect(self: Arc<Self>) -> Redirect {
            Redirect::to("/")
        }
    }

    impl Controller for HomeController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("/")
                .route(Route::get("/").handler(Self::index))
                .route(Route::get("/redirect").handler(Self::redirect))
        }
    }

    fn home_app() -> App {
        App::builder()
            .container(ContainerBuilder::new().provide::<GreetingService>().build())
            .controller::<HomeController>()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn root_controller_serves_json_at_root() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let (status, body) = send(home_app().into_router(), Method::GET, "/", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "test": "value" }));
    }

    #[tokio::test]
    async fn redirect_result_writes_location_and_no_body() {
        let response = get_response(home_app().into_router(), "/redirect").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn unmatched_paths_miss_the_controller() {
        let response = get_response(home_app().into_router(), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // -- constructor injection failures ------------------------------------

    struct MissingDep;

    struct BrokenController {
        _dep: Arc<MissingDep>,
    }

    impl Injectable for BrokenController {
        fn inject(resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self {
                _dep: resolver.resolve()?,
            })
        }
    }

    impl Controller for BrokenController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("/broken")
        }
    }

    #[tokio::test]
    async fn missing_provider_fails_build_naming_controller_and_token() {
        let err = App::builder()
            .controller::<BrokenController>()
            .build()
            .unwrap_err();
        match err {
            TachiError::ControllerBuild { controller, source } => {
                assert!(controller.contains("BrokenController"));
                match *source {
                    TachiError::DependencyNotFound { token } => {
                        assert!(token.contains("MissingDep"), "got token: {token}");
                    }
                    other => panic!("expected DependencyNotFound, got {other:?}"),
                }
            }
            other => panic!("expected ControllerBuild, got {other:?}"),
        }
    }

    struct BadPathController;

    impl Injectable for BadPathController {
        fn inject(_resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self)
        }
    }

    impl Controller for BadPathController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("posts")
        }
    }

    #[tokio::test]
    async fn base_path_without_slash_fails_build() {
        let err = App::builder()
            .controller::<BadPathController>()
            .build()
            .unwrap_err();
        match err {
            TachiError::InvalidPath { controller, path } => {
                assert!(controller.contains("BadPathController"));
                assert_eq!(path, "posts");
            }
            other => panic!("expected InvalidPath, got {other:?}"),
        }
    }

    struct NoHandlerController;

    impl Injectable for NoHandlerController {
        fn inject(_resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self)
        }
    }

    impl Controller for NoHandlerController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("/things").route(Route::get("/"))
        }
    }

    #[tokio::test]
    async fn route_without_handler_fails_build() {
        let err = App::builder()
            .controller::<NoHandlerController>()
            .build()
            .unwrap_err();
        assert!(matches!(err, TachiError::MissingHandler { .. }));
    }

    struct DoubledController;

    impl Injectable for DoubledController {
        fn inject(_resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self)
        }
    }

    impl DoubledController {
        async fn index(self: Arc<Self>) -> &'static str {
            "ok"
        }
    }

    impl Controller for DoubledController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("/doubled")
                .route(Route::get("/x").handler(Self::index))
                .route(Route::get("/x").handler(Self::index))
        }
    }

    #[tokio::test]
    async fn duplicate_route_is_a_build_error_not_a_panic() {
        let err = App::builder()
            .controller::<DoubledController>()
            .build()
            .unwrap_err();
        match err {
            TachiError::DuplicateRoute {
                controller,
                verb,
                path,
            } => {
                assert!(controller.contains("DoubledController"));
                assert_eq!(verb, "GET");
                assert_eq!(path, "/x");
            }
            other => panic!("expected DuplicateRoute, got {other:?}"),
        }
    }

    // -- parameter extraction ----------------------------------------------

    #[derive(Deserialize)]
    struct Pagination {
        page: u32,
    }

    #[derive(Serialize, Deserialize)]
    struct NewPost {
        title: String,
    }

    struct PostController;

    impl Injectable for PostController {
        fn inject(_resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self)
        }
    }

    impl PostController {
        async fn show(self: Arc<Self>, id: String) -> String {
            format!("post {id}")
        }

        async fn list(self: Arc<Self>, pagination: Pagination) -> String {
            format!("page {}", pagination.page)
        }

        async fn create(self: Arc<Self>, post: NewPost) -> Json<NewPost> {
            Json(post)
        }

        async fn ordered(self: Arc<Self>, a: String, b: String, c: String) -> String {
            format!("{a}{b}{c}")
        }

        async fn slow(self: Arc<Self>, a: String, b: String) -> String {
            format!("{a}{b}")
        }

        async fn echo(self: Arc<Self>, post: NewPost) -> String {
            post.title
        }
    }

    fn delayed(value: &'static str, delay: Duration) -> crate::extract::ExtractorFn {
        extractor(move |_ctx: RequestCtx| async move {
            tokio::time::sleep(delay).await;
            Ok(value.to_string())
        })
    }

    impl Controller for PostController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("/posts")
                .route(
                    Route::get("/{id}")
                        .param(path_param("id"))
                        .handler(Self::show),
                )
                .route(
                    Route::get("/")
                        .param(query::<Pagination>())
                        .handler(Self::list),
                )
                .route(
                    Route::post("/")
                        .param(body_json::<NewPost>())
                        .handler(Self::create),
                )
                .route(
                    Route::get("/ordered")
                        .param(delayed("a", Duration::from_millis(60)))
                        .param(delayed("b", Duration::from_millis(20)))
                        .param(delayed("c", Duration::from_millis(0)))
                        .handler(Self::ordered),
                )
                .route(
                    Route::get("/slow")
                        .param(delayed("x", Duration::from_millis(100)))
                        .param(delayed("y", Duration::from_millis(100)))
                        .handler(Self::slow),
                )
                .route(
                    Route::post("/tiny")
                        .body_limit(32)
                        .param(body_json::<NewPost>())
                        .handler(Self::echo),
                )
        }
    }

    fn post_app() -> Router {
        App::builder()
            .controller::<PostController>()
            .build()
            .unwrap()
            .into_router()
    }

    #[tokio::test]
    async fn root_route_matches_with_and_without_trailing_slash() {
        let (status, body) = send(post_app(), Method::GET, "/posts?page=3", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"page 3");

        let (status, _body) = send(
            post_app(),
            Method::POST,
            "/posts",
            Body::from(r#"{"title":"hello"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn path_captures_reach_the_handler() {
        let (status, body) = send(post_app(), Method::GET, "/posts/42", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"post 42");
    }

    #[tokio::test]
    async fn query_extraction_reaches_the_handler() {
        let (status, body) = send(post_app(), Method::GET, "/posts/?page=3", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"page 3");
    }

    #[tokio::test]
    async fn body_extraction_round_trips() {
        let (status, body) = send(
            post_app(),
            Method::POST,
            "/posts/",
            Body::from(r#"{"title":"hello"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let value: NewPost = serde_json::from_slice(&body).unwrap();
        assert_eq!(value.title, "hello");
    }

    #[tokio::test]
    async fn extraction_failure_is_a_400_not_a_crash() {
        let (status, body) = send(
            post_app(),
            Method::GET,
            "/posts/?page=abc",
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8_lossy(&body).contains("extraction failed"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_413() {
        let big = format!(r#"{{"title":"{}"}}"#, "x".repeat(128));
        let (status, body) = send(post_app(), Method::POST, "/posts/tiny", Body::from(big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(String::from_utf8_lossy(&body).contains("exceeds"));
    }

    #[tokio::test]
    async fn body_within_the_limit_passes() {
        let (status, body) = send(
            post_app(),
            Method::POST,
            "/posts/tiny",
            Body::from(r#"{"title":"ok"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn invalid_utf8_in_a_path_capture_is_a_400() {
        let (status, body) = send(post_app(), Method::GET, "/posts/%C3%28", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8_lossy(&body).contains("extraction failed"));
    }

    #[tokio::test]
    async fn arguments_arrive_in_index_order_despite_completion_order() {
        let (status, body) = send(post_app(), Method::GET, "/posts/ordered", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"abc");
    }

    #[tokio::test]
    async fn extractors_run_concurrently_not_sequentially() {
        let start = Instant::now();
        let (status, _body) = send(post_app(), Method::GET, "/posts/slow", Body::empty()).await;
        let elapsed = start.elapsed();
        assert_eq!(status, StatusCode::OK);
        // Two 100ms extractors: concurrent ≈ 100ms, sequential ≈ 200ms.
        assert!(elapsed >= Duration::from_millis(100), "elapsed: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(180), "elapsed: {elapsed:?}");
    }

    // -- middleware ordering and hooks -------------------------------------

    static TRACE: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    struct Tag(&'static str);

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(&self, request: Request, next: Next) -> Response {
            TRACE.lock().unwrap().push(self.0);
            next.run(request).await
        }
    }

    struct TracedController;

    impl Injectable for TracedController {
        fn inject(_resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self)
        }
    }

    impl TracedController {
        async fn index(self: Arc<Self>) -> &'static str {
            TRACE.lock().unwrap().push("handler");
            "ok"
        }
    }

    impl Controller for TracedController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("/traced")
                .middleware(Tag("controller-first"))
                .middleware(Tag("controller-second"))
                .route(
                    Route::get("/")
                        .middleware(Tag("route"))
                        .handler(Self::index),
                )
        }
    }

    #[tokio::test]
    async fn middleware_runs_in_declaration_order_controller_first() {
        TRACE.lock().unwrap().clear();
        let router = App::builder()
            .controller::<TracedController>()
            .build()
            .unwrap()
            .into_router();
        let (status, _body) = send(router, Method::GET, "/traced/", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            *TRACE.lock().unwrap(),
            vec!["controller-first", "controller-second", "route", "handler"]
        );
    }

    #[tokio::test]
    async fn before_and_after_hooks_see_the_router() {
        let router = App::builder()
            .container(ContainerBuilder::new().provide::<GreetingService>().build())
            .before(|router| router.route("/health", axum::routing::get(|| async { "up" })))
            .controller::<HomeController>()
            .after(|router| router.route("/late", axum::routing::get(|| async { "late" })))
            .build()
            .unwrap()
            .into_router();

        let (status, body) = send(router.clone(), Method::GET, "/health", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"up");

        let (status, body) = send(router, Method::GET, "/late", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"late");
    }

    // -- verbs --------------------------------------------------------------

    struct VerbController;

    impl Injectable for VerbController {
        fn inject(_resolver: &mut Resolver<'_>) -> crate::error::Result<Self> {
            Ok(Self)
        }
    }

    impl VerbController {
        async fn any(self: Arc<Self>) -> &'static str {
            "caught"
        }

        async fn remove(self: Arc<Self>) -> crate::result::NoContent {
            crate::result::NoContent
        }
    }

    impl Controller for VerbController {
        fn meta() -> ControllerMeta<Self> {
            ControllerMeta::new("/verbs")
                .route(Route::all("/any").handler(Self::any))
                .route(Route::delete("/gone").handler(Self::remove))
        }
    }

    fn verb_app() -> Router {
        App::builder()
            .controller::<VerbController>()
            .build()
            .unwrap()
            .into_router()
    }

    #[tokio::test]
    async fn catch_all_route_matches_multiple_verbs() {
        let (status, _body) = send(verb_app(), Method::GET, "/verbs/any", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _body) = send(verb_app(), Method::POST, "/verbs/any", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_route_returns_no_content() {
        let (status, body) = send(verb_app(), Method::DELETE, "/verbs/gone", Body::empty()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }
}
