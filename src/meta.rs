//! Route metadata.
//!
//! The original decorator store becomes an explicit route table: each
//! controller assembles its [`ControllerMeta`] once in
//! [`Controller::meta`](crate::controller::Controller::meta), and the binder
//! reads it once at startup. Accessors return empty slices for controllers
//! that declare no middleware, routes or parameters.

use crate::extract::ExtractorFn;
use crate::handler::{erase, BoxedHandler, Handler};
use crate::middleware::Middleware;
use std::sync::Arc;

/// Default cap on the buffered request body, matching axum's own default.
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The closed set of bindable HTTP verbs. `All` matches any method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    All,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
            Verb::Head => "HEAD",
            Verb::All => "ANY",
        }
    }
}

/// One declared route on a controller of type `C`.
///
/// Parameters are appended in order, so positional indices are unique and
/// contiguous from zero by construction. A route without a handler is
/// rejected at bind time.
pub struct Route<C> {
    pub(crate) verb: Verb,
    pub(crate) path: String,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    pub(crate) params: Vec<ExtractorFn>,
    pub(crate) handler: Option<BoxedHandler<C>>,
    pub(crate) body_limit: usize,
}

impl<C> Route<C> {
    fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            middlewares: Vec::new(),
            params: Vec::new(),
            handler: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Verb::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Verb::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Verb::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Verb::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Verb::Delete, path)
    }

    pub fn options(path: impl Into<String>) -> Self {
        Self::new(Verb::Options, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Verb::Head, path)
    }

    /// Catch-all: binds the handler for every method.
    pub fn all(path: impl Into<String>) -> Self {
        Self::new(Verb::All, path)
    }

    /// Append a parameter extractor. The handler receives extracted values
    /// as positional arguments in declaration order.
    pub fn param(mut self, extractor: ExtractorFn) -> Self {
        self.params.push(extractor);
        self
    }

    /// Append route-level middleware, run after controller-level middleware.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Cap in bytes on the buffered request body, 2 MiB by default.
    /// Requests whose body exceeds the cap are rejected with 413.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Bind the controller method invoked for matching requests.
    pub fn handler<H, M>(mut self, handler: H) -> Self
    where
        H: Handler<C, M>,
        M: 'static,
    {
        self.handler = Some(erase(handler));
        self
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[ExtractorFn] {
        &self.params
    }
}

/// The route table of one controller: base path, controller-level middleware
/// and the accumulated routes, all in declaration order.
pub struct ControllerMeta<C> {
    pub(crate) base_path: String,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    pub(crate) routes: Vec<Route<C>>,
}

impl<C> ControllerMeta<C> {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            middlewares: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Append controller-level middleware, run before any route middleware.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Accumulate one route; repeated calls preserve declaration order.
    pub fn route(mut self, route: Route<C>) -> Self {
        self.routes.push(route);
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn routes(&self) -> &[Route<C>] {
        &self.routes
    }
}
