//! # Tachi
//!
//! Declarative controller routing with constructor dependency injection,
//! built on axum.
//!
//! Controllers declare an explicit route table once; the application builder
//! constructs each controller through a token-based provider container and
//! binds every route onto an axum router. Transport, routing trees and
//! middleware execution stay entirely axum's business.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::Json;
//! use serde::Serialize;
//! use tachi::prelude::*;
//!
//! // 1. Define a service and how it is constructed
//! struct GreetingService;
//!
//! impl GreetingService {
//!     fn greeting(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! impl Injectable for GreetingService {
//!     fn inject(_resolver: &mut Resolver<'_>) -> tachi::Result<Self> {
//!         Ok(Self)
//!     }
//! }
//!
//! // 2. Define a controller with injected dependencies
//! struct HomeController {
//!     greetings: Arc<GreetingService>,
//! }
//!
//! impl Injectable for HomeController {
//!     fn inject(resolver: &mut Resolver<'_>) -> tachi::Result<Self> {
//!         Ok(Self {
//!             greetings: resolver.resolve()?,
//!         })
//!     }
//! }
//!
//! #[derive(Serialize)]
//! struct Greeting {
//!     message: String,
//! }
//!
//! impl HomeController {
//!     async fn index(self: Arc<Self>) -> Json<Greeting> {
//!         Json(Greeting {
//!             message: self.greetings.greeting(),
//!         })
//!     }
//!
//!     async fn away(self: Arc<Self>) -> Redirect {
//!         Redirect::to("/")
//!     }
//! }
//!
//! // 3. Declare the route table
//! impl Controller for HomeController {
//!     fn meta() -> ControllerMeta<Self> {
//!         ControllerMeta::new("/")
//!             .middleware(RequestLogger)
//!             .route(Route::get("/").handler(Self::index))
//!             .route(Route::get("/away").handler(Self::away))
//!     }
//! }
//!
//! // 4. Assemble and serve
//! #[tokio::main]
//! async fn main() -> tachi::Result<()> {
//!     let container = ContainerBuilder::new().provide::<GreetingService>().build();
//!
//!     let app = App::builder()
//!         .container(container)
//!         .controller::<HomeController>()
//!         .build()?;
//!
//!     app.listen("127.0.0.1:8000").await
//! }
//! ```

pub mod app;
mod bind;
pub mod controller;
pub mod di;
mod dispatch;
pub mod error;
pub mod extract;
pub mod handler;
pub mod meta;
pub mod middleware;
pub mod result;

// Re-export core types
pub use app::{App, AppBuilder};
pub use controller::Controller;
pub use di::{Container, ContainerBuilder, Injectable, Resolver};
pub use error::{Result, TachiError};
pub use extract::{ExtractorFn, RequestCtx};
pub use meta::{ControllerMeta, Route, Verb};
pub use middleware::{Middleware, RequestLogger};
pub use result::{ActionResult, NoContent, Redirect};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use tachi::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::{App, AppBuilder};
    pub use crate::controller::Controller;
    pub use crate::di::{Container, ContainerBuilder, Injectable, Resolver};
    pub use crate::error::{Result, TachiError};
    pub use crate::extract::{
        body_json, extractor, header, path_param, path_params, query, request_ctx, ExtractorFn,
        RequestCtx,
    };
    pub use crate::handler::{Handler, IntoOutcome, Outcome};
    pub use crate::meta::{ControllerMeta, Route, Verb};
    pub use crate::middleware::{Middleware, RequestLogger};
    pub use crate::result::{ActionResult, NoContent, Redirect};
    pub use async_trait::async_trait;
    pub use axum::{
        extract::Request,
        http::StatusCode,
        middleware::Next,
        response::{IntoResponse, Response},
        Json, Router,
    };
    pub use std::sync::Arc;
}
