//! Parameter extraction.
//!
//! Each route declares an ordered list of extractors; the dispatcher runs the
//! whole list concurrently against the request context and hands the values
//! to the handler in declaration order. Extractors are independent,
//! side-effect-free reads of [`RequestCtx`], which is why running them as a
//! batch is sound.

use crate::error::{Result, TachiError};
use crate::handler::ParamValue;
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Owned view of one request, shared by every extractor of a route.
///
/// The body is buffered up front so extractors can read it independently.
/// Cloning is cheap (`Bytes` and the param map are reference-counted),
/// which lets extractor futures be `'static` and run concurrently.
#[derive(Clone)]
pub struct RequestCtx {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Arc<HashMap<String, String>>,
}

impl RequestCtx {
    pub(crate) fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: HashMap<String, String>,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params: Arc::new(path_params),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The fully buffered request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// A single capture from the matched route path, e.g. `id` in `/{id}`.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub type ExtractFuture = Pin<Box<dyn Future<Output = Result<ParamValue>> + Send>>;

/// Type-erased extractor: reads the request context, produces one handler
/// argument. Possibly asynchronous.
pub type ExtractorFn = Arc<dyn Fn(&RequestCtx) -> ExtractFuture + Send + Sync>;

/// Lift an async closure over [`RequestCtx`] into an [`ExtractorFn`].
///
/// This is the extension point for application-defined extraction:
///
/// ```rust,ignore
/// Route::get("/").param(extractor(|ctx: RequestCtx| async move {
///     ctx.header("x-request-id")
///         .map(str::to_owned)
///         .ok_or_else(|| TachiError::extraction("missing x-request-id"))
/// }))
/// ```
pub fn extractor<F, Fut, T>(f: F) -> ExtractorFn
where
    F: Fn(RequestCtx) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    Arc::new(move |ctx| {
        let fut = f(ctx.clone());
        Box::pin(async move { fut.await.map(|value| Box::new(value) as ParamValue) })
    })
}

/// Deserialize the buffered body as JSON into `T`.
pub fn body_json<T>() -> ExtractorFn
where
    T: DeserializeOwned + Send + 'static,
{
    extractor(|ctx: RequestCtx| async move {
        serde_json::from_slice::<T>(ctx.body())
            .map_err(|err| TachiError::extraction(format!("invalid JSON body: {err}")))
    })
}

/// Deserialize the query string into `T`.
pub fn query<T>() -> ExtractorFn
where
    T: DeserializeOwned + Send + 'static,
{
    extractor(|ctx: RequestCtx| async move {
        Query::<T>::try_from_uri(ctx.uri())
            .map(|Query(value)| value)
            .map_err(|err| TachiError::extraction(format!("invalid query string: {err}")))
    })
}

/// A single path capture as a `String`; missing captures fail extraction.
pub fn path_param(name: impl Into<String>) -> ExtractorFn {
    let name = name.into();
    extractor(move |ctx: RequestCtx| {
        let name = name.clone();
        async move {
            ctx.path_param(&name)
                .map(str::to_owned)
                .ok_or_else(|| TachiError::extraction(format!("missing path parameter '{name}'")))
        }
    })
}

/// All path captures as a map.
pub fn path_params() -> ExtractorFn {
    extractor(|ctx: RequestCtx| async move { Ok(ctx.path_params().clone()) })
}

/// A header value as `Option<String>`; absence is not an error.
pub fn header(name: impl Into<String>) -> ExtractorFn {
    let name = name.into();
    extractor(move |ctx: RequestCtx| {
        let name = name.clone();
        async move { Ok(ctx.header(&name).map(str::to_owned)) }
    })
}

/// The whole [`RequestCtx`], for handlers that want raw access.
pub fn request_ctx() -> ExtractorFn {
    extractor(|ctx: RequestCtx| async move { Ok(ctx) })
}
