//! Per-request dispatch.
//!
//! One dispatcher exists per (controller instance, route), created at bind
//! time. It buffers the body, runs the route's extractor batch concurrently,
//! invokes the handler with the arguments in index order, and renders the
//! outcome. Every failure is caught here and rendered through
//! `TachiError: IntoResponse`; nothing escapes into the runtime.

use crate::error::{Result, TachiError};
use crate::extract::{ExtractorFn, RequestCtx};
use crate::handler::{BoxedHandler, Outcome, ParamValue};
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, RawPathParams, Request};
use axum::response::{IntoResponse, Response};
use futures::future::try_join_all;
use http_body_util::{BodyExt, Limited};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) async fn dispatch<C>(
    controller: Arc<C>,
    handler: BoxedHandler<C>,
    params: Arc<Vec<ExtractorFn>>,
    body_limit: usize,
    request: Request,
) -> Response
where
    C: Send + Sync + 'static,
{
    match run(controller, handler, params, body_limit, request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "request dispatch failed");
            err.into_response()
        }
    }
}

async fn run<C>(
    controller: Arc<C>,
    handler: BoxedHandler<C>,
    params: Arc<Vec<ExtractorFn>>,
    body_limit: usize,
    request: Request,
) -> Result<Response>
where
    C: Send + Sync + 'static,
{
    let (mut parts, body) = request.into_parts();

    // Captures recorded by the router for the matched path.
    let path_params: HashMap<String, String> =
        match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            // Not routed through a path router, so there are no captures.
            Err(RawPathParamsRejection::MissingPathParams(_)) => HashMap::new(),
            // Invalid UTF-8 in a capture and the like are client errors.
            Err(err) => return Err(TachiError::extraction(err.to_string())),
        };

    let body = match Limited::new(body, body_limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<http_body_util::LengthLimitError>().is_some() => {
            return Err(TachiError::BodyTooLarge { limit: body_limit });
        }
        Err(err) => {
            return Err(TachiError::BodyRead {
                message: err.to_string(),
            });
        }
    };

    let ctx = RequestCtx::new(parts.method, parts.uri, parts.headers, body, path_params);

    // The whole extractor batch runs concurrently; try_join_all returns the
    // values in input order, which is positional index order.
    let extractions = params.iter().enumerate().map(|(index, extract)| {
        let fut = (extract.as_ref())(&ctx);
        async move {
            fut.await.map_err(|err| {
                tracing::debug!(index, error = %err, "extractor failed");
                err
            })
        }
    });
    let args: Vec<ParamValue> = try_join_all(extractions).await?;

    match handler.call(controller, args).await? {
        Outcome::Raw(response) => Ok(response),
        Outcome::Action(result) => Ok(result.apply(&ctx).await),
    }
}
