//! Controller binding.
//!
//! Reads a controller's route table, builds a sub-router with the dispatcher
//! as the handler for every route, attaches middleware, and merges the
//! sub-router into the application router. Paths are composed up front
//! (base path + route path) rather than nested, so a controller root route
//! answers both `/posts` and `/posts/`.

use crate::controller::Controller;
use crate::dispatch::dispatch;
use crate::error::{Result, TachiError};
use crate::extract::ExtractorFn;
use crate::handler::BoxedHandler;
use crate::meta::{Route, Verb};
use crate::middleware::Middleware;
use axum::extract::Request;
use axum::middleware::{from_fn, Next};
use axum::routing::{any, delete, get, head, options, patch, post, put, MethodRouter};
use axum::Router;
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) fn mount<C: Controller>(app: Router, controller: Arc<C>) -> Result<Router> {
    let meta = C::meta();
    validate_path(C::name(), &meta.base_path)?;

    let mut sub = Router::new();
    let mut bound: HashSet<(Verb, String)> = HashSet::new();
    for route in meta.routes {
        validate_path(C::name(), &route.path)?;
        let Route {
            verb,
            path,
            middlewares,
            params,
            handler,
            body_limit,
        } = route;
        if !bound.insert((verb, path.clone())) {
            return Err(TachiError::DuplicateRoute {
                controller: C::name(),
                verb: verb.as_str(),
                path,
            });
        }
        let handler = handler.ok_or_else(|| TachiError::MissingHandler {
            controller: C::name(),
            path: path.clone(),
        })?;

        let mut method_router = bind_route(
            verb,
            controller.clone(),
            handler,
            Arc::new(params),
            body_limit,
        );
        // Layers wrap outside-in, so apply in reverse to make declaration
        // order the execution order.
        for middleware in middlewares.into_iter().rev() {
            method_router = method_router.layer(from_fn(middleware_fn(middleware)));
        }

        tracing::debug!(
            controller = C::name(),
            verb = verb.as_str(),
            path = %path,
            "route bound"
        );
        let (full, alias) = compose_path(&meta.base_path, &path);
        if let Some(alias) = alias {
            sub = sub.route(&alias, method_router.clone());
        }
        sub = sub.route(&full, method_router);
    }

    for middleware in meta.middlewares.into_iter().rev() {
        sub = sub.layer(from_fn(middleware_fn(middleware)));
    }

    tracing::info!(controller = C::name(), base_path = %meta.base_path, "controller mounted");

    Ok(app.merge(sub))
}

fn validate_path(controller: &'static str, path: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(TachiError::InvalidPath {
            controller,
            path: path.to_string(),
        })
    }
}

/// Join base and route path into the full registered path. A controller root
/// route additionally gets the trailing-slash form as an alias.
fn compose_path(base: &str, route: &str) -> (String, Option<String>) {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        (route.to_string(), None)
    } else if route == "/" {
        (base.to_string(), Some(format!("{base}/")))
    } else {
        (format!("{base}{route}"), None)
    }
}

fn bind_route<C>(
    verb: Verb,
    controller: Arc<C>,
    handler: BoxedHandler<C>,
    params: Arc<Vec<ExtractorFn>>,
    body_limit: usize,
) -> MethodRouter
where
    C: Send + Sync + 'static,
{
    let endpoint = move |request: Request| {
        let controller = controller.clone();
        let handler = handler.clone();
        let params = params.clone();
        async move { dispatch(controller, handler, params, body_limit, request).await }
    };

    match verb {
        Verb::Get => get(endpoint),
        Verb::Post => post(endpoint),
        Verb::Put => put(endpoint),
        Verb::Patch => patch(endpoint),
        Verb::Delete => delete(endpoint),
        Verb::Options => options(endpoint),
        Verb::Head => head(endpoint),
        Verb::All => any(endpoint),
    }
}

fn middleware_fn(
    middleware: Arc<dyn Middleware>,
) -> impl Fn(Request, Next) -> futures::future::BoxFuture<'static, axum::response::Response> + Clone {
    move |request: Request, next: Next| {
        let middleware = middleware.clone();
        Box::pin(async move { middleware.handle(request, next).await })
    }
}
