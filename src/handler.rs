//! Typed handlers over type-erased arguments.
//!
//! Extractors produce [`ParamValue`]s; the arity impls below recover the
//! concrete types by downcast and call the controller method. The marker
//! parameter on [`Handler`] and [`IntoOutcome`] disambiguates the blanket
//! impls, the same trick axum uses for its own `Handler` trait.

use crate::error::{Result, TachiError};
use crate::result::ActionResult;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

/// A single extracted handler argument, type-erased.
pub type ParamValue = Box<dyn Any + Send>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Outcome>> + Send>>;

/// What a handler returned, tagged for the dispatcher.
///
/// `Raw` is the direct-serialization branch (anything `IntoResponse`);
/// `Action` delegates response writing to the result object. The dispatcher
/// matches exhaustively and never inspects which concrete result it holds.
pub enum Outcome {
    Raw(Response),
    Action(Box<dyn ActionResult>),
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Raw(response) => f.debug_tuple("Raw").field(&response.status()).finish(),
            Outcome::Action(_) => f.write_str("Action(..)"),
        }
    }
}

#[doc(hidden)]
pub struct RawMarker;

#[doc(hidden)]
pub struct ActionMarker;

/// Conversion of a handler return value into an [`Outcome`].
pub trait IntoOutcome<M>: Send + 'static {
    fn into_outcome(self) -> Outcome;
}

impl<T> IntoOutcome<RawMarker> for T
where
    T: IntoResponse + Send + 'static,
{
    fn into_outcome(self) -> Outcome {
        Outcome::Raw(self.into_response())
    }
}

impl<R> IntoOutcome<ActionMarker> for R
where
    R: ActionResult,
{
    fn into_outcome(self) -> Outcome {
        Outcome::Action(Box::new(self))
    }
}

/// A controller method bound to `C`, callable with extracted arguments.
///
/// Implemented for `Fn(Arc<C>, A0, .., An) -> impl Future` up to eight
/// parameters, which covers `async fn method(self: Arc<Self>, ..)` referenced
/// as `Self::method`.
pub trait Handler<C, M>: Send + Sync + 'static {
    fn call(&self, controller: Arc<C>, args: Vec<ParamValue>) -> HandlerFuture;
}

pub(crate) trait ErasedHandler<C> {
    fn call(&self, controller: Arc<C>, args: Vec<ParamValue>) -> HandlerFuture;
}

pub(crate) type BoxedHandler<C> = Arc<dyn ErasedHandler<C> + Send + Sync>;

struct MarkedHandler<H, M> {
    handler: H,
    _marker: PhantomData<fn(M)>,
}

impl<C, H, M> ErasedHandler<C> for MarkedHandler<H, M>
where
    H: Handler<C, M>,
{
    fn call(&self, controller: Arc<C>, args: Vec<ParamValue>) -> HandlerFuture {
        self.handler.call(controller, args)
    }
}

pub(crate) fn erase<C, H, M>(handler: H) -> BoxedHandler<C>
where
    H: Handler<C, M>,
    M: 'static,
{
    Arc::new(MarkedHandler {
        handler,
        _marker: PhantomData,
    })
}

fn next_param<T: Any>(
    args: &mut std::vec::IntoIter<ParamValue>,
    index: usize,
) -> Result<T> {
    let value = args
        .next()
        .ok_or(TachiError::MissingArgument { index })?;
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| TachiError::ParamMismatch {
            index,
            expected: std::any::type_name::<T>(),
        })
}

macro_rules! impl_handler {
    ($(($index:tt, $param:ident)),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<C, F, Fut, R, M $(, $param)*> Handler<C, (M, $($param,)*)> for F
        where
            C: Send + Sync + 'static,
            F: Fn(Arc<C> $(, $param)*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoOutcome<M> + Send,
            M: 'static,
            $($param: Any + Send + 'static,)*
        {
            fn call(&self, controller: Arc<C>, args: Vec<ParamValue>) -> HandlerFuture {
                let mut args = args.into_iter();
                $(
                    let $param = match next_param::<$param>(&mut args, $index) {
                        Ok(value) => value,
                        Err(err) => return Box::pin(std::future::ready(Err(err))),
                    };
                )*
                let fut = (self)(controller $(, $param)*);
                Box::pin(async move { Ok(fut.await.into_outcome()) })
            }
        }
    };
}

impl_handler!();
impl_handler!((0, A0));
impl_handler!((0, A0), (1, A1));
impl_handler!((0, A0), (1, A1), (2, A2));
impl_handler!((0, A0), (1, A1), (2, A2), (3, A3));
impl_handler!((0, A0), (1, A1), (2, A2), (3, A3), (4, A4));
impl_handler!((0, A0), (1, A1), (2, A2), (3, A3), (4, A4), (5, A5));
impl_handler!((0, A0), (1, A1), (2, A2), (3, A3), (4, A4), (5, A5), (6, A6));
impl_handler!(
    (0, A0),
    (1, A1),
    (2, A2),
    (3, A3),
    (4, A4),
    (5, A5),
    (6, A6),
    (7, A7)
);
