//! Handler trait and type erasure.
//!
//! The router stores handlers of different concrete types in one table, so
//! each one is hidden behind a trait object. The chain from user code to
//! vtable call:
//!
//! ```text
//! async fn hello(req: Request) -> Result<Response, Error>   ← you write this
//!        ↓ router.on(Method::GET, "/", hello)
//! hello.into_boxed_handler()            ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))            ← stored as Arc<dyn ErasedHandler>
//! handler.call(req)  at request time    ← one Arc clone + one virtual call
//! ```
//!
//! Handlers are fallible on purpose: an `Err` is an uncaught failure, and
//! the pipeline owns turning it into a detail-free 500 after logging it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// Type-erased future resolving to the handler's outcome. `Pin<Box<…>>`
/// because the runtime polls it in place; `Send` so tokio may move it
/// across threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

/// Internal dispatch interface. `#[doc(hidden)] pub` only because it appears
/// in the return type of [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A heap-allocated handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself; it is satisfied automatically for any
/// function or closure with the signature
///
/// ```text
/// async fn name(req: Request) -> Result<impl IntoResponse, Error>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}
