//! Procedure traits and call context
//!
//! A [`Procedure`] is the server-side implementation of one RPC method. It
//! receives the request's `params` and `id` as owned [`Value`]s plus a
//! [`CallContext`], and returns a future resolving to an optional result
//! value (`None` becomes a `null` result on the wire).
//!
//! # Signaling errors
//!
//! Instead of (or in addition to) returning a result, a procedure can call
//! [`CallContext::set_error`]. A set error code takes precedence over the
//! returned value: the dispatcher turns it into an error response with the
//! procedure's code and message, and the returned value is discarded.
//!
//! # Creating procedures
//!
//! Implement [`Procedure`] directly for stateful handlers, or wrap an async
//! closure with [`from_fn`]:
//!
//! ```rust
//! use jrot_server::from_fn;
//! use jrot_core::Value;
//!
//! let echo = from_fn(|_ctx, params, _id| async move { params });
//!
//! let strict = from_fn(|ctx, params, _id| async move {
//!     if params.is_none() {
//!         ctx.set_error(-32602, "params required");
//!         return None;
//!     }
//!     Some(Value::from(true))
//! });
//! # let _ = (echo, strict);
//! ```

use jrot_core::{ErrorData, Value};
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

/// Future returned by a procedure invocation.
///
/// Boxed and pinned so procedures with different concrete future types can
/// live in one table.
pub type ProcedureFuture = Pin<Box<dyn Future<Output = Option<Value>> + Send>>;

/// Server-side implementation of one RPC method.
///
/// Procedures must be `Send + Sync`: the table is shared across connection
/// tasks and a procedure may be invoked from any of them. Requests arriving
/// on one connection are still dispatched strictly in order.
pub trait Procedure: Send + Sync {
    /// Invoke the procedure.
    ///
    /// `params` is the request's `params` member (already validated to be an
    /// array or object if present) and `id` a copy of its `id` member, both
    /// detached from the request document and owned by the callee.
    fn call(&self, ctx: CallContext, params: Option<Value>, id: Option<Value>) -> ProcedureFuture;
}

/// Per-invocation context handed to a procedure.
///
/// Carries the connection id, the opaque data pointer supplied at
/// registration time, and the error slot. Cloning is cheap; all clones share
/// the same error slot, which is how the dispatcher observes an error set
/// inside the procedure's future.
#[derive(Clone)]
pub struct CallContext {
    conn_id: u64,
    data: Option<Arc<dyn Any + Send + Sync>>,
    error: Arc<Mutex<Option<ErrorData>>>,
}

impl CallContext {
    pub(crate) fn new(conn_id: u64, data: Option<Arc<dyn Any + Send + Sync>>) -> CallContext {
        CallContext {
            conn_id,
            data,
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Id of the connection this request arrived on.
    pub fn conn_id(&self) -> u64 {
        self.conn_id
    }

    /// The opaque data registered alongside the procedure, downcast to its
    /// concrete type. `None` when no data was registered or the type does
    /// not match.
    pub fn data<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.data.clone()?.downcast::<T>().ok()
    }

    /// Signal an error for this invocation.
    ///
    /// The dispatcher sends an error response with this code and message
    /// instead of a result. The last call wins if called more than once.
    pub fn set_error(&self, code: i32, message: impl Into<String>) {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(ErrorData::new(code, message));
    }

    pub(crate) fn take_error(&self) -> Option<ErrorData> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

struct FnProcedure<F> {
    func: F,
}

impl<F, Fut> Procedure for FnProcedure<F>
where
    F: Fn(CallContext, Option<Value>, Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Value>> + Send + 'static,
{
    fn call(&self, ctx: CallContext, params: Option<Value>, id: Option<Value>) -> ProcedureFuture {
        Box::pin((self.func)(ctx, params, id))
    }
}

/// Wrap an async function or closure as a [`Procedure`].
///
/// The closure receives `(ctx, params, id)` and returns a future resolving
/// to the optional result value.
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Procedure>
where
    F: Fn(CallContext, Option<Value>, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Value>> + Send + 'static,
{
    Box::new(FnProcedure { func })
}
