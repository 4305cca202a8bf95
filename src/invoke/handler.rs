//! Function handler trait and the callback it answers through.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::invoke::context::InvocationContext;
use crate::invoke::event::InvocationEvent;

/// What a function reported through its callback: `Ok(response)` or `Err(error)`.
pub type Outcome = Result<Value, Value>;

/// A function that can be served over HTTP.
///
/// The function answers exactly once through `callback`. It may do so before
/// returning or hand the callback to a spawned task and answer later.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, event: InvocationEvent, context: InvocationContext, callback: Callback);
}

/// One-shot response channel handed to a function.
///
/// Every method consumes the callback, so a function cannot answer twice.
#[derive(Debug)]
pub struct Callback {
    tx: oneshot::Sender<Outcome>,
}

impl Callback {
    /// Create a callback and the receiver the adapter waits on.
    pub fn channel() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// `callback(err, response)`: a non-null `err` wins over `response`.
    pub fn call(self, err: Option<Value>, response: Option<Value>) {
        match err {
            Some(err) if is_truthy(&err) => self.fail(err),
            _ => self.succeed(response.unwrap_or(Value::Null)),
        }
    }

    pub fn succeed(self, response: Value) {
        self.send(Ok(response));
    }

    pub fn fail(self, err: Value) {
        self.send(Err(err));
    }

    pub fn send(self, outcome: Outcome) {
        // The receiver is gone only when the request was abandoned.
        let _ = self.tx.send(outcome);
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Adapts an async closure returning an [`Outcome`] into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F, Fut>
where
    F: Fn(InvocationEvent, InvocationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send,
{
    HandlerFn {
        f,
        _fut: PhantomData,
    }
}

/// See [`handler_fn`].
pub struct HandlerFn<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F, Fut>
where
    F: Fn(InvocationEvent, InvocationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send,
{
    async fn invoke(&self, event: InvocationEvent, context: InvocationContext, callback: Callback) {
        let outcome = (self.f)(event, context).await;
        callback.send(outcome);
    }
}
