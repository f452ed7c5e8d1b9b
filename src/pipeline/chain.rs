//! Interceptor chain composition.
//!
//! The first interceptor added is the outermost: it sees the call first and
//! the result last.

use std::future::Future;
use std::sync::Arc;

use crate::pipeline::{Call, Reply, Status};

pub use futures_util::future::BoxFuture;

pub type CallResult = Result<Reply, Status>;

/// Terminal business logic for a call.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, call: Call) -> BoxFuture<'_, CallResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Call) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallResult> + Send + 'static,
{
    fn call(&self, call: Call) -> BoxFuture<'_, CallResult> {
        Box::pin((self)(call))
    }
}

/// A step in the chain. It may reject the call, rewrite it before passing
/// it on through `next`, or observe the result on the way back.
pub trait Interceptor: Send + Sync + 'static {
    fn intercept<'a>(&'a self, call: Call, next: Next<'a>) -> BoxFuture<'a, CallResult>;
}

/// The remainder of the chain after the current interceptor.
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Invoke the remaining interceptors and finally the handler.
    pub async fn run(self, call: Call) -> CallResult {
        match self.interceptors.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    interceptors: rest,
                    handler: self.handler,
                };
                head.intercept(call, next).await
            }
            None => self.handler.call(call).await,
        }
    }
}

/// Ordered list of interceptors.
#[derive(Clone, Default)]
pub struct Chain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; it runs inside every one added before it.
    pub fn with<I: Interceptor>(mut self, interceptor: Arc<I>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run `call` through every interceptor and then `handler`.
    pub async fn run(&self, call: Call, handler: &dyn Handler) -> CallResult {
        Next {
            interceptors: &self.interceptors,
            handler,
        }
        .run(call)
        .await
    }

    /// Bind the chain to its terminal handler.
    pub fn wrap<H: Handler>(self, handler: H) -> Pipeline {
        Pipeline {
            chain: self,
            handler: Arc::new(handler),
        }
    }
}

/// A chain bound to its terminal handler; itself a handler.
#[derive(Clone)]
pub struct Pipeline {
    chain: Chain,
    handler: Arc<dyn Handler>,
}

impl Handler for Pipeline {
    fn call(&self, call: Call) -> BoxFuture<'_, CallResult> {
        Box::pin(self.chain.run(call, self.handler.as_ref()))
    }
}
