//! Operation-name dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::{BoxFuture, Call, CallResult, Handler, Status};

/// Terminal handler routing each call to the handler registered for its
/// fully-qualified operation name.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method`, replacing any previous one.
    pub fn register<H: Handler>(mut self, method: impl Into<String>, handler: H) -> Self {
        self.handlers.insert(method.into(), Arc::new(handler));
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Handler for ServiceRegistry {
    fn call(&self, call: Call) -> BoxFuture<'_, CallResult> {
        match self.handlers.get(call.method()) {
            Some(handler) => handler.call(call),
            None => {
                let method = call.method().to_string();
                Box::pin(async move {
                    Err(Status::unimplemented(format!("unknown method {}", method)))
                })
            }
        }
    }
}
