//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The method registry.

use crate::protocol::{ErrorObject, ErrorOrigin, Params};
use crate::server::{FnHandler, Handler, HandlerError, ServerError, TypedHandler};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Maps method names to handlers.
///
/// Registration happens up front; once a registry is shared with a
/// connection it is only ever read.
///
/// # Example
///
/// ```rust
/// use arpc::server::MethodRegistry;
///
/// # fn example() -> Result<(), arpc::server::ServerError> {
/// let mut methods = MethodRegistry::new();
/// methods.register_typed("add", |(a, b): (i64, i64)| async move { Ok(a + b) })?;
/// methods.register_typed("echo", |s: Vec<String>| async move { Ok(s) })?;
///
/// assert!(methods.contains("add"));
/// assert!(methods.register_typed("add", |(): ()| async move { Ok(0) }).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<dyn Handler>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DuplicateMethod`] if `name` is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Handler,
    ) -> Result<&mut Self, ServerError> {
        self.insert(name.into(), Arc::new(handler))
    }

    /// Registers a closure over raw [`Params`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DuplicateMethod`] if `name` is taken.
    pub fn register_fn<F, Fut>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> Result<&mut Self, ServerError>
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.register(name, FnHandler::new(f))
    }

    /// Registers a closure over a deserializable argument.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DuplicateMethod`] if `name` is taken.
    pub fn register_typed<F, Fut, A, R>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> Result<&mut Self, ServerError>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        A: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
    {
        self.register(name, TypedHandler::new(f))
    }

    pub(crate) fn insert(
        &mut self,
        name: String,
        handler: Arc<dyn Handler>,
    ) -> Result<&mut Self, ServerError> {
        if self.methods.contains_key(&name) {
            return Err(ServerError::DuplicateMethod { name });
        }
        self.methods.insert(name, handler);
        Ok(self)
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered method names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Starts an invocation of `method`.
    ///
    /// Returns `None` if the method is not registered. The returned future
    /// never fails in any way other than an [`ErrorObject`]: handler errors
    /// are mapped to their error object and panics to an internal error.
    pub fn invoke(
        &self,
        method: &str,
        params: Params,
    ) -> Option<BoxFuture<'static, Result<Value, ErrorObject>>> {
        let handler = self.methods.get(method)?.clone();
        Some(
            async move {
                match AssertUnwindSafe(async move { handler.call(params).await })
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(error)) => Err(error.into_error_object()),
                    Err(panic) => Err(panic_error(panic)),
                }
            }
            .boxed(),
        )
    }
}

fn panic_error(panic: Box<dyn Any + Send>) -> ErrorObject {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string());
    ErrorObject::internal_error()
        .with_data(Value::String(message.clone()))
        .with_origin(ErrorOrigin {
            type_name: "panic".to_string(),
            trace: vec![message],
        })
}
