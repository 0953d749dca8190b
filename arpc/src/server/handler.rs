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

//! Method handlers and the errors they raise.

use crate::protocol::{ErrorObject, ErrorOrigin, Params, codes};
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Future returned by a [`Handler`].
pub type HandlerFuture = BoxFuture<'static, Result<Value, HandlerError>>;

/// A server-side method implementation.
///
/// Handlers take the call's parameters and produce a structured result or a
/// [`HandlerError`]. Most handlers are registered from closures through
/// [`MethodRegistry::register_fn`](crate::server::MethodRegistry::register_fn)
/// or [`MethodRegistry::register_typed`](crate::server::MethodRegistry::register_typed);
/// implement the trait directly for handlers that carry state.
///
/// # Example
///
/// ```rust
/// use arpc::protocol::Params;
/// use arpc::server::{Handler, HandlerError, HandlerFuture};
/// use serde_json::json;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// struct Counter(AtomicU64);
///
/// impl Handler for Counter {
///     fn call(&self, _params: Params) -> HandlerFuture {
///         let n = self.0.fetch_add(1, Ordering::Relaxed);
///         Box::pin(async move { Ok(json!(n)) })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(&self, params: Params) -> HandlerFuture;
}

/// Handler over a closure taking raw [`Params`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    fn call(&self, params: Params) -> HandlerFuture {
        Box::pin((self.f)(params))
    }
}

/// Handler over a closure taking a deserializable argument.
///
/// Positional arguments are deserialized from the argument array, so a
/// tuple `(a, b)` matches a call with two positional arguments. Keyword
/// arguments are deserialized from the keyword map, which suits structs.
pub struct TypedHandler<F, A, R> {
    f: F,
    _marker: PhantomData<fn(A) -> R>,
}

impl<F, A, R> TypedHandler<F, A, R> {
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, Fut, A, R> Handler for TypedHandler<F, A, R>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    A: DeserializeOwned + Send + 'static,
    R: Serialize + 'static,
{
    fn call(&self, params: Params) -> HandlerFuture {
        let args = match decode_params::<A>(params) {
            Ok(args) => args,
            Err(e) => return Box::pin(async move { Err(e) }),
        };
        let fut = (self.f)(args);
        Box::pin(async move {
            let result = fut.await?;
            serde_json::to_value(result)
                .map_err(|e| HandlerError::internal(format!("result not serializable: {}", e)))
        })
    }
}

/// Deserializes call parameters into `A`.
///
/// A call without parameters is offered to `A` first as an empty array and
/// then as `null`, so both `Vec<T>` and `()` accept it.
///
/// # Errors
///
/// Returns an "Invalid params" error if the parameters do not fit `A`, or if
/// the call carries positional and keyword arguments at once.
pub fn decode_params<A: DeserializeOwned>(params: Params) -> Result<A, HandlerError> {
    let invalid = |e: serde_json::Error| HandlerError::invalid_params(e.to_string());
    match (params.args.is_empty(), params.kwargs.is_empty()) {
        (false, false) => Err(HandlerError::invalid_params(
            "positional and keyword arguments cannot be combined",
        )),
        (false, true) => serde_json::from_value(Value::Array(params.args)).map_err(invalid),
        (true, false) => serde_json::from_value(Value::Object(params.kwargs)).map_err(invalid),
        (true, true) => serde_json::from_value(Value::Array(Vec::new()))
            .or_else(|_| serde_json::from_value(Value::Null))
            .map_err(invalid),
    }
}

/// Error raised by a handler.
///
/// Any `std::error::Error` converts into a `HandlerError` through `?`; the
/// conversion records the error's type name and its source chain as the
/// [`ErrorOrigin`] and answers with the internal-error code. Build one
/// explicitly to choose the code, message and data sent to the caller.
///
/// `HandlerError` itself does not implement `std::error::Error`; the blanket
/// conversion depends on that.
///
/// # Example
///
/// ```rust
/// use arpc::server::HandlerError;
/// use serde_json::json;
///
/// fn parse(input: &str) -> Result<i64, HandlerError> {
///     let n: i64 = input.parse()?;
///     if n < 0 {
///         return Err(HandlerError::new(-32010, "negative input").with_data(json!(n)));
///     }
///     Ok(n)
/// }
///
/// assert!(parse("12").is_ok());
/// assert_eq!(parse("x").unwrap_err().error_object().code, -32603);
/// assert_eq!(parse("-1").unwrap_err().error_object().code, -32010);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerError {
    error: ErrorObject,
}

impl HandlerError {
    /// Creates an error with an explicit code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            error: ErrorObject::new(code, message),
        }
    }

    /// Attaches structured data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.error.data = Some(data);
        self
    }

    /// "Invalid params" with a reason.
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self {
            error: ErrorObject::invalid_params(reason),
        }
    }

    /// "Internal error" with a reason as data.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self {
            error: ErrorObject::internal_error().with_data(Value::String(reason.into())),
        }
    }

    /// The error object sent to the caller.
    pub fn error_object(&self) -> &ErrorObject {
        &self.error
    }

    /// Converts into the error object sent to the caller.
    pub fn into_error_object(self) -> ErrorObject {
        self.error
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let mut trace = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push(cause.to_string());
            source = cause.source();
        }
        Self {
            error: ErrorObject::new(codes::INTERNAL_ERROR, error.to_string()).with_origin(
                ErrorOrigin {
                    type_name: std::any::type_name::<E>().to_string(),
                    trace,
                },
            ),
        }
    }
}

impl From<ErrorObject> for HandlerError {
    fn from(error: ErrorObject) -> Self {
        Self { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn test_decode_positional_tuple() {
        let params = Params::positional(vec![json!(2), json!(3)]);
        assert_eq!(decode_params::<(i64, i64)>(params).unwrap(), (2, 3));
    }

    #[test]
    fn test_decode_keyword_struct() {
        let params = Params::none().with_kwarg("x", json!(1)).with_kwarg("y", json!(2));
        assert_eq!(decode_params::<Point>(params).unwrap(), Point { x: 1, y: 2 });
    }

    #[test]
    fn test_decode_empty_params() {
        decode_params::<()>(Params::none()).unwrap();
        assert!(decode_params::<Vec<i64>>(Params::none()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_wrong_shape_is_invalid_params() {
        let params = Params::positional(vec![json!("a")]);
        let error = decode_params::<(i64, i64)>(params).unwrap_err();
        assert_eq!(error.error_object().code, codes::INVALID_PARAMS);
    }

    #[test]
    fn test_decode_mixed_params_rejected() {
        let params = Params::positional(vec![json!(1)]).with_kwarg("y", json!(2));
        assert!(decode_params::<Point>(params).is_err());
    }

    #[test]
    fn test_std_error_conversion_records_origin() {
        let error: HandlerError = "x".parse::<i32>().unwrap_err().into();
        let object = error.into_error_object();
        assert_eq!(object.code, codes::INTERNAL_ERROR);
        let origin = object.origin.unwrap();
        assert!(origin.type_name.ends_with("ParseIntError"));
        assert_eq!(origin.trace.len(), 1);
    }

    #[tokio::test]
    async fn test_typed_handler_serializes_result() {
        let handler =
            TypedHandler::new(|(a, b): (i64, i64)| async move { Ok::<_, HandlerError>(a * b) });
        let result = handler
            .call(Params::positional(vec![json!(6), json!(7)]))
            .await
            .unwrap();
        assert_eq!(result, json!(42));
    }
}
