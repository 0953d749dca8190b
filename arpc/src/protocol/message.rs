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

//! Wire-format independent message model.

use serde_json::{Map, Value};
use std::fmt;

/// Standard error codes.
///
/// The reserved range follows JSON-RPC 2.0; the same numbers are used by
/// every protocol variant so that an error keeps its meaning across codecs.
pub mod codes {
    /// Invalid bytes were received.
    pub const PARSE_ERROR: i64 = -32700;
    /// The message is not a valid request.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal handler error.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Lowest code of the implementation-defined server error range.
    pub const SERVER_ERROR_MIN: i64 = -32099;
    /// Highest code of the implementation-defined server error range.
    pub const SERVER_ERROR_MAX: i64 = -32000;
    /// The peer sent a reply that could not be understood.
    pub const INVALID_REPLY: i64 = -32001;

    /// Returns `true` if `code` lies in the server error range.
    pub fn is_server_error(code: i64) -> bool {
        (SERVER_ERROR_MIN..=SERVER_ERROR_MAX).contains(&code)
    }
}

/// Correlation identifier linking a request to its response.
///
/// Ids generated locally are always non-negative numbers. Negative and
/// string ids are accepted from peers and echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    /// Non-negative integer id
    Number(u64),
    /// Negative integer id
    Signed(i64),
    /// String id
    String(String),
}

impl RequestId {
    /// Converts this id to its structured value.
    pub fn to_value(&self) -> Value {
        match self {
            RequestId::Number(n) => Value::from(*n),
            RequestId::Signed(n) => Value::from(*n),
            RequestId::String(s) => Value::String(s.clone()),
        }
    }

    /// Reads an id from a structured value.
    ///
    /// Returns `None` for anything other than an integer or a string.
    /// Non-negative integers always read as [`RequestId::Number`].
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match (n.as_u64(), n.as_i64()) {
                (Some(n), _) => Some(RequestId::Number(n)),
                (None, Some(n)) => Some(RequestId::Signed(n)),
                (None, None) => None,
            },
            Value::String(s) => Some(RequestId::String(s.clone())),
            _ => None,
        }
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        RequestId::Number(id)
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        match u64::try_from(id) {
            Ok(n) => RequestId::Number(n),
            Err(_) => RequestId::Signed(id),
        }
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Signed(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Call parameters: positional arguments plus keyword arguments.
///
/// # Examples
///
/// ```rust
/// use arpc::protocol::Params;
/// use serde_json::json;
///
/// let params = Params::positional(vec![json!(2), json!(3)]);
/// assert_eq!(params.args.len(), 2);
///
/// let params = Params::none().with_kwarg("name", json!("ada"));
/// assert_eq!(params.kwargs["name"], "ada");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    /// Positional arguments
    pub args: Vec<Value>,
    /// Keyword arguments
    pub kwargs: Map<String, Value>,
}

impl Params {
    /// Empty parameters.
    pub fn none() -> Self {
        Self::default()
    }

    /// Positional parameters only.
    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
        }
    }

    /// Keyword parameters only.
    pub fn named(kwargs: Map<String, Value>) -> Self {
        Self {
            args: Vec::new(),
            kwargs,
        }
    }

    /// Appends a positional argument.
    pub fn with_arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Sets a keyword argument.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }

    /// Returns `true` if there are neither positional nor keyword arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Builds parameters from a structured value.
    ///
    /// Arrays become positional arguments, objects become keyword arguments,
    /// `null` becomes no arguments and any other scalar becomes a single
    /// positional argument.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::none(),
            Value::Array(args) => Self::positional(args),
            Value::Object(kwargs) => Self::named(kwargs),
            other => Self::positional(vec![other]),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(args: Vec<Value>) -> Self {
        Self::positional(args)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(kwargs: Map<String, Value>) -> Self {
        Self::named(kwargs)
    }
}

/// Where an application error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOrigin {
    /// Handler-side error type name
    pub type_name: String,
    /// Trace lines, outermost first
    pub trace: Vec<String>,
}

/// Structured error payload carried by an error response.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorObject {
    /// Error code, see [`codes`]
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Optional structured detail
    pub data: Option<Value>,
    /// Optional handler-side origin, carried only by codecs that support it
    pub origin: Option<ErrorOrigin>,
}

impl ErrorObject {
    /// Creates an error object with the given code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            origin: None,
        }
    }

    /// Attaches structured data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attaches the handler-side origin.
    pub fn with_origin(mut self, origin: ErrorOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// "Parse error"
    pub fn parse_error() -> Self {
        Self::new(codes::PARSE_ERROR, "Parse error")
    }

    /// "Invalid Request", with the reason as data.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, "Invalid Request").with_data(Value::String(reason.into()))
    }

    /// "Method not found", with the method name as data.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, "Method not found")
            .with_data(Value::String(method.to_string()))
    }

    /// "Invalid params", with the reason as data.
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, "Invalid params").with_data(Value::String(reason.into()))
    }

    /// "Internal error"
    pub fn internal_error() -> Self {
        Self::new(codes::INTERNAL_ERROR, "Internal error")
    }

    /// "Server error" with a code from the server error range.
    ///
    /// Codes outside the range are clamped to [`codes::SERVER_ERROR_MAX`].
    pub fn server_error(code: i64) -> Self {
        let code = if codes::is_server_error(code) {
            code
        } else {
            codes::SERVER_ERROR_MAX
        };
        Self::new(code, "Server error")
    }

    /// "Invalid reply"
    pub fn invalid_reply() -> Self {
        Self::new(codes::INVALID_REPLY, "Invalid reply")
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        if let Some(data) = &self.data {
            write!(f, ": {}", data)?;
        }
        Ok(())
    }
}

/// A call expecting a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id
    pub id: RequestId,
    /// Method name
    pub method: String,
    /// Call parameters
    pub params: Params,
}

impl Request {
    /// Creates a request.
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Params) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A fire-and-forget call. Never answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method name
    pub method: String,
    /// Call parameters
    pub params: Params,
}

impl Notification {
    /// Creates a notification.
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// The answer to a [`Request`].
///
/// The id is only absent on error responses to requests whose id could not
/// be read.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Correlation id of the answered request
    pub id: Option<RequestId>,
    /// Result value or error payload
    pub outcome: Result<Value, ErrorObject>,
}

impl Response {
    /// Creates a success response.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id: Some(id),
            outcome: Ok(result),
        }
    }

    /// Creates an error response.
    pub fn error(id: Option<RequestId>, error: ErrorObject) -> Self {
        Self {
            id,
            outcome: Err(error),
        }
    }

    /// Returns `true` if this is an error response.
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A call expecting a response
    Request(Request),
    /// A call without a response
    Notification(Notification),
    /// A response to an earlier request
    Response(Response),
}

impl Message {
    /// Short name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Request(_) => "request",
            Message::Notification(_) => "notification",
            Message::Response(_) => "response",
        }
    }

    /// Method name of a request or notification.
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request(r) => Some(&r.method),
            Message::Notification(n) => Some(&n.method),
            Message::Response(_) => None,
        }
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Notification> for Message {
    fn from(notification: Notification) -> Self {
        Message::Notification(notification)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}
