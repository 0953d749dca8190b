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

//! The protocol codec trait and envelope helpers shared by the built-in codecs.

use crate::protocol::{
    ErrorObject, ErrorOrigin, Message, Notification, ProtocolError, Request, RequestId, Response,
};
use serde_json::{Map, Value};

/// Converts between the message model and a protocol's envelope.
///
/// A codec works on structured values only; turning those into bytes is the
/// [`Serializer`](crate::serialization::Serializer)'s job. Codecs are
/// stateless, so one instance is shared by every connection that selects it.
///
/// Implementations must round-trip: decoding the output of any `encode_*`
/// method yields a message with the same fields.
///
/// # Examples
///
/// ```rust
/// use arpc::protocol::{JsonRpcCodec, Message, Params, ProtocolCodec, Request};
/// use serde_json::json;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = JsonRpcCodec;
/// let request = Request::new(1u64, "add", Params::positional(vec![json!(2), json!(3)]));
///
/// let wire = codec.encode_request(&request)?;
/// assert_eq!(wire, json!({"jsonrpc": "2.0", "method": "add", "params": [2, 3], "id": 1}));
/// assert_eq!(codec.decode(wire)?, Message::Request(request));
/// # Ok(())
/// # }
/// ```
pub trait ProtocolCodec: Send + Sync + 'static {
    /// Returns the registry key of this codec.
    fn name(&self) -> &'static str;

    /// Encodes a request.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the request cannot be expressed in
    /// this protocol.
    fn encode_request(&self, request: &Request) -> Result<Value, ProtocolError>;

    /// Encodes a notification.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the notification cannot be expressed
    /// in this protocol.
    fn encode_notification(&self, notification: &Notification) -> Result<Value, ProtocolError>;

    /// Encodes a response.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the response cannot be expressed in
    /// this protocol.
    fn encode_response(&self, response: &Response) -> Result<Value, ProtocolError>;

    /// Decodes any message kind.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the value is not a valid envelope.
    fn decode(&self, value: Value) -> Result<Message, ProtocolError>;

    /// Encodes any message kind.
    fn encode(&self, message: &Message) -> Result<Value, ProtocolError> {
        match message {
            Message::Request(request) => self.encode_request(request),
            Message::Notification(notification) => self.encode_notification(notification),
            Message::Response(response) => self.encode_response(response),
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn into_object(value: Value) -> Result<Map<String, Value>, ProtocolError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ProtocolError::NotAnObject {
            found: value_kind(&other),
        }),
    }
}

/// Whether an envelope is a call (request or notification) or a reply.
pub(crate) fn is_call(map: &Map<String, Value>) -> bool {
    map.contains_key("method") || !(map.contains_key("result") || map.contains_key("error"))
}

pub(crate) fn check_keys(map: &Map<String, Value>, allowed: &[&str]) -> Result<(), ProtocolError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(ProtocolError::UnexpectedKey { key: key.clone() }),
        None => Ok(()),
    }
}

pub(crate) fn check_version(
    map: &Map<String, Value>,
    field: &'static str,
    expected: &'static str,
) -> Result<(), ProtocolError> {
    match map.get(field) {
        Some(Value::String(v)) if v == expected => Ok(()),
        Some(other) => Err(ProtocolError::VersionMismatch {
            field,
            expected,
            found: other.to_string(),
        }),
        None => Err(ProtocolError::VersionMismatch {
            field,
            expected,
            found: "nothing".to_string(),
        }),
    }
}

pub(crate) fn take_method(map: &mut Map<String, Value>) -> Result<String, ProtocolError> {
    match map.remove("method") {
        Some(Value::String(method)) => Ok(method),
        Some(other) => Err(ProtocolError::invalid(
            "method",
            format!("must be a string, found {}", value_kind(&other)),
        )),
        None => Err(ProtocolError::MissingField { field: "method" }),
    }
}

/// Absent and `null` ids both read as `None`.
pub(crate) fn take_id(map: &mut Map<String, Value>) -> Result<Option<RequestId>, ProtocolError> {
    match map.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => RequestId::from_value(&value).map(Some).ok_or_else(|| {
            ProtocolError::invalid("id", "must be an integer or a string")
        }),
    }
}

pub(crate) fn encode_error(error: &ErrorObject, with_origin: bool) -> Value {
    let mut map = Map::new();
    map.insert("code".into(), Value::from(error.code));
    map.insert("message".into(), Value::String(error.message.clone()));
    if let Some(data) = &error.data {
        map.insert("data".into(), data.clone());
    }
    if with_origin {
        if let Some(origin) = &error.origin {
            let mut o = Map::new();
            o.insert("type".into(), Value::String(origin.type_name.clone()));
            o.insert(
                "trace".into(),
                Value::Array(origin.trace.iter().cloned().map(Value::String).collect()),
            );
            map.insert("origin".into(), Value::Object(o));
        }
    }
    Value::Object(map)
}

pub(crate) fn decode_error(value: Value, with_origin: bool) -> Result<ErrorObject, ProtocolError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(ProtocolError::invalid(
                "error",
                format!("must be an object, found {}", value_kind(&other)),
            ));
        }
    };

    let code = match map.remove("code") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ProtocolError::invalid("error", "code must be an integer"))?,
        Some(_) => return Err(ProtocolError::invalid("error", "code must be an integer")),
        None => return Err(ProtocolError::MissingField { field: "error.code" }),
    };
    let message = match map.remove("message") {
        Some(Value::String(message)) => message,
        Some(_) => return Err(ProtocolError::invalid("error", "message must be a string")),
        None => {
            return Err(ProtocolError::MissingField {
                field: "error.message",
            });
        }
    };
    // An explicit `"data": null` is kept as `Some(Null)`.
    let data = map.remove("data");

    let origin = match map.remove("origin") {
        Some(value) if with_origin && !value.is_null() => Some(decode_origin(value)?),
        _ => None,
    };

    Ok(ErrorObject {
        code,
        message,
        data,
        origin,
    })
}

fn decode_origin(value: Value) -> Result<ErrorOrigin, ProtocolError> {
    let mut map = match value {
        Value::Object(map) => map,
        _ => return Err(ProtocolError::invalid("error", "origin must be an object")),
    };
    let type_name = match map.remove("type") {
        Some(Value::String(t)) => t,
        _ => return Err(ProtocolError::invalid("error", "origin.type must be a string")),
    };
    let trace = match map.remove("trace") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(lines)) => lines
            .into_iter()
            .map(|line| match line {
                Value::String(s) => Ok(s),
                _ => Err(ProtocolError::invalid(
                    "error",
                    "origin.trace must hold strings",
                )),
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(ProtocolError::invalid(
                "error",
                "origin.trace must be an array",
            ));
        }
    };
    Ok(ErrorOrigin { type_name, trace })
}

/// Builds a response envelope around `id` plus `result` or `error`.
pub(crate) fn encode_response_envelope(
    version_field: &'static str,
    version: &'static str,
    response: &Response,
    with_origin: bool,
) -> Value {
    let mut map = Map::new();
    map.insert(version_field.into(), Value::String(version.into()));
    map.insert(
        "id".into(),
        response
            .id
            .as_ref()
            .map(RequestId::to_value)
            .unwrap_or(Value::Null),
    );
    match &response.outcome {
        Ok(result) => map.insert("result".into(), result.clone()),
        Err(error) => map.insert("error".into(), encode_error(error, with_origin)),
    };
    Value::Object(map)
}

/// Decodes a response envelope whose keys and version were already checked.
pub(crate) fn decode_response_envelope(
    mut map: Map<String, Value>,
    with_origin: bool,
) -> Result<Response, ProtocolError> {
    let id = take_id(&mut map)?;
    match (map.remove("result"), map.remove("error")) {
        (Some(result), None) => {
            let id = id.ok_or(ProtocolError::MissingField { field: "id" })?;
            Ok(Response::success(id, result))
        }
        (None, Some(error)) => Ok(Response::error(id, decode_error(error, with_origin)?)),
        _ => Err(ProtocolError::AmbiguousResponse),
    }
}
