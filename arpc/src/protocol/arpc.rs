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

//! The native `arpc` 1.0 codec.
//!
//! ```text
//! request       {"arpc": "1.0", "method": m, "args": [..], "kwargs": {..}, "id": k}
//! notification  {"arpc": "1.0", "method": m, "args": [..], "kwargs": {..}}
//! success       {"arpc": "1.0", "id": k, "result": v}
//! error         {"arpc": "1.0", "id": k, "error": {"code": c, "message": s,
//!                                                  "data": d, "origin": {"type": t, "trace": [..]}}}
//! ```
//!
//! Positional and keyword arguments travel side by side, and error objects
//! keep the type name and trace of the handler-side failure.

use crate::protocol::codec::{
    check_keys, check_version, decode_response_envelope, encode_response_envelope, into_object,
    is_call, take_id, take_method, value_kind,
};
use crate::protocol::{
    Message, Notification, Params, ProtocolCodec, ProtocolError, Request, RequestId, Response,
};
use serde_json::{Map, Value};

/// Value of the `arpc` version marker.
pub const ARPC_VERSION: &str = "1.0";

const REQUEST_KEYS: &[&str] = &["arpc", "method", "args", "kwargs", "id"];
const RESPONSE_KEYS: &[&str] = &["arpc", "result", "error", "id"];

/// The native envelope, a superset of what JSON-RPC can express.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArpcCodec;

impl ArpcCodec {
    fn call_envelope(method: &str, params: &Params, id: Option<&RequestId>) -> Value {
        let mut map = Map::new();
        map.insert("arpc".into(), Value::String(ARPC_VERSION.into()));
        map.insert("method".into(), Value::String(method.to_string()));
        map.insert("args".into(), Value::Array(params.args.clone()));
        map.insert("kwargs".into(), Value::Object(params.kwargs.clone()));
        if let Some(id) = id {
            map.insert("id".into(), id.to_value());
        }
        Value::Object(map)
    }

    fn decode_call(mut map: Map<String, Value>) -> Result<Message, ProtocolError> {
        check_keys(&map, REQUEST_KEYS)?;
        check_version(&map, "arpc", ARPC_VERSION)?;
        let method = take_method(&mut map)?;
        let id = take_id(&mut map)?;
        let args = match map.remove("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(args)) => args,
            Some(other) => {
                return Err(ProtocolError::invalid(
                    "args",
                    format!("must be an array, found {}", value_kind(&other)),
                ));
            }
        };
        let kwargs = match map.remove("kwargs") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(kwargs)) => kwargs,
            Some(other) => {
                return Err(ProtocolError::invalid(
                    "kwargs",
                    format!("must be an object, found {}", value_kind(&other)),
                ));
            }
        };
        let params = Params { args, kwargs };
        Ok(match id {
            Some(id) => Message::Request(Request { id, method, params }),
            None => Message::Notification(Notification { method, params }),
        })
    }
}

impl ProtocolCodec for ArpcCodec {
    fn name(&self) -> &'static str {
        "arpc"
    }

    fn encode_request(&self, request: &Request) -> Result<Value, ProtocolError> {
        Ok(Self::call_envelope(
            &request.method,
            &request.params,
            Some(&request.id),
        ))
    }

    fn encode_notification(&self, notification: &Notification) -> Result<Value, ProtocolError> {
        Ok(Self::call_envelope(
            &notification.method,
            &notification.params,
            None,
        ))
    }

    fn encode_response(&self, response: &Response) -> Result<Value, ProtocolError> {
        Ok(encode_response_envelope("arpc", ARPC_VERSION, response, true))
    }

    fn decode(&self, value: Value) -> Result<Message, ProtocolError> {
        let map = into_object(value)?;
        if is_call(&map) {
            Self::decode_call(map)
        } else {
            check_keys(&map, RESPONSE_KEYS)?;
            check_version(&map, "arpc", ARPC_VERSION)?;
            decode_response_envelope(map, true).map(Message::Response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorObject, ErrorOrigin};
    use serde_json::json;

    #[test]
    fn test_mixed_params_round_trip() {
        let params = Params::positional(vec![json!("x"), json!(1.5)])
            .with_kwarg("verbose", json!(true));
        let request = Request::new(3u64, "render", params);
        let wire = ArpcCodec.encode_request(&request).unwrap();
        assert_eq!(
            wire,
            json!({"arpc": "1.0", "method": "render", "args": ["x", 1.5], "kwargs": {"verbose": true}, "id": 3})
        );
        assert_eq!(ArpcCodec.decode(wire).unwrap(), Message::Request(request));
    }

    #[test]
    fn test_notification_round_trip() {
        let notification = Notification::new("log", Params::positional(vec![json!("hi")]));
        let wire = ArpcCodec.encode_notification(&notification).unwrap();
        assert!(wire.get("id").is_none());
        assert_eq!(
            ArpcCodec.decode(wire).unwrap(),
            Message::Notification(notification)
        );
    }

    #[test]
    fn test_error_origin_round_trip() {
        let error = ErrorObject::new(-32000, "division by zero")
            .with_data(json!({"dividend": 1}))
            .with_origin(ErrorOrigin {
                type_name: "ZeroDivision".into(),
                trace: vec!["in div".into(), "in handler".into()],
            });
        let response = Response::error(Some(RequestId::Number(2)), error);
        let wire = ArpcCodec.encode_response(&response).unwrap();
        assert_eq!(wire["error"]["origin"]["type"], "ZeroDivision");
        assert_eq!(ArpcCodec.decode(wire).unwrap(), Message::Response(response));
    }

    #[test]
    fn test_missing_params_default_to_empty() {
        let wire = json!({"arpc": "1.0", "method": "ping", "id": 1});
        let Message::Request(request) = ArpcCodec.decode(wire).unwrap() else {
            panic!("expected a request");
        };
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            json!({"jsonrpc": "2.0", "method": "f", "id": 1}),
            json!({"arpc": "2.0", "method": "f", "id": 1}),
            json!({"arpc": "1.0", "method": "f", "args": {}, "id": 1}),
            json!({"arpc": "1.0", "method": "f", "kwargs": [], "id": 1}),
            json!({"arpc": "1.0", "id": 1, "result": 1, "extra": 0}),
            json!({"arpc": "1.0", "id": 1, "error": {"code": 1, "message": "m", "origin": {"trace": []}}}),
        ];
        for case in cases {
            assert!(ArpcCodec.decode(case.clone()).is_err(), "accepted {}", case);
        }
    }
}
