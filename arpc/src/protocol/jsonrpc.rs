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

//! JSON-RPC 2.0 codec.

use crate::protocol::codec::{
    check_keys, check_version, decode_response_envelope, encode_response_envelope, into_object,
    is_call, take_id, take_method, value_kind,
};
use crate::protocol::{
    Message, Notification, Params, ProtocolCodec, ProtocolError, Request, RequestId, Response,
};
use serde_json::{Map, Value};

/// Value of the `jsonrpc` version marker.
pub const JSON_RPC_VERSION: &str = "2.0";

const REQUEST_KEYS: &[&str] = &["jsonrpc", "method", "params", "id"];
const RESPONSE_KEYS: &[&str] = &["jsonrpc", "result", "error", "id"];

/// JSON-RPC 2.0 envelope.
///
/// Parameters are either positional (an array) or named (an object), never
/// both; `params` is omitted entirely when there are none. Error objects
/// carry `code`, `message` and optional `data`; an
/// [`ErrorOrigin`](crate::protocol::ErrorOrigin) is not representable and
/// is dropped on encode.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRpcCodec;

impl JsonRpcCodec {
    fn call_envelope(
        method: &str,
        params: &Params,
        id: Option<&RequestId>,
    ) -> Result<Value, ProtocolError> {
        let mut map = Map::new();
        map.insert("jsonrpc".into(), Value::String(JSON_RPC_VERSION.into()));
        map.insert("method".into(), Value::String(method.to_string()));
        match (params.args.is_empty(), params.kwargs.is_empty()) {
            (false, false) => return Err(ProtocolError::MixedParams),
            (false, true) => {
                map.insert("params".into(), Value::Array(params.args.clone()));
            }
            (true, false) => {
                map.insert("params".into(), Value::Object(params.kwargs.clone()));
            }
            (true, true) => {}
        }
        if let Some(id) = id {
            map.insert("id".into(), id.to_value());
        }
        Ok(Value::Object(map))
    }

    fn decode_call(mut map: Map<String, Value>) -> Result<Message, ProtocolError> {
        check_keys(&map, REQUEST_KEYS)?;
        check_version(&map, "jsonrpc", JSON_RPC_VERSION)?;
        let method = take_method(&mut map)?;
        let id = take_id(&mut map)?;
        let params = match map.remove("params") {
            None => Params::none(),
            Some(Value::Array(args)) => Params::positional(args),
            Some(Value::Object(kwargs)) => Params::named(kwargs),
            Some(other) => {
                return Err(ProtocolError::invalid(
                    "params",
                    format!("must be an array or an object, found {}", value_kind(&other)),
                ));
            }
        };
        Ok(match id {
            Some(id) => Message::Request(Request { id, method, params }),
            None => Message::Notification(Notification { method, params }),
        })
    }
}

impl ProtocolCodec for JsonRpcCodec {
    fn name(&self) -> &'static str {
        "jsonrpc"
    }

    fn encode_request(&self, request: &Request) -> Result<Value, ProtocolError> {
        Self::call_envelope(&request.method, &request.params, Some(&request.id))
    }

    fn encode_notification(&self, notification: &Notification) -> Result<Value, ProtocolError> {
        Self::call_envelope(&notification.method, &notification.params, None)
    }

    fn encode_response(&self, response: &Response) -> Result<Value, ProtocolError> {
        Ok(encode_response_envelope(
            "jsonrpc",
            JSON_RPC_VERSION,
            response,
            false,
        ))
    }

    fn decode(&self, value: Value) -> Result<Message, ProtocolError> {
        let map = into_object(value)?;
        if is_call(&map) {
            Self::decode_call(map)
        } else {
            check_keys(&map, RESPONSE_KEYS)?;
            check_version(&map, "jsonrpc", JSON_RPC_VERSION)?;
            decode_response_envelope(map, false).map(Message::Response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorObject, ErrorOrigin, codes};
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        let request = Request::new(1u64, "add", Params::positional(vec![json!(2), json!(3)]));
        let wire = JsonRpcCodec.encode_request(&request).unwrap();
        assert_eq!(
            wire,
            json!({"jsonrpc": "2.0", "method": "add", "params": [2, 3], "id": 1})
        );
        assert_eq!(JsonRpcCodec.decode(wire).unwrap(), Message::Request(request));
    }

    #[test]
    fn test_named_params_round_trip() {
        let params = Params::none()
            .with_kwarg("a", json!(1))
            .with_kwarg("b", json!({"nested": [true, null]}));
        let request = Request::new("abc", "sum", params);
        let wire = JsonRpcCodec.encode_request(&request).unwrap();
        assert_eq!(JsonRpcCodec.decode(wire).unwrap(), Message::Request(request));
    }

    #[test]
    fn test_notification_has_no_id_and_no_empty_params() {
        let notification = Notification::new("log", Params::none());
        let wire = JsonRpcCodec.encode_notification(&notification).unwrap();
        assert_eq!(wire, json!({"jsonrpc": "2.0", "method": "log"}));
        assert_eq!(
            JsonRpcCodec.decode(wire).unwrap(),
            Message::Notification(notification)
        );
    }

    #[test]
    fn test_mixed_params_rejected() {
        let params = Params::positional(vec![json!(1)]).with_kwarg("b", json!(2));
        let request = Request::new(1u64, "f", params);
        assert_eq!(
            JsonRpcCodec.encode_request(&request),
            Err(ProtocolError::MixedParams)
        );
    }

    #[test]
    fn test_success_response_round_trip() {
        let response = Response::success(RequestId::Number(9), json!({"sum": 5}));
        let wire = JsonRpcCodec.encode_response(&response).unwrap();
        assert_eq!(wire, json!({"jsonrpc": "2.0", "id": 9, "result": {"sum": 5}}));
        assert_eq!(JsonRpcCodec.decode(wire).unwrap(), Message::Response(response));
    }

    #[test]
    fn test_null_result_is_still_a_result() {
        let response = Response::success(RequestId::Number(1), Value::Null);
        let wire = JsonRpcCodec.encode_response(&response).unwrap();
        assert_eq!(JsonRpcCodec.decode(wire).unwrap(), Message::Response(response));
    }

    #[test]
    fn test_error_response_round_trip() {
        let error = ErrorObject::invalid_params("expected 2 arguments");
        let response = Response::error(Some(RequestId::Number(4)), error);
        let wire = JsonRpcCodec.encode_response(&response).unwrap();
        assert_eq!(
            wire["error"],
            json!({"code": -32602, "message": "Invalid params", "data": "expected 2 arguments"})
        );
        assert_eq!(JsonRpcCodec.decode(wire).unwrap(), Message::Response(response));
    }

    #[test]
    fn test_error_origin_is_dropped() {
        let error = ErrorObject::internal_error().with_origin(ErrorOrigin {
            type_name: "Boom".into(),
            trace: vec![],
        });
        let response = Response::error(Some(RequestId::Number(1)), error);
        let wire = JsonRpcCodec.encode_response(&response).unwrap();
        let Message::Response(decoded) = JsonRpcCodec.decode(wire).unwrap() else {
            panic!("expected a response");
        };
        let decoded = decoded.outcome.unwrap_err();
        assert_eq!(decoded.code, codes::INTERNAL_ERROR);
        assert!(decoded.origin.is_none());
    }

    #[test]
    fn test_negative_id_is_echoed_unchanged() {
        let wire = json!({"jsonrpc": "2.0", "method": "ping", "id": -1});
        let Message::Request(request) = JsonRpcCodec.decode(wire).unwrap() else {
            panic!("expected a request");
        };
        assert_eq!(request.id, RequestId::Signed(-1));

        let response = Response::success(request.id, json!("pong"));
        let wire = JsonRpcCodec.encode_response(&response).unwrap();
        assert_eq!(wire, json!({"jsonrpc": "2.0", "id": -1, "result": "pong"}));
        assert_eq!(JsonRpcCodec.decode(wire).unwrap(), Message::Response(response));
    }

    #[test]
    fn test_error_response_with_null_id() {
        let wire = json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}});
        let Message::Response(response) = JsonRpcCodec.decode(wire).unwrap() else {
            panic!("expected a response");
        };
        assert_eq!(response.id, None);
        assert!(response.is_error());
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            json!({"jsonrpc": "1.0", "method": "f", "id": 1}),
            json!({"method": "f", "id": 1}),
            json!({"jsonrpc": "2.0", "method": 5, "id": 1}),
            json!({"jsonrpc": "2.0", "method": "f", "id": 1, "extra": true}),
            json!({"jsonrpc": "2.0", "method": "f", "id": [1]}),
            json!({"jsonrpc": "2.0", "method": "f", "id": 1.5}),
            json!({"jsonrpc": "2.0", "method": "f", "params": 3, "id": 1}),
            json!({"jsonrpc": "2.0", "id": 1, "result": 1, "error": {"code": 1, "message": "m"}}),
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": "x", "message": "m"}}),
            json!({"jsonrpc": "2.0", "id": 1}),
            json!(["not", "an", "object"]),
        ];
        for case in cases {
            assert!(JsonRpcCodec.decode(case.clone()).is_err(), "accepted {}", case);
        }
    }
}
