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

//! Integration tests for request/response correlation over an in-memory
//! transport pair.

use arpc::client::Client;
use arpc::config::RpcConfig;
use arpc::dispatcher::{Connection, ConnectionOptions};
use arpc::protocol::{JsonRpcCodec, Params};
use arpc::serialization::JsonSerializer;
use arpc::server::{HandlerError, MethodRegistry, Server};
use arpc::transport::MemoryTransport;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn calculator() -> Server {
    Server::builder()
        .typed("add", |(a, b): (i64, i64)| async move { Ok(a + b) })
        .typed("slow_echo", |(value, delay_ms): (i64, u64)| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(value)
        })
        .typed("divide", |(a, b): (i64, i64)| async move {
            if b == 0 {
                return Err(HandlerError::new(-32010, "division by zero").with_data(json!(a)));
            }
            Ok(a / b)
        })
        .build()
        .unwrap()
}

fn connect(server: &Server) -> (Client, Connection) {
    let (left, right) = MemoryTransport::pair_default();
    let served = server.serve(right);
    let client = Client::connect(left, &RpcConfig::default()).unwrap();
    (client, served)
}

#[tokio::test]
async fn test_simple_call() {
    let (client, _served) = connect(&calculator());
    let sum = client
        .call("add", vec![json!(2), json!(3)])
        .await
        .unwrap();
    assert_eq!(sum, json!(5));
    client.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_responses() {
    let (client, _served) = connect(&calculator());

    let slow = client.call_typed::<_, i64>("slow_echo", (1, 300));
    let medium = client.call_typed::<_, i64>("slow_echo", (2, 200));
    let fast = client.call_typed::<_, i64>("slow_echo", (3, 0));
    let (slow, medium, fast) = tokio::join!(slow, medium, fast);

    assert_eq!(slow.unwrap(), 1);
    assert_eq!(medium.unwrap(), 2);
    assert_eq!(fast.unwrap(), 3);
    assert_eq!(client.connection().pending_count(), 0);
    client.close().await;
}

#[tokio::test]
async fn test_many_concurrent_calls() {
    let (client, _served) = connect(&calculator());

    let mut tasks = Vec::new();
    for i in 0..200i64 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let sum: i64 = client.call_typed("add", (i, i)).await.unwrap();
            assert_eq!(sum, i * 2);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(client.connection().pending_count(), 0);
    client.close().await;
}

#[tokio::test]
async fn test_application_error_keeps_connection() {
    let (client, _served) = connect(&calculator());

    let error = client.call_typed::<_, i64>("divide", (7, 0)).await.unwrap_err();
    assert!(error.is_application_error());
    assert!(!error.is_connection_fatal());
    let object = error.error_object().unwrap();
    assert_eq!(object.code, -32010);
    assert_eq!(object.message, "division by zero");
    assert_eq!(object.data, Some(json!(7)));

    let quotient: i64 = client.call_typed("divide", (7, 2)).await.unwrap();
    assert_eq!(quotient, 3);
    client.close().await;
}

#[tokio::test]
async fn test_calls_in_both_directions() {
    let mut left_methods = MethodRegistry::new();
    left_methods
        .register_typed("whoami", |(): ()| async { Ok("left") })
        .unwrap();
    let mut right_methods = MethodRegistry::new();
    right_methods
        .register_typed("whoami", |(): ()| async { Ok("right") })
        .unwrap();

    let (a, b) = MemoryTransport::pair_default();
    let left = Connection::open(
        a,
        Arc::new(JsonRpcCodec),
        Arc::new(JsonSerializer::new()),
        ConnectionOptions::default().with_methods(Arc::new(left_methods)),
    );
    let right = Connection::open(
        b,
        Arc::new(JsonRpcCodec),
        Arc::new(JsonSerializer::new()),
        ConnectionOptions::default().with_methods(Arc::new(right_methods)),
    );

    let (from_left, from_right) = tokio::join!(
        left.call("whoami", Params::none()),
        right.call("whoami", Params::none()),
    );
    assert_eq!(from_left.unwrap(), json!("right"));
    assert_eq!(from_right.unwrap(), json!("left"));

    left.close().await;
    right.closed().await;
}
