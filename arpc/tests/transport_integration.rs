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

//! End-to-end tests over every built-in transport and protocol/serializer
//! combination.

use arpc::client::Client;
use arpc::config::RpcConfig;
use arpc::protocol::Params;
use arpc::server::{HandlerError, Server};
use arpc::transport::{MemoryBus, MemoryTransport, TcpTransportListener, TransportListener};
use serde_json::json;
use std::time::Duration;

fn math(config: RpcConfig) -> Server {
    Server::builder()
        .config(config)
        .typed("math.add", |(a, b): (i64, i64)| async move { Ok(a + b) })
        .method("math.describe", |params: Params| async move {
            Ok(json!({"args": params.args, "kwargs": params.kwargs}))
        })
        .typed("math.sqrt", |(x,): (f64,)| async move {
            if x < 0.0 {
                return Err(HandlerError::invalid_params("negative input"));
            }
            Ok(x.sqrt())
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_every_protocol_and_serializer() {
    for protocol in ["jsonrpc", "arpc"] {
        for serializer in ["json", "postcard"] {
            let config = RpcConfig::new()
                .with_protocol(protocol)
                .with_serializer(serializer);
            let (left, right) = MemoryTransport::pair_default();
            let _served = math(config.clone()).serve(right);
            let client = Client::connect(left, &config).unwrap();

            let sum: i64 = client.call_typed("math.add", (2, 3)).await.unwrap();
            assert_eq!(sum, 5, "{protocol}/{serializer}");

            let root: f64 = client.call_typed("math.sqrt", (16.0,)).await.unwrap();
            assert_eq!(root, 4.0, "{protocol}/{serializer}");

            let error = client
                .call_typed::<_, f64>("math.sqrt", (-1.0,))
                .await
                .unwrap_err();
            assert!(error.is_application_error(), "{protocol}/{serializer}");

            client.close().await;
        }
    }
}

#[tokio::test]
async fn test_arpc_carries_args_and_kwargs_together() {
    let config = RpcConfig::new()
        .with_protocol("arpc")
        .with_serializer("postcard");
    let (left, right) = MemoryTransport::pair_default();
    let _served = math(config.clone()).serve(right);
    let client = Client::connect(left, &config).unwrap();

    let value = client
        .request("math.describe")
        .arg(1)
        .arg("x")
        .kwarg("scale", 2.5)
        .kwarg("tags", json!(["a", "b"]))
        .await
        .unwrap();
    assert_eq!(
        value,
        json!({"args": [1, "x"], "kwargs": {"scale": 2.5, "tags": ["a", "b"]}})
    );
    client.close().await;
}

#[tokio::test]
async fn test_bus_topology_with_many_clients() {
    let bus = MemoryBus::new();
    let server_side = bus.subscribe("rpc.math").unwrap();
    let _served = math(RpcConfig::default()).serve(server_side);

    let mut tasks = Vec::new();
    for i in 0..8i64 {
        let client = Client::connect(bus.connect("rpc.math"), &RpcConfig::default()).unwrap();
        tasks.push(tokio::spawn(async move {
            for j in 0..10i64 {
                let sum: i64 = client.call_typed("math.add", (i, j)).await.unwrap();
                assert_eq!(sum, i + j);
            }
            client.close().await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_bus_without_subscriber_fails_the_call() {
    let bus = MemoryBus::new();
    let client = Client::connect(bus.connect("rpc.nobody"), &RpcConfig::default()).unwrap();

    let error = client.call("math.add", vec![json!(1), json!(2)]).await.unwrap_err();
    assert!(matches!(error, arpc::RpcError::Transport(_)));
    assert_eq!(client.connection().pending_count(), 0);
    client.close().await;
}

#[tokio::test]
async fn test_tcp_end_to_end() {
    let config = RpcConfig::new()
        .with_protocol("arpc")
        .with_default_timeout(Some(Duration::from_secs(5)));
    let server = math(config.clone());
    let listener = server.bind_tcp("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept = tokio::spawn(async move { server.serve_listener(listener).await });

    let first = Client::connect_tcp(addr.clone(), &config).await.unwrap();
    let second = Client::connect_tcp(addr, &config).await.unwrap();

    let (a, b) = tokio::join!(
        first.call_typed::<_, i64>("math.add", (1, 2)),
        second.call_typed::<_, i64>("math.add", (10, 20)),
    );
    assert_eq!(a.unwrap(), 3);
    assert_eq!(b.unwrap(), 30);

    first.close().await;
    // Closing one client leaves the others served.
    let sum: i64 = second.call_typed("math.add", (5, 5)).await.unwrap();
    assert_eq!(sum, 10);
    second.close().await;
    accept.abort();
}

#[tokio::test]
async fn test_tcp_connect_refused() {
    let listener = TcpTransportListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let error = Client::connect_tcp(addr, &RpcConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(error, arpc::RpcError::Transport(_)));
}
