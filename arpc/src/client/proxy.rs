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

//! Method-name prefixing proxy.

use crate::client::Client;
use crate::error::Result;
use crate::protocol::Params;
use serde_json::Value;

/// Calls methods under a common name prefix.
///
/// The prefix is prepended verbatim, so include the separator:
/// `client.proxy("math.")` turns `call("add", ..)` into a call to
/// `math.add`. In one-way mode every call is sent as a notification and
/// resolves to `null` as soon as it is written.
///
/// # Examples
///
/// ```rust
/// # use arpc::client::Client;
/// # async fn example(client: Client) -> arpc::Result<()> {
/// use serde_json::json;
///
/// let math = client.proxy("math.");
/// let sum = math.call("add", vec![json!(1), json!(2)]).await?;
///
/// let log = client.proxy("log.").one_way();
/// log.call("info", vec![json!("started")]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Proxy {
    client: Client,
    prefix: String,
    one_way: bool,
}

impl Proxy {
    pub(crate) fn new(client: Client, prefix: String) -> Self {
        Self {
            client,
            prefix,
            one_way: false,
        }
    }

    /// Switches to one-way mode.
    pub fn one_way(mut self) -> Self {
        self.one_way = true;
        self
    }

    /// Returns `true` in one-way mode.
    pub fn is_one_way(&self) -> bool {
        self.one_way
    }

    /// Full method name for `name`.
    pub fn method_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Calls `prefix + name`.
    ///
    /// # Errors
    ///
    /// See [`Client::call`] and [`Client::notify`].
    pub async fn call(&self, name: &str, params: impl Into<Params>) -> Result<Value> {
        let method = self.method_name(name);
        if self.one_way {
            self.client.notify(&method, params).await?;
            Ok(Value::Null)
        } else {
            self.client.call(&method, params).await
        }
    }

    /// Sends `prefix + name` as a notification regardless of mode.
    ///
    /// # Errors
    ///
    /// See [`Client::notify`].
    pub async fn notify(&self, name: &str, params: impl Into<Params>) -> Result<()> {
        self.client.notify(&self.method_name(name), params).await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::Client;
    use crate::config::RpcConfig;
    use crate::protocol::Params;
    use crate::server::Server;
    use crate::transport::MemoryTransport;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_prefix_and_one_way() {
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let server = Server::builder()
            .typed("math.add", |(a, b): (i64, i64)| async move { Ok(a + b) })
            .method("log.info", move |params: Params| {
                let seen_tx = seen_tx.clone();
                async move {
                    let _ = seen_tx.send(params.args);
                    Ok(Value::Null)
                }
            })
            .build()
            .unwrap();
        let (left, right) = MemoryTransport::pair_default();
        let _served = server.serve(right);
        let client = Client::connect(left, &RpcConfig::default()).unwrap();

        let math = client.proxy("math.");
        assert_eq!(math.method_name("add"), "math.add");
        assert_eq!(
            math.call("add", vec![json!(1), json!(2)]).await.unwrap(),
            json!(3)
        );

        let log = client.proxy("log.").one_way();
        assert!(log.is_one_way());
        let value = log.call("info", vec![json!("started")]).await.unwrap();
        assert_eq!(value, Value::Null);
        assert_eq!(seen_rx.recv().await, Some(vec![json!("started")]));
        assert_eq!(client.connection().pending_count(), 0);

        client.close().await;
    }

    #[tokio::test]
    async fn test_missing_prefixed_method() {
        let server = Server::builder().build().unwrap();
        let (left, right) = MemoryTransport::pair_default();
        let _served = server.serve(right);
        let client = Client::connect(left, &RpcConfig::default()).unwrap();

        let error = client
            .proxy("math.")
            .call("add", Params::none())
            .await
            .unwrap_err();
        let error = error.error_object().cloned().unwrap();
        assert_eq!(error.data, Some(json!("math.add")));
        client.close().await;
    }
}
