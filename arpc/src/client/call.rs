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

//! Per-call options.

use crate::dispatcher::{Connection, PendingCall};
use crate::error::Result;
use crate::protocol::Params;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::IntoFuture;
use std::time::Duration;

/// A call under construction.
///
/// Awaiting the builder sends the request and waits for its outcome.
/// [`start`](Self::start) sends it and hands back the [`PendingCall`]
/// instead, which can be cancelled.
#[must_use = "a call does nothing until it is awaited or started"]
#[derive(Debug)]
pub struct CallBuilder {
    connection: Connection,
    method: String,
    params: Params,
    timeout: Option<Duration>,
}

impl CallBuilder {
    pub(crate) fn new(connection: Connection, method: String) -> Self {
        let timeout = connection.default_timeout();
        Self {
            connection,
            method,
            params: Params::none(),
            timeout,
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.params = self.params.with_arg(value.into());
        self
    }

    /// Sets a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params = self.params.with_kwarg(name, value.into());
        self
    }

    /// Replaces all parameters.
    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.params = params.into();
        self
    }

    /// Overrides the connection's default timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Waits for the response indefinitely.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Sends the request and returns its pending outcome.
    ///
    /// # Errors
    ///
    /// See [`Connection::start_call`].
    pub async fn start(self) -> Result<PendingCall> {
        self.connection
            .start_call(&self.method, self.params, self.timeout)
            .await
    }

    /// Sends the request and waits for the outcome.
    ///
    /// # Errors
    ///
    /// See [`Connection::call`].
    pub async fn send(self) -> Result<Value> {
        self.start().await?.await
    }

    /// Sends the call as a notification; the timeout is ignored.
    ///
    /// # Errors
    ///
    /// See [`Connection::notify`].
    pub async fn notify(self) -> Result<()> {
        self.connection.notify(&self.method, self.params).await
    }
}

impl IntoFuture for CallBuilder {
    type Output = Result<Value>;
    type IntoFuture = BoxFuture<'static, Result<Value>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.send())
    }
}

#[cfg(test)]
mod tests {
    use crate::RpcError;
    use crate::client::Client;
    use crate::config::RpcConfig;
    use crate::server::Server;
    use crate::transport::MemoryTransport;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn slow_client() -> Client {
        let server = Server::builder()
            .typed("sleep", |(ms,): (u64,)| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(ms)
            })
            .build()
            .unwrap();
        let (left, right) = MemoryTransport::pair_default();
        let _ = server.serve(right);
        Client::connect(
            left,
            &RpcConfig::new().with_default_timeout(Some(Duration::from_millis(100))),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_applies() {
        let client = slow_client();
        let error = client.request("sleep").arg(5_000).await.unwrap_err();
        assert!(error.is_timeout());
        assert_eq!(client.connection().pending_count(), 0);
        client.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_override() {
        let client = slow_client();
        let value = client
            .request("sleep")
            .arg(500)
            .timeout(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(value, json!(500));

        let value = client.request("sleep").arg(500).no_timeout().await.unwrap();
        assert_eq!(value, json!(500));
        client.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_started_call() {
        let client = slow_client();
        let call = client
            .request("sleep")
            .arg(60_000)
            .no_timeout()
            .start()
            .await
            .unwrap();
        let handle = call.cancel_handle();
        assert_eq!(client.connection().pending_count(), 1);

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(matches!(call.await, Err(RpcError::Cancelled { .. })));
        assert_eq!(client.connection().pending_count(), 0);

        // Other calls keep working.
        let value: Value = client.request("sleep").arg(1).await.unwrap();
        assert_eq!(value, json!(1));
        client.close().await;
    }
}
