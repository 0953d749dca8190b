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

//! Calling methods on a peer.
//!
//! [`Client`] is a thin facade over a [`Connection`]: it resolves the
//! codec and serializer from an [`RpcConfig`], lifts typed arguments into
//! [`Params`] and decodes typed results. [`CallBuilder`] sets per-call
//! options and [`Proxy`] prefixes method names, optionally turning every
//! call into a notification.

mod call;
mod proxy;

pub use self::call::CallBuilder;
pub use self::proxy::Proxy;

use crate::config::RpcConfig;
use crate::dispatcher::{Connection, ConnectionOptions};
use crate::error::Result;
use crate::protocol::Params;
use crate::registry::Registry;
use crate::serialization::{DeserializationError, SerializationError};
use crate::transport::Transport;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The calling side of a connection.
///
/// Cloning is cheap; clones share the connection.
///
/// # Examples
///
/// ```rust
/// use arpc::client::Client;
/// use arpc::config::RpcConfig;
/// use arpc::server::Server;
/// use arpc::transport::MemoryTransport;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let server = Server::builder()
///     .typed("greet", |(name,): (String,)| async move { Ok(format!("hello {name}")) })
///     .build()?;
/// let (left, right) = MemoryTransport::pair_default();
/// let _served = server.serve(right);
///
/// let client = Client::connect(left, &RpcConfig::default())?;
/// let greeting = client
///     .request("greet")
///     .arg("ada")
///     .timeout(Duration::from_secs(1))
///     .await?;
/// assert_eq!(greeting, "hello ada");
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    connection: Connection,
}

impl Client {
    /// Wraps an open connection.
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Binds `transport` with the codec and serializer named by `config`,
    /// chosen from the built-in registry.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Registry`](crate::RpcError::Registry) if a key
    /// in `config` cannot be resolved.
    pub fn connect<T: Transport>(transport: T, config: &RpcConfig) -> Result<Self> {
        Self::connect_with(transport, config, &Registry::with_builtins())
    }

    /// Like [`connect`](Self::connect), resolving keys in `registry`.
    ///
    /// # Errors
    ///
    /// See [`connect`](Self::connect).
    pub fn connect_with<T: Transport>(
        transport: T,
        config: &RpcConfig,
        registry: &Registry,
    ) -> Result<Self> {
        let (codec, serializer) = registry.build(config)?;
        let options = ConnectionOptions::default().with_default_timeout(config.default_timeout);
        Ok(Self::new(Connection::open(
            transport, codec, serializer, options,
        )))
    }

    /// Connects to a TCP server.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be resolved or the connection
    /// cannot be established.
    #[cfg(feature = "tcp")]
    pub async fn connect_tcp(addr: impl Into<String>, config: &RpcConfig) -> Result<Self> {
        let registry = Registry::with_builtins();
        // Resolve first so a bad key does not leave a dangling socket.
        registry.build(config)?;
        let transport = crate::transport::TcpTransport::connect(addr)
            .await?
            .with_max_frame_size(config.max_frame_size as usize);
        Self::connect_with(transport, config, &registry)
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Calls `method` with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`Connection::call`].
    pub async fn call(&self, method: &str, params: impl Into<Params>) -> Result<Value> {
        self.connection.call(method, params.into()).await
    }

    /// Calls `method` with a serializable argument and decodes the result.
    ///
    /// Tuples and sequences become positional parameters, structs and maps
    /// become keyword parameters, `()` sends none.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`call`](Self::call), returns
    /// [`RpcError::Serialization`](crate::RpcError::Serialization) if `args`
    /// cannot be represented and
    /// [`RpcError::Deserialization`](crate::RpcError::Deserialization) if
    /// the result does not decode as `R`.
    pub async fn call_typed<A, R>(&self, method: &str, args: A) -> Result<R>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let params = Params::from_value(
            serde_json::to_value(args).map_err(SerializationError::from)?,
        );
        let value = self.call(method, params).await?;
        Ok(serde_json::from_value(value).map_err(DeserializationError::from)?)
    }

    /// Sends a notification.
    ///
    /// # Errors
    ///
    /// See [`Connection::notify`].
    pub async fn notify(&self, method: &str, params: impl Into<Params>) -> Result<()> {
        self.connection.notify(method, params.into()).await
    }

    /// Starts building a call to `method`.
    pub fn request(&self, method: impl Into<String>) -> CallBuilder {
        CallBuilder::new(self.connection.clone(), method.into())
    }

    /// Returns a proxy that prepends `prefix` to every method name.
    pub fn proxy(&self, prefix: impl Into<String>) -> Proxy {
        Proxy::new(self.clone(), prefix.into())
    }

    /// Closes the connection. Calls still pending fail with a connection
    /// error.
    pub async fn close(&self) {
        self.connection.close().await;
    }
}
