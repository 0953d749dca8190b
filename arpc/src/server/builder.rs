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

//! Server facade.

use crate::config::RpcConfig;
use crate::dispatcher::{Connection, ConnectionOptions, Direction, TraceHook};
use crate::protocol::{Message, Params, ProtocolCodec};
use crate::registry::Registry;
use crate::serialization::Serializer;
use crate::server::{FnHandler, Handler, HandlerError, MethodRegistry, ServerError, TypedHandler};
use crate::transport::{Transport, TransportError, TransportListener};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[cfg(feature = "tcp")]
use crate::transport::TcpTransportListener;

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Builder for a [`Server`].
///
/// Duplicate method names are reported by [`build`](Self::build).
///
/// # Examples
///
/// ```rust
/// use arpc::config::RpcConfig;
/// use arpc::server::Server;
///
/// let server = Server::builder()
///     .config(RpcConfig::new().with_protocol("arpc"))
///     .typed("add", |(a, b): (i64, i64)| async move { Ok(a + b) })
///     .typed("neg", |(a,): (i64,)| async move { Ok(-a) })
///     .build()
///     .unwrap();
/// assert!(server.methods().contains("add"));
/// ```
pub struct ServerBuilder {
    config: RpcConfig,
    registry: Registry,
    handlers: Vec<(String, Arc<dyn Handler>)>,
    trace: Option<TraceHook>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            config: RpcConfig::default(),
            registry: Registry::with_builtins(),
            handlers: Vec::new(),
            trace: None,
        }
    }
}

impl ServerBuilder {
    /// Creates a builder with the default configuration and the built-in
    /// codecs and serializers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: RpcConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the codec and serializer registry.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds a handler.
    pub fn handler(mut self, name: impl Into<String>, handler: impl Handler) -> Self {
        self.handlers.push((name.into(), Arc::new(handler)));
        self
    }

    /// Adds a closure over raw [`Params`].
    pub fn method<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.handler(name, FnHandler::new(f))
    }

    /// Adds a closure over a deserializable argument.
    pub fn typed<F, Fut, A, R>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        A: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
    {
        self.handler(name, TypedHandler::new(f))
    }

    /// Installs a callback that sees every decoded message in both
    /// directions.
    pub fn trace<F>(mut self, trace: F) -> Self
    where
        F: Fn(Direction, &Message) + Send + Sync + 'static,
    {
        self.trace = Some(Arc::new(trace));
        self
    }

    /// Logs every message at debug level.
    pub fn trace_to_log(self) -> Self {
        self.trace(|direction, message| debug!("{} {:?}", direction, message))
    }

    /// Builds the server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DuplicateMethod`] if a method name was added
    /// twice, or [`ServerError::Registry`] if the configured protocol or
    /// serializer cannot be resolved.
    pub fn build(self) -> Result<Server, ServerError> {
        let (codec, serializer) = self.registry.build(&self.config)?;
        let mut methods = MethodRegistry::new();
        for (name, handler) in self.handlers {
            methods.insert(name, handler)?;
        }
        Ok(Server {
            inner: Arc::new(ServerInner {
                config: self.config,
                codec,
                serializer,
                methods: Arc::new(methods),
                trace: self.trace,
            }),
        })
    }
}

struct ServerInner {
    config: RpcConfig,
    codec: Arc<dyn ProtocolCodec>,
    serializer: Arc<dyn Serializer>,
    methods: Arc<MethodRegistry>,
    trace: Option<TraceHook>,
}

/// Serves one method registry over any number of transports.
///
/// Every bound transport gets its own [`Connection`] sharing the same
/// methods, codec and serializer. The peer may call back into the server
/// side through the returned connection.
///
/// # Examples
///
/// ```rust
/// use arpc::client::Client;
/// use arpc::config::RpcConfig;
/// use arpc::server::Server;
/// use arpc::transport::MemoryTransport;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let server = Server::builder()
///     .typed("add", |(a, b): (i64, i64)| async move { Ok(a + b) })
///     .build()?;
///
/// let (left, right) = MemoryTransport::pair_default();
/// let _served = server.serve(right);
/// let client = Client::connect(left, &RpcConfig::default())?;
///
/// let sum: i64 = client.call_typed("add", (2, 3)).await?;
/// assert_eq!(sum, 5);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Server {
    inner: Arc<ServerInner>,
}

impl Server {
    /// Starts building a server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The served methods.
    pub fn methods(&self) -> &MethodRegistry {
        &self.inner.methods
    }

    /// The configuration this server was built with.
    pub fn config(&self) -> &RpcConfig {
        &self.inner.config
    }

    /// Binds `transport` and starts serving it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn serve<T: Transport>(&self, transport: T) -> Connection {
        let mut options = ConnectionOptions::default()
            .with_default_timeout(self.inner.config.default_timeout)
            .with_methods(self.inner.methods.clone());
        if let Some(trace) = &self.inner.trace {
            options = options.with_trace(trace.clone());
        }
        Connection::open(
            transport,
            self.inner.codec.clone(),
            self.inner.serializer.clone(),
            options,
        )
    }

    /// Accepts transports from `listener` and serves each one.
    ///
    /// Runs until the listener reports [`TransportError::Closed`]. Other
    /// accept failures are logged and accepting continues.
    pub async fn serve_listener<L>(&self, listener: L) -> Result<(), ServerError>
    where
        L: TransportListener,
    {
        let address = listener
            .local_addr()
            .unwrap_or_else(|_| "<unknown>".to_string());
        info!(%address, "Accepting connections");
        loop {
            match listener.accept().await {
                Ok(transport) => {
                    let connection = self.serve(transport);
                    debug!(transport_id = %connection.metadata().id, "Serving accepted transport");
                }
                Err(TransportError::Closed) => {
                    info!(%address, "Listener closed");
                    return Ok(());
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    /// Binds a TCP listener using the configured frame size limit.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if the address cannot be bound.
    #[cfg(feature = "tcp")]
    pub async fn bind_tcp(
        &self,
        addr: impl Into<String>,
    ) -> Result<TcpTransportListener, ServerError> {
        Ok(TcpTransportListener::bind(addr)
            .await?
            .with_max_frame_size(self.inner.config.max_frame_size as usize))
    }

    /// Binds `addr` and serves every accepted TCP connection.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if the address cannot be bound.
    #[cfg(feature = "tcp")]
    pub async fn serve_tcp(&self, addr: impl Into<String>) -> Result<(), ServerError> {
        let listener = self.bind_tcp(addr).await?;
        self.serve_listener(listener).await
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("protocol", &self.inner.codec.name())
            .field("serializer", &self.inner.serializer.name())
            .field("methods", &self.inner.methods.len())
            .field("trace", &self.inner.trace.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::registry::RegistryError;
    use crate::transport::MemoryTransport;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_duplicate_method_fails_build() {
        let error = Server::builder()
            .method("a", |_| async { Ok(Value::Null) })
            .typed("a", |(): ()| async { Ok(1) })
            .build()
            .unwrap_err();
        assert!(matches!(error, ServerError::DuplicateMethod { name } if name == "a"));
    }

    #[test]
    fn test_unknown_protocol_fails_build() {
        let error = Server::builder()
            .config(RpcConfig::new().with_protocol("soap"))
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            ServerError::Registry(RegistryError::UnknownProtocol(_))
        ));
    }

    #[tokio::test]
    async fn test_serve_memory_transport() {
        let server = Server::builder()
            .typed("add", |(a, b): (i64, i64)| async move { Ok(a + b) })
            .build()
            .unwrap();
        let (left, right) = MemoryTransport::pair_default();
        let served = server.serve(right);
        let client = Client::connect(left, &RpcConfig::default()).unwrap();

        let sum = client
            .call("add", Params::positional(vec![json!(2), json!(3)]))
            .await
            .unwrap();
        assert_eq!(sum, json!(5));

        client.close().await;
        served.closed().await;
    }

    #[tokio::test]
    async fn test_trace_hook_sees_both_directions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let server = Server::builder()
            .method("ping", |_| async { Ok(json!("pong")) })
            .trace(move |direction, message| {
                seen_clone
                    .lock()
                    .push((direction, message.kind().to_string()));
            })
            .build()
            .unwrap();
        let (left, right) = MemoryTransport::pair_default();
        let _served = server.serve(right);
        let client = Client::connect(left, &RpcConfig::default()).unwrap();

        client.call("ping", Params::none()).await.unwrap();
        client.close().await;

        let seen = seen.lock();
        assert_eq!(
            *seen,
            vec![
                (Direction::Inbound, "request".to_string()),
                (Direction::Outbound, "response".to_string()),
            ]
        );
    }
}
