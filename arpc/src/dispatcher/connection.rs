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

//! A bound connection and its receive loop.
//!
//! A [`Connection`] ties one transport to one protocol codec, one
//! serializer, one pending-call table and one id generator. Opening it
//! spawns the receive loop, which runs until the transport ends, the peer
//! sends something undecodable, or [`Connection::close`] is called. On the
//! way out the loop fails every call still pending.

use crate::dispatcher::{CorrelationIdGenerator, PendingCall, PendingCalls, Resolution};
use crate::error::{Result, RpcError};
use crate::protocol::{
    ErrorObject, Message, Notification, Params, ProtocolCodec, Request, RequestId, Response,
};
use crate::serialization::Serializer;
use crate::server::MethodRegistry;
use crate::transport::{Frame, FrameSink, FrameSource, Transport, TransportMetadata};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Direction of a traced message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Decoded from an inbound frame
    Inbound,
    /// About to be encoded into an outbound frame
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("-->"),
            Direction::Outbound => f.write_str("<--"),
        }
    }
}

/// Callback observing every message a connection sends or receives.
pub type TraceHook = Arc<dyn Fn(Direction, &Message) + Send + Sync>;

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// The receive loop is running.
    Open,
    /// The receive loop has ended and every pending call was failed.
    Closed,
}

/// Settings for [`Connection::open`].
#[derive(Clone, Default)]
pub struct ConnectionOptions {
    /// Timeout applied by [`Connection::call`]; `None` waits indefinitely
    pub default_timeout: Option<Duration>,
    /// Methods served to the peer; without them every inbound request is
    /// answered with "method not found"
    pub methods: Option<Arc<MethodRegistry>>,
    /// Message trace callback
    pub trace: Option<TraceHook>,
}

impl ConnectionOptions {
    /// Sets the default call timeout.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Serves `methods` on this connection.
    pub fn with_methods(mut self, methods: Arc<MethodRegistry>) -> Self {
        self.methods = Some(methods);
        self
    }

    /// Installs a trace callback.
    pub fn with_trace(mut self, trace: TraceHook) -> Self {
        self.trace = Some(trace);
        self
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("default_timeout", &self.default_timeout)
            .field("methods", &self.methods.as_ref().map(|m| m.len()))
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

struct Inner {
    metadata: TransportMetadata,
    sink: Arc<dyn FrameSink>,
    codec: Arc<dyn ProtocolCodec>,
    serializer: Arc<dyn Serializer>,
    pending: Arc<PendingCalls>,
    ids: CorrelationIdGenerator,
    methods: Option<Arc<MethodRegistry>>,
    trace: Option<TraceHook>,
    default_timeout: Option<Duration>,
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<ConnectionState>,
}

/// One bound transport, multiplexing concurrent calls in both directions.
///
/// `Connection` is a cheap handle; clones share the same underlying
/// connection. The receive loop keeps running after every handle is
/// dropped, until the peer closes, so call [`close`](Self::close) to end it
/// from this side.
///
/// # Example
///
/// ```rust
/// use arpc::dispatcher::{Connection, ConnectionOptions};
/// use arpc::protocol::{JsonRpcCodec, Params};
/// use arpc::serialization::JsonSerializer;
/// use arpc::server::MethodRegistry;
/// use arpc::transport::MemoryTransport;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # async fn example() -> arpc::Result<()> {
/// let mut methods = MethodRegistry::new();
/// methods
///     .register_typed("add", |(a, b): (i64, i64)| async move { Ok(a + b) })
///     .expect("fresh registry");
///
/// let (left, right) = MemoryTransport::pair_default();
/// let _server = Connection::open(
///     right,
///     Arc::new(JsonRpcCodec),
///     Arc::new(JsonSerializer::new()),
///     ConnectionOptions::default().with_methods(Arc::new(methods)),
/// );
/// let client = Connection::open(
///     left,
///     Arc::new(JsonRpcCodec),
///     Arc::new(JsonSerializer::new()),
///     ConnectionOptions::default(),
/// );
///
/// let sum = client.call("add", Params::positional(vec![json!(2), json!(3)])).await?;
/// assert_eq!(sum, json!(5));
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    /// Binds `transport` and spawns the receive loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open<T: Transport>(
        transport: T,
        codec: Arc<dyn ProtocolCodec>,
        serializer: Arc<dyn Serializer>,
        options: ConnectionOptions,
    ) -> Self {
        let metadata = transport.metadata().clone();
        let (sink, source) = Box::new(transport).split();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (state_tx, state) = watch::channel(ConnectionState::Open);

        let inner = Arc::new(Inner {
            metadata,
            sink,
            codec,
            serializer,
            pending: Arc::new(PendingCalls::new()),
            ids: CorrelationIdGenerator::new(),
            methods: options.methods,
            trace: options.trace,
            default_timeout: options.default_timeout,
            shutdown,
            state,
        });

        let span = info_span!(
            "connection",
            transport_id = %inner.metadata.id,
            transport = %inner.metadata.transport_type,
        );
        info!(
            parent: &span,
            protocol = inner.codec.name(),
            serializer = inner.serializer.name(),
            peer = inner.metadata.peer_addr.as_deref().unwrap_or("-"),
            "Connection opened"
        );
        tokio::spawn(receive_loop(inner.clone(), source, shutdown_rx, state_tx).instrument(span));

        Self { inner }
    }

    /// Calls `method` with the connection's default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Application`] if the peer answered with an error,
    /// [`RpcError::Timeout`] if no answer arrived in time, or a transport,
    /// protocol or serialization error if the request could not be sent.
    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.call_with_timeout(method, params, self.inner.default_timeout)
            .await
    }

    /// Calls `method` with an explicit timeout; `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Params,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        self.start_call(method, params, timeout).await?.await
    }

    /// Sends a request and returns the future of its outcome.
    ///
    /// The deadline starts now and covers sending. The returned
    /// [`PendingCall`] can be awaited later or cancelled through its
    /// [`CancelHandle`](crate::dispatcher::CancelHandle).
    ///
    /// # Errors
    ///
    /// Fails if the connection is closed or the request could not be sent.
    /// A send failure fails only this call.
    pub async fn start_call(
        &self,
        method: &str,
        params: Params,
        timeout: Option<Duration>,
    ) -> Result<PendingCall> {
        let id = self.inner.ids.next_id();
        let rx = self.inner.pending.register(id.clone(), method)?;
        let mut call = PendingCall::new(
            id.clone(),
            rx,
            timeout,
            Arc::downgrade(&self.inner.pending),
        );

        let request = Message::Request(Request {
            id: id.clone(),
            method: method.to_string(),
            params,
        });
        if let Err(e) = self.inner.send_message(&request, None).await {
            self.inner.pending.discard(&id);
            call.disarm();
            return Err(e);
        }
        Ok(call)
    }

    /// Sends a notification. Returns once the frame has been handed to the
    /// transport; no response is ever expected.
    ///
    /// # Errors
    ///
    /// Fails if the notification could not be encoded or sent.
    pub async fn notify(&self, method: &str, params: Params) -> Result<()> {
        let notification = Message::Notification(Notification {
            method: method.to_string(),
            params,
        });
        self.inner.send_message(&notification, None).await
    }

    /// Closes the connection and waits for the receive loop to finish.
    ///
    /// Every call still pending fails with a connection-lost error.
    pub async fn close(&self) {
        self.inner.shutdown.send_replace(true);
        self.closed().await;
    }

    /// Waits until the connection has closed, from either side.
    pub async fn closed(&self) {
        let mut state = self.inner.state.clone();
        // An error means the loop is gone, which also means closed.
        let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Number of calls awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Metadata of the underlying transport.
    pub fn metadata(&self) -> &TransportMetadata {
        &self.inner.metadata
    }

    /// The connection's default call timeout.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.inner.default_timeout
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport_id", &self.inner.metadata.id)
            .field("protocol", &self.inner.codec.name())
            .field("serializer", &self.inner.serializer.name())
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Inner {
    async fn send_message(&self, message: &Message, destination: Option<&str>) -> Result<()> {
        if let Some(trace) = &self.trace {
            trace(Direction::Outbound, message);
        }
        let value = self.codec.encode(message)?;
        let bytes = self.serializer.dumps(&value)?;
        debug!(
            kind = message.kind(),
            size = bytes.len(),
            destination,
            "Sending frame"
        );
        self.sink.send(bytes, destination).await?;
        Ok(())
    }

    /// Decodes one frame and routes it. An error ends the connection.
    async fn handle_frame(self: &Arc<Self>, frame: Frame) -> std::result::Result<(), String> {
        let value = self.serializer.loads(&frame.payload).map_err(|e| {
            error!(error = %e, size = frame.payload.len(), "Undecodable frame, closing connection");
            format!("undecodable frame: {}", e)
        })?;
        let message = self.codec.decode(value).map_err(|e| {
            error!(error = %e, "Malformed message, closing connection");
            format!("malformed message: {}", e)
        })?;
        debug!(kind = message.kind(), method = message.method(), "Received frame");

        if let Some(trace) = &self.trace {
            trace(Direction::Inbound, &message);
        }

        match message {
            Message::Response(response) => self.route_response(response),
            Message::Request(request) => self.dispatch_request(request, frame.reply_to).await,
            Message::Notification(notification) => self.dispatch_notification(notification),
        }
        Ok(())
    }

    fn route_response(&self, response: Response) {
        let Some(id) = response.id else {
            warn!(outcome = ?response.outcome, "Dropping response without id");
            return;
        };
        let resolution = match response.outcome {
            Ok(value) => Resolution::Success(value),
            Err(error) => Resolution::Failed(error),
        };
        if !self.pending.resolve(&id, resolution) {
            warn!(%id, "Dropping response for unknown or already settled call");
        }
    }

    async fn dispatch_request(self: &Arc<Self>, request: Request, reply_to: Option<String>) {
        let Request { id, method, params } = request;
        let invocation = self
            .methods
            .as_ref()
            .and_then(|methods| methods.invoke(&method, params));

        let Some(invocation) = invocation else {
            debug!(%id, %method, "Method not found");
            self.respond(id, Err(ErrorObject::method_not_found(&method)), reply_to)
                .await;
            return;
        };

        let this = Arc::clone(self);
        tokio::spawn(
            async move {
                let outcome = invocation.await;
                this.respond(id, outcome, reply_to).await;
            }
            .in_current_span(),
        );
    }

    fn dispatch_notification(&self, notification: Notification) {
        let Notification { method, params } = notification;
        let invocation = self
            .methods
            .as_ref()
            .and_then(|methods| methods.invoke(&method, params));

        let Some(invocation) = invocation else {
            warn!(%method, "Notification for unknown method");
            return;
        };

        tokio::spawn(
            async move {
                if let Err(error) = invocation.await {
                    warn!(%method, %error, "Notification handler failed");
                }
            }
            .in_current_span(),
        );
    }

    async fn respond(
        &self,
        id: RequestId,
        outcome: std::result::Result<Value, ErrorObject>,
        reply_to: Option<String>,
    ) {
        let response = Message::Response(Response {
            id: Some(id.clone()),
            outcome,
        });
        let error = match self.send_message(&response, reply_to.as_deref()).await {
            Ok(()) => return,
            Err(e) => e,
        };

        // A result the serializer cannot represent still gets an answer.
        if matches!(
            error,
            RpcError::Serialization(_) | RpcError::Protocol(_)
        ) {
            warn!(%id, %error, "Response could not be encoded, answering with internal error");
            let fallback = Message::Response(Response::error(
                Some(id.clone()),
                ErrorObject::internal_error().with_data(Value::String(error.to_string())),
            ));
            if let Err(e) = self.send_message(&fallback, reply_to.as_deref()).await {
                warn!(%id, error = %e, "Failed to send response");
            }
        } else {
            warn!(%id, %error, "Failed to send response");
        }
    }
}

async fn receive_loop(
    inner: Arc<Inner>,
    mut source: Box<dyn FrameSource>,
    mut shutdown: watch::Receiver<bool>,
    state: watch::Sender<ConnectionState>,
) {
    let reason = loop {
        tokio::select! {
            () = async { let _ = shutdown.wait_for(|closing| *closing).await; } => {
                break "connection closed locally".to_string();
            }
            frame = source.recv() => match frame {
                None => break "connection closed by peer".to_string(),
                Some(Err(e)) => {
                    error!(error = %e, "Transport receive failed");
                    break format!("transport failed: {}", e);
                }
                Some(Ok(frame)) => {
                    if let Err(reason) = inner.handle_frame(frame).await {
                        break reason;
                    }
                }
            },
        }
    };

    let failed = inner.pending.drain(&reason);
    if let Err(e) = inner.sink.close().await {
        debug!(error = %e, "Error closing transport");
    }
    state.send_replace(ConnectionState::Closed);
    info!(%reason, failed_calls = failed, "Connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonRpcCodec;
    use crate::serialization::JsonSerializer;
    use crate::server::HandlerError;
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    /// The raw far end of a connection under test.
    struct Peer {
        sink: Arc<dyn FrameSink>,
        source: Box<dyn FrameSource>,
    }

    impl Peer {
        async fn recv(&mut self) -> Value {
            let frame = self.source.recv().await.unwrap().unwrap();
            serde_json::from_slice(&frame.payload).unwrap()
        }

        async fn send(&self, value: Value) {
            self.sink
                .send(serde_json::to_vec(&value).unwrap(), None)
                .await
                .unwrap();
        }
    }

    fn open_with(options: ConnectionOptions) -> (Connection, Peer) {
        let (left, right) = MemoryTransport::pair_default();
        let connection = Connection::open(
            left,
            Arc::new(JsonRpcCodec),
            Arc::new(JsonSerializer::new()),
            options,
        );
        let (sink, source) = Box::new(right).split();
        (connection, Peer { sink, source })
    }

    fn open() -> (Connection, Peer) {
        open_with(ConnectionOptions::default())
    }

    fn reply(id: u64, result: Value) -> Value {
        json!({"jsonrpc": "2.0", "id": id, "result": result})
    }

    #[tokio::test]
    async fn test_out_of_order_responses() {
        let (connection, mut peer) = open();

        let c1 = connection
            .start_call("first", Params::none(), None)
            .await
            .unwrap();
        let c2 = connection
            .start_call("second", Params::none(), None)
            .await
            .unwrap();
        assert_eq!(c1.id(), &RequestId::Number(1));
        assert_eq!(c2.id(), &RequestId::Number(2));
        assert_eq!(peer.recv().await["method"], "first");
        assert_eq!(peer.recv().await["method"], "second");

        peer.send(reply(2, json!("two"))).await;
        assert_eq!(c2.await.unwrap(), json!("two"));
        assert_eq!(connection.pending_count(), 1);

        peer.send(reply(1, json!("one"))).await;
        assert_eq!(c1.await.unwrap(), json!("one"));
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_late_reply_is_dropped() {
        let (connection, mut peer) = open();

        let error = connection
            .call_with_timeout("slow", Params::none(), Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(error.is_timeout());
        let request = peer.recv().await;
        assert_eq!(request["id"], 1);

        let next = connection
            .start_call("fast", Params::none(), None)
            .await
            .unwrap();
        peer.recv().await;

        peer.send(reply(1, json!("late"))).await;
        peer.send(reply(2, json!("on time"))).await;
        assert_eq!(next.await.unwrap(), json!("on time"));
        assert_eq!(connection.state(), ConnectionState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_call_times_out_before_it_is_awaited() {
        let (connection, mut peer) = open();

        let call = connection
            .start_call("slow", Params::none(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        peer.recv().await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(connection.pending_count(), 0);

        peer.send(reply(1, json!(7))).await;
        // Round-trip another call so the late reply has been routed.
        let next = connection
            .start_call("fast", Params::none(), None)
            .await
            .unwrap();
        peer.recv().await;
        peer.send(reply(2, json!("ok"))).await;
        assert_eq!(next.await.unwrap(), json!("ok"));

        assert!(call.await.unwrap_err().is_timeout());
        assert_eq!(connection.state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_application_error_is_not_fatal() {
        let (connection, mut peer) = open();

        let failing = connection
            .start_call("boom", Params::none(), None)
            .await
            .unwrap();
        let other = connection
            .start_call("fine", Params::none(), None)
            .await
            .unwrap();
        peer.recv().await;
        peer.recv().await;

        peer.send(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "Server error"}}))
            .await;
        let error = failing.await.unwrap_err();
        assert_eq!(error.error_object().map(|e| e.code), Some(-32000));

        peer.send(reply(2, json!(true))).await;
        assert_eq!(other.await.unwrap(), json!(true));
    }

    #[tokio::test]
    async fn test_peer_close_fails_all_pending() {
        let (connection, mut peer) = open();

        let c1 = connection.start_call("a", Params::none(), None).await.unwrap();
        let c2 = connection.start_call("b", Params::none(), None).await.unwrap();
        peer.recv().await;
        peer.recv().await;

        peer.sink.close().await.unwrap();
        for call in [c1, c2] {
            assert!(call.await.unwrap_err().is_connection_fatal());
        }
        connection.closed().await;
        assert_eq!(connection.state(), ConnectionState::Closed);

        let error = connection.call("c", Params::none()).await.unwrap_err();
        assert!(error.is_connection_fatal());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_fatal() {
        let (connection, mut peer) = open();
        let call = connection.start_call("a", Params::none(), None).await.unwrap();
        peer.recv().await;

        peer.sink.send(b"{not json".to_vec(), None).await.unwrap();
        assert!(call.await.unwrap_err().is_connection_fatal());
        connection.closed().await;
    }

    #[tokio::test]
    async fn test_invalid_envelope_is_fatal() {
        let (connection, peer) = open();
        peer.send(json!({"jsonrpc": "1.0", "id": 1, "result": 0})).await;
        connection.closed().await;
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_unknown_method_answered_inline() {
        let (_connection, mut peer) = open();
        peer.send(json!({"jsonrpc": "2.0", "method": "nope", "id": 7}))
            .await;
        let response = peer.recv().await;
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_negative_request_id_is_echoed() {
        let mut methods = MethodRegistry::new();
        methods
            .register_typed("ping", |(): ()| async move { Ok("pong") })
            .unwrap();
        let (connection, mut peer) =
            open_with(ConnectionOptions::default().with_methods(Arc::new(methods)));

        peer.send(json!({"jsonrpc": "2.0", "method": "ping", "id": -1}))
            .await;
        assert_eq!(
            peer.recv().await,
            json!({"jsonrpc": "2.0", "id": -1, "result": "pong"})
        );

        peer.send(json!({"jsonrpc": "2.0", "method": "nope", "id": -9}))
            .await;
        let response = peer.recv().await;
        assert_eq!(response["id"], -9);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(connection.state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_notification_is_never_answered() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let mut methods = MethodRegistry::new();
        let log = seen.clone();
        methods
            .register_fn("log", move |params: Params| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(params.args[0].clone());
                    Err::<Value, _>(HandlerError::internal("ignored"))
                }
            })
            .unwrap();
        methods
            .register_typed("ping", |(): ()| async move { Ok("pong") })
            .unwrap();
        let (_connection, mut peer) =
            open_with(ConnectionOptions::default().with_methods(Arc::new(methods)));

        peer.send(json!({"jsonrpc": "2.0", "method": "log", "params": ["hi"]}))
            .await;
        peer.send(json!({"jsonrpc": "2.0", "method": "ping", "id": 1}))
            .await;

        // The only frame that ever comes back is the ping's response.
        let response = peer.recv().await;
        assert_eq!(response, json!({"jsonrpc": "2.0", "id": 1, "result": "pong"}));
        assert_eq!(*seen.lock().unwrap(), vec![json!("hi")]);
    }

    #[tokio::test]
    async fn test_trace_sees_both_directions() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink = events.clone();
        let trace: TraceHook = Arc::new(move |direction, message: &Message| {
            sink.lock().unwrap().push((direction, message.kind()));
        });
        let (connection, mut peer) = open_with(ConnectionOptions::default().with_trace(trace));

        let call = connection.start_call("m", Params::none(), None).await.unwrap();
        peer.recv().await;
        peer.send(reply(1, json!(0))).await;
        call.await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                (Direction::Outbound, "request"),
                (Direction::Inbound, "response")
            ]
        );
    }

    #[tokio::test]
    async fn test_close_fails_pending_and_is_idempotent() {
        let (connection, _peer) = open();
        let call = connection.start_call("a", Params::none(), None).await.unwrap();
        connection.close().await;
        assert!(call.await.unwrap_err().is_connection_fatal());
        connection.close().await;
        assert_eq!(connection.state(), ConnectionState::Closed);
    }
}
