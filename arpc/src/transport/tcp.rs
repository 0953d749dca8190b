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

//! TCP transport implementation.

use crate::transport::framing::{self, MAX_FRAME_SIZE};
use crate::transport::{
    Frame, FrameSink, FrameSource, Transport, TransportError, TransportId, TransportListener,
    TransportMetadata,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

/// Point-to-point transport over a TCP stream with length-prefixed frames.
///
/// # Examples
///
/// ```rust,no_run
/// use arpc::transport::TcpTransport;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TcpTransport::connect("127.0.0.1:7070").await?;
/// # Ok(())
/// # }
/// ```
pub struct TcpTransport {
    stream: TcpStream,
    metadata: TransportMetadata,
    max_frame_size: usize,
}

impl TcpTransport {
    /// Creates a new TCP transport from an existing stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        let id = TransportId::next();
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        stream.set_nodelay(true)?;

        debug!(%id, %local_addr, %peer_addr, "created TCP transport from stream");

        let metadata = TransportMetadata::new(id, "tcp")
            .with_local_addr(local_addr.to_string())
            .with_peer_addr(peer_addr.to_string());

        Ok(Self {
            stream,
            metadata,
            max_frame_size: MAX_FRAME_SIZE,
        })
    }

    /// Connects to a remote TCP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if the connection cannot
    /// be established.
    #[instrument(skip(addr), fields(address))]
    pub async fn connect(addr: impl Into<String>) -> Result<Self, TransportError> {
        let address = addr.into();
        tracing::Span::current().record("address", address.as_str());
        info!("Connecting to TCP endpoint");

        let stream = TcpStream::connect(&address).await.map_err(|source| {
            error!("Failed to connect: {}", source);
            TransportError::ConnectionFailed {
                address: address.clone(),
                source,
            }
        })?;

        Self::from_stream(stream)
    }

    /// Overrides the maximum accepted frame size in both directions.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

impl Transport for TcpTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn split(self: Box<Self>) -> (Arc<dyn FrameSink>, Box<dyn FrameSource>) {
        let this = *self;
        let (reader, writer) = this.stream.into_split();
        (
            Arc::new(TcpSink {
                writer: Mutex::new(Some(writer)),
                max_frame_size: this.max_frame_size,
            }),
            Box::new(TcpSource {
                reader: BufReader::new(reader),
                max_frame_size: this.max_frame_size,
                failed: false,
            }),
        )
    }
}

struct TcpSink {
    // The async mutex keeps one frame's bytes contiguous on the wire.
    writer: Mutex<Option<OwnedWriteHalf>>,
    max_frame_size: usize,
}

#[async_trait]
impl FrameSink for TcpSink {
    async fn send(
        &self,
        payload: Vec<u8>,
        _destination: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(TransportError::Closed)?;
        framing::write_frame(writer, &payload, self.max_frame_size).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        if let Some(mut writer) = self.writer.lock().await.take() {
            writer
                .shutdown()
                .await
                .map_err(|source| TransportError::WriteFailed { source })?;
        }
        Ok(())
    }
}

struct TcpSource {
    reader: BufReader<OwnedReadHalf>,
    max_frame_size: usize,
    failed: bool,
}

#[async_trait]
impl FrameSource for TcpSource {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        if self.failed {
            return None;
        }
        match framing::read_frame(&mut self.reader, self.max_frame_size).await {
            Ok(Some(payload)) => Some(Ok(Frame::new(payload))),
            Ok(None) => None,
            Err(e) => {
                // A broken length prefix leaves the stream unsynchronized.
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Listener producing [`TcpTransport`]s for accepted connections.
pub struct TcpTransportListener {
    listener: TcpListener,
    max_frame_size: usize,
}

impl TcpTransportListener {
    /// Binds to a local address.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::BindFailed`] if the address cannot be bound.
    #[instrument(skip(addr), fields(address))]
    pub async fn bind(addr: impl Into<String>) -> Result<Self, TransportError> {
        let address = addr.into();
        tracing::Span::current().record("address", address.as_str());

        let listener = TcpListener::bind(&address).await.map_err(|source| {
            error!("Failed to bind: {}", source);
            TransportError::BindFailed {
                address: address.clone(),
                source,
            }
        })?;

        info!("TCP listener bound");
        Ok(Self {
            listener,
            max_frame_size: MAX_FRAME_SIZE,
        })
    }

    /// Overrides the maximum frame size of accepted transports.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

#[async_trait]
impl TransportListener for TcpTransportListener {
    type Transport = TcpTransport;

    async fn accept(&self) -> Result<TcpTransport, TransportError> {
        let (stream, peer_addr) = self.listener.accept().await?;
        debug!(%peer_addr, "accepted TCP connection");
        Ok(TcpTransport::from_stream(stream)?.with_max_frame_size(self.max_frame_size))
    }

    fn local_addr(&self) -> Result<String, TransportError> {
        Ok(self.listener.local_addr()?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_round_trip_frames() {
        let listener = TcpTransportListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });
        let client = TcpTransport::connect(addr).await.unwrap();
        let server = accept.await.unwrap();

        assert_eq!(client.metadata().transport_type, "tcp");

        let (client_sink, mut client_source) = Box::new(client).split();
        let (server_sink, mut server_source) = Box::new(server).split();

        client_sink.send(b"ping".to_vec(), None).await.unwrap();
        assert_eq!(server_source.recv().await.unwrap().unwrap().payload, b"ping");

        server_sink.send(b"pong".to_vec(), None).await.unwrap();
        assert_eq!(client_source.recv().await.unwrap().unwrap().payload, b"pong");

        client_sink.close().await.unwrap();
        assert!(server_source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpTransportListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = TcpTransport::connect(addr).await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed { .. })));
    }
}
