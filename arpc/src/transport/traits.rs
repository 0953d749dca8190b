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

//! Core transport trait definitions.

use crate::transport::{Frame, TransportError, TransportMetadata};
use async_trait::async_trait;
use std::sync::Arc;

/// A connected, frame-oriented byte transport.
///
/// Transports deliver whole frames in per-connection FIFO order and never
/// retry. A connection splits its transport once: the [`FrameSink`] half is
/// shared by every caller and handler task that needs to send, while the
/// [`FrameSource`] half is owned by the single receive loop.
///
/// # Examples
///
/// ```rust
/// use arpc::transport::{MemoryTransport, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (left, right) = MemoryTransport::pair(16);
/// let (sink, _source) = Box::new(left).split();
/// let (_sink, mut source) = Box::new(right).split();
///
/// sink.send(b"hello".to_vec(), None).await?;
/// let frame = source.recv().await.unwrap()?;
/// assert_eq!(frame.payload, b"hello");
/// # Ok(())
/// # }
/// ```
pub trait Transport: Send + 'static {
    /// Returns metadata about this transport.
    fn metadata(&self) -> &TransportMetadata;

    /// Splits the transport into its sending and receiving halves.
    fn split(self: Box<Self>) -> (Arc<dyn FrameSink>, Box<dyn FrameSource>);
}

/// Sending half of a transport.
#[async_trait]
pub trait FrameSink: Send + Sync + 'static {
    /// Sends one frame.
    ///
    /// `destination` is only meaningful for bus-addressed transports, where
    /// it names the subject to publish on (typically the `reply_to` of the
    /// frame being answered). Point-to-point transports ignore it.
    ///
    /// A full transport suspends the caller instead of failing.
    async fn send(&self, payload: Vec<u8>, destination: Option<&str>)
    -> Result<(), TransportError>;

    /// Closes the sending half. The peer observes end-of-stream.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Receiving half of a transport.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Receives the next frame.
    ///
    /// Returns `None` once the connection has closed.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;
}

/// Trait for transports that accept incoming connections.
#[async_trait]
pub trait TransportListener: Send + Sync {
    /// The type of transport this listener produces
    type Transport: Transport;

    /// Accepts a new incoming connection.
    async fn accept(&self) -> Result<Self::Transport, TransportError>;

    /// Returns the local address this listener is bound to.
    fn local_addr(&self) -> Result<String, TransportError>;
}
