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

//! In-process subject bus with implicit reply inboxes.
//!
//! Every participant owns exactly one subject it receives on. A published
//! frame is stamped with the publisher's subject as `reply_to`, so a server
//! subscribed to `"math"` answers each request on the inbox of whichever
//! client sent it without ever knowing about that client up front.

use crate::transport::{
    Frame, FrameSink, FrameSource, Transport, TransportError, TransportId, TransportMetadata,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Prefix of the subjects allocated for client reply inboxes.
pub const INBOX_PREFIX: &str = "_INBOX.";

struct BusInner {
    subjects: HashMap<String, mpsc::Sender<Frame>>,
    next_inbox: u64,
}

/// An in-process publish/subscribe bus.
///
/// Cloning the bus yields another handle to the same set of subjects.
///
/// # Examples
///
/// ```rust
/// use arpc::transport::MemoryBus;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = MemoryBus::new();
/// let server_side = bus.subscribe("math")?;
/// let client_side = bus.connect("math");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryBus {
    inner: Arc<Mutex<BusInner>>,
    buffer_size: usize,
}

impl MemoryBus {
    /// Creates an empty bus with the default per-subject buffer.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Creates an empty bus whose subject queues hold `buffer_size` frames.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                subjects: HashMap::new(),
                next_inbox: 1,
            })),
            buffer_size,
        }
    }

    /// Subscribes to `subject`, typically on the serving side.
    ///
    /// Frames sent through the returned transport must name a destination,
    /// which is normally the `reply_to` of the frame being answered.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::BindFailed`] if the subject already has a
    /// subscriber.
    pub fn subscribe(&self, subject: impl Into<String>) -> Result<BusTransport, TransportError> {
        let subject = subject.into();
        let rx = self.register(&subject)?;
        debug!(%subject, "subscribed to bus subject");
        Ok(self.transport(subject, None, rx))
    }

    /// Connects to the subscriber of `subject` through a fresh reply inbox.
    ///
    /// Frames sent without an explicit destination go to `subject`.
    pub fn connect(&self, subject: impl Into<String>) -> BusTransport {
        let target = subject.into();
        let (inbox, rx) = {
            let mut inner = self.inner.lock();
            let inbox = format!("{}{}", INBOX_PREFIX, inner.next_inbox);
            inner.next_inbox += 1;
            let (tx, rx) = mpsc::channel(self.buffer_size);
            inner.subjects.insert(inbox.clone(), tx);
            (inbox, rx)
        };
        debug!(%inbox, %target, "connected to bus subject");
        self.transport(inbox, Some(target), rx)
    }

    /// Returns `true` if `subject` currently has a subscriber.
    pub fn has_subscriber(&self, subject: &str) -> bool {
        self.inner.lock().subjects.contains_key(subject)
    }

    fn register(&self, subject: &str) -> Result<mpsc::Receiver<Frame>, TransportError> {
        let mut inner = self.inner.lock();
        if inner.subjects.contains_key(subject) {
            return Err(TransportError::BindFailed {
                address: subject.to_string(),
                source: io::Error::new(io::ErrorKind::AddrInUse, "subject already subscribed"),
            });
        }
        let (tx, rx) = mpsc::channel(self.buffer_size);
        inner.subjects.insert(subject.to_string(), tx);
        Ok(rx)
    }

    fn transport(
        &self,
        subject: String,
        default_destination: Option<String>,
        rx: mpsc::Receiver<Frame>,
    ) -> BusTransport {
        let mut metadata = TransportMetadata::new(TransportId::next(), "bus")
            .with_local_addr(subject.clone());
        if let Some(target) = &default_destination {
            metadata = metadata.with_peer_addr(target.clone());
        }
        BusTransport {
            metadata,
            bus: self.clone(),
            subject,
            default_destination,
            rx,
        }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One participant's view of a [`MemoryBus`].
pub struct BusTransport {
    metadata: TransportMetadata,
    bus: MemoryBus,
    subject: String,
    default_destination: Option<String>,
    rx: mpsc::Receiver<Frame>,
}

impl BusTransport {
    /// Returns the subject this transport receives on.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl Transport for BusTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn split(self: Box<Self>) -> (Arc<dyn FrameSink>, Box<dyn FrameSource>) {
        let this = *self;
        (
            Arc::new(BusSink {
                bus: this.bus,
                subject: this.subject,
                default_destination: this.default_destination,
                closed: Mutex::new(false),
            }),
            Box::new(BusSource { rx: this.rx }),
        )
    }
}

struct BusSink {
    bus: MemoryBus,
    subject: String,
    default_destination: Option<String>,
    closed: Mutex<bool>,
}

#[async_trait]
impl FrameSink for BusSink {
    async fn send(
        &self,
        payload: Vec<u8>,
        destination: Option<&str>,
    ) -> Result<(), TransportError> {
        if *self.closed.lock() {
            return Err(TransportError::Closed);
        }
        let destination = destination
            .or(self.default_destination.as_deref())
            .ok_or(TransportError::MissingDestination)?;

        let tx = self
            .bus
            .inner
            .lock()
            .subjects
            .get(destination)
            .cloned()
            .ok_or_else(|| TransportError::NoRoute {
                subject: destination.to_string(),
            })?;

        let frame = Frame::new(payload).with_reply_to(self.subject.clone());
        tx.send(frame).await.map_err(|_| TransportError::NoRoute {
            subject: destination.to_string(),
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.closed.lock() = true;
        if self.bus.inner.lock().subjects.remove(&self.subject).is_some() {
            debug!(subject = %self.subject, "unsubscribed from bus subject");
        }
        Ok(())
    }
}

impl Drop for BusSink {
    fn drop(&mut self) {
        if !*self.closed.get_mut() {
            self.bus.inner.lock().subjects.remove(&self.subject);
        }
    }
}

struct BusSource {
    rx: mpsc::Receiver<Frame>,
}

#[async_trait]
impl FrameSource for BusSource {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.rx.recv().await.map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_carries_reply_inbox() {
        let bus = MemoryBus::new();
        let server = bus.subscribe("echo").unwrap();
        let client = bus.connect("echo");
        let inbox = client.subject().to_string();
        assert!(inbox.starts_with(INBOX_PREFIX));

        let (client_sink, mut client_source) = Box::new(client).split();
        let (server_sink, mut server_source) = Box::new(server).split();

        client_sink.send(b"ping".to_vec(), None).await.unwrap();
        let frame = server_source.recv().await.unwrap().unwrap();
        assert_eq!(frame.payload, b"ping");
        assert_eq!(frame.reply_to.as_deref(), Some(inbox.as_str()));

        server_sink
            .send(b"pong".to_vec(), frame.reply_to.as_deref())
            .await
            .unwrap();
        let reply = client_source.recv().await.unwrap().unwrap();
        assert_eq!(reply.payload, b"pong");
        assert_eq!(reply.reply_to.as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn test_send_without_subscriber() {
        let bus = MemoryBus::new();
        let (sink, _source) = Box::new(bus.connect("nobody")).split();
        assert!(matches!(
            sink.send(b"x".to_vec(), None).await,
            Err(TransportError::NoRoute { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_send_needs_destination() {
        let bus = MemoryBus::new();
        let (sink, _source) = Box::new(bus.subscribe("svc").unwrap()).split();
        assert!(matches!(
            sink.send(b"x".to_vec(), None).await,
            Err(TransportError::MissingDestination)
        ));
    }

    #[test]
    fn test_duplicate_subscription_rejected() {
        let bus = MemoryBus::new();
        let _first = bus.subscribe("svc").unwrap();
        assert!(matches!(
            bus.subscribe("svc"),
            Err(TransportError::BindFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_unsubscribes_and_ends_stream() {
        let bus = MemoryBus::new();
        let (sink, mut source) = Box::new(bus.subscribe("svc").unwrap()).split();
        assert!(bus.has_subscriber("svc"));

        sink.close().await.unwrap();
        assert!(!bus.has_subscriber("svc"));
        assert!(source.recv().await.is_none());
    }
}
