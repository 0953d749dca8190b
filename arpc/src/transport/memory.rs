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

//! In-memory loopback transport.
//!
//! A pair of bounded queues, one per direction. Useful for tests and for
//! wiring a client and server together inside one process.

use crate::transport::{
    Frame, FrameSink, FrameSource, Transport, TransportError, TransportId, TransportMetadata,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// In-memory loopback transport.
///
/// # Examples
///
/// ```rust
/// use arpc::transport::MemoryTransport;
///
/// let (client_side, server_side) = MemoryTransport::pair_default();
/// ```
pub struct MemoryTransport {
    metadata: TransportMetadata,
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl MemoryTransport {
    /// Creates a pair of connected memory transports.
    ///
    /// `buffer_size` bounds each direction's queue. When a queue is full,
    /// `send` suspends until the peer reads.
    pub fn pair(buffer_size: usize) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(buffer_size);
        let (tx2, rx2) = mpsc::channel(buffer_size);

        let id1 = TransportId::next();
        let id2 = TransportId::next();
        debug!(%id1, %id2, buffer_size, "created memory transport pair");

        let transport1 = Self {
            metadata: TransportMetadata::new(id1, "memory").with_peer_addr(id2.to_string()),
            tx: tx1,
            rx: rx2,
        };
        let transport2 = Self {
            metadata: TransportMetadata::new(id2, "memory").with_peer_addr(id1.to_string()),
            tx: tx2,
            rx: rx1,
        };

        (transport1, transport2)
    }

    /// Creates a pair of connected memory transports with the default buffer size.
    pub fn pair_default() -> (Self, Self) {
        Self::pair(DEFAULT_BUFFER_SIZE)
    }
}

impl Transport for MemoryTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn split(self: Box<Self>) -> (Arc<dyn FrameSink>, Box<dyn FrameSource>) {
        let this = *self;
        (
            Arc::new(MemorySink {
                tx: Mutex::new(Some(this.tx)),
            }),
            Box::new(MemorySource { rx: this.rx }),
        )
    }
}

struct MemorySink {
    // Taking the sender on close is what lets the peer observe end-of-stream.
    tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(
        &self,
        payload: Vec<u8>,
        _destination: Option<&str>,
    ) -> Result<(), TransportError> {
        let tx = self.tx.lock().clone().ok_or(TransportError::Closed)?;
        tx.send(payload)
            .await
            .map_err(|_| TransportError::connection_lost("memory peer dropped"))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.tx.lock().take();
        Ok(())
    }
}

struct MemorySource {
    rx: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.rx.recv().await.map(|payload| Ok(Frame::new(payload)))
    }
}
