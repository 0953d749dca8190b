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

//! Common transport types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transport instance within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(u64);

impl TransportId {
    /// Creates a transport ID from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide transport ID.
    pub fn next() -> Self {
        Self(NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport({})", self.0)
    }
}

/// Metadata about a transport connection, used for logging.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Unique identifier for this transport
    pub id: TransportId,

    /// Local address or subject, if any
    pub local_addr: Option<String>,

    /// Remote address or subject, if any
    pub peer_addr: Option<String>,

    /// Transport type (e.g. "tcp", "memory", "bus")
    pub transport_type: String,

    /// When the transport was created
    pub created_at: std::time::Instant,
}

impl TransportMetadata {
    /// Creates new transport metadata.
    pub fn new(id: TransportId, transport_type: impl Into<String>) -> Self {
        Self {
            id,
            local_addr: None,
            peer_addr: None,
            transport_type: transport_type.into(),
            created_at: std::time::Instant::now(),
        }
    }

    /// Sets the local address.
    pub fn with_local_addr(mut self, addr: impl Into<String>) -> Self {
        self.local_addr = Some(addr.into());
        self
    }

    /// Sets the peer address.
    pub fn with_peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = Some(addr.into());
        self
    }

    /// Returns the age of this transport.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// An inbound byte frame.
///
/// A frame is always delivered whole. Bus-style transports attach the
/// address the sender expects replies on; point-to-point transports leave
/// `reply_to` empty because the reply path is the connection itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Serialized wire message
    pub payload: Vec<u8>,
    /// Implicit reply address supplied by the transport
    pub reply_to: Option<String>,
}

impl Frame {
    /// Creates a frame without a reply address.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            reply_to: None,
        }
    }

    /// Attaches a reply address.
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}
