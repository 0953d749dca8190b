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

//! Transport layer error types.

use std::io;
use thiserror::Error;

/// Errors raised while moving byte frames between peers.
///
/// Transports never retry on their own. A send failure fails the single
/// call being sent; a receive failure ends the connection and every call
/// still waiting on it.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the remote endpoint.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The connection went away while calls were still outstanding.
    ///
    /// This is the error every pending call is resolved with when its
    /// connection is torn down.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
    },

    /// Failed to read a frame.
    #[error("read failed: {source}")]
    ReadFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to write a frame.
    #[error("write failed: {source}")]
    WriteFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A frame exceeded the configured maximum size.
    #[error("frame of {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge {
        /// Size of the offending frame
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// A bus-addressed frame had no subscriber to deliver it to.
    #[error("no subscriber for subject `{subject}`")]
    NoRoute {
        /// The subject the frame was published on
        subject: String,
    },

    /// A bus-addressed frame was sent without any destination.
    #[error("frame has no destination")]
    MissingDestination,

    /// Transport is already closed.
    #[error("transport is closed")]
    Closed,

    /// Failed to bind to the specified address.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        /// The address that failed to bind
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Convenience constructor for [`TransportError::ConnectionLost`].
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        TransportError::ConnectionLost {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error means the peer is gone for good.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arpc::transport::TransportError;
    ///
    /// assert!(TransportError::Closed.is_disconnect());
    /// assert!(!TransportError::MissingDestination.is_disconnect());
    /// ```
    pub fn is_disconnect(&self) -> bool {
        match self {
            TransportError::ConnectionLost { .. } | TransportError::Closed => true,
            TransportError::ReadFailed { source }
            | TransportError::WriteFailed { source }
            | TransportError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            ),
            TransportError::ConnectionFailed { .. }
            | TransportError::FrameTooLarge { .. }
            | TransportError::NoRoute { .. }
            | TransportError::MissingDestination
            | TransportError::BindFailed { .. } => false,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}
