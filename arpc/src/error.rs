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

//! Top-level error type.
//!
//! [`RpcError`] is what a caller sees when a call does not produce a
//! result. The variants follow the layers a call passes through:
//!
//! 1. **Protocol / Serialization**: the message could not be encoded or the
//!    reply could not be understood
//! 2. **Transport**: bytes could not be moved, or the connection went away
//! 3. **Application**: the remote handler answered with an error object
//! 4. **Timeout / Cancelled**: the call was abandoned locally
//!
//! Only transport failures affect other calls. An application error resolves
//! the single call it answers and leaves the connection untouched.
//!
//! # Examples
//!
//! ```rust
//! use arpc::RpcError;
//! use arpc::protocol::ErrorObject;
//! use arpc::transport::TransportError;
//!
//! let error: RpcError = TransportError::connection_lost("peer closed").into();
//! assert!(error.is_connection_fatal());
//!
//! let error = RpcError::Application(ErrorObject::method_not_found("nope"));
//! assert!(error.is_application_error());
//! assert_eq!(error.error_object().map(|e| e.code), Some(-32601));
//! ```

use crate::protocol::{ErrorObject, ProtocolError};
use crate::registry::RegistryError;
use crate::serialization::{DeserializationError, SerializationError};
use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by client calls and connection operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A message could not be expressed in the selected protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A structured value could not be serialized.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Bytes could not be deserialized.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    /// The transport failed, or the connection closed with the call pending.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote handler answered with an error.
    #[error("remote error: {0}")]
    Application(ErrorObject),

    /// No response arrived before the deadline.
    #[error("call to `{method}` timed out after {timeout:?}")]
    Timeout {
        /// Method that was called
        method: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// The caller cancelled the call.
    #[error("call to `{method}` was cancelled")]
    Cancelled {
        /// Method that was called
        method: String,
    },

    /// The configured protocol or serializer could not be resolved.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl RpcError {
    /// Returns `true` if the connection this error came from is unusable.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(self, RpcError::Transport(e) if e.is_disconnect())
    }

    /// Returns `true` if the remote handler answered with an error.
    pub fn is_application_error(&self) -> bool {
        matches!(self, RpcError::Application(_))
    }

    /// Returns `true` if the call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout { .. })
    }

    /// Returns `true` if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RpcError::Cancelled { .. })
    }

    /// Returns the remote error object of an application error.
    pub fn error_object(&self) -> Option<&ErrorObject> {
        match self {
            RpcError::Application(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ErrorObject> for RpcError {
    fn from(error: ErrorObject) -> Self {
        RpcError::Application(error)
    }
}

/// Result alias for RPC operations.
pub type Result<T, E = RpcError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_disconnect_is_fatal() {
        let error = RpcError::from(TransportError::Closed);
        assert!(error.is_connection_fatal());
        assert!(!error.is_application_error());
    }

    #[test]
    fn test_application_error_is_not_fatal() {
        let error = RpcError::from(ErrorObject::internal_error());
        assert!(!error.is_connection_fatal());
        assert!(error.is_application_error());
        assert_eq!(error.to_string(), "remote error: Internal error (code -32603)");
    }

    #[test]
    fn test_timeout_display() {
        let error = RpcError::Timeout {
            method: "slow".into(),
            timeout: Duration::from_millis(10),
        };
        assert!(error.is_timeout());
        assert_eq!(error.to_string(), "call to `slow` timed out after 10ms");
    }

    #[test]
    fn test_cancelled_predicate() {
        let error = RpcError::Cancelled {
            method: "m".into(),
        };
        assert!(error.is_cancelled());
        assert!(error.error_object().is_none());
    }
}
