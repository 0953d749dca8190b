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

//! Serialization error types.
//!
//! Turning a structured value into bytes and turning bytes back into a
//! structured value fail in different places of the dispatcher: the first
//! fails a single outbound call, the second poisons the whole connection.
//! They are therefore kept as two distinct types over one shared detail.

use std::error::Error;
use std::fmt;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
struct Detail {
    message: String,
    source: Option<BoxError>,
}

impl Detail {
    fn new(message: String, source: Option<BoxError>) -> Self {
        Self { message, source }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, action: &str) -> fmt::Result {
        write!(f, "cannot {}: {}", action, self.message)?;
        match &self.source {
            Some(source) => write!(f, " ({})", source),
            None => Ok(()),
        }
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// A structured value could not be turned into a byte payload.
///
/// This only ever fails the call or response being encoded; the connection
/// stays usable.
///
/// # Examples
///
/// ```rust
/// use arpc::serialization::SerializationError;
///
/// let error = SerializationError::new("float is not finite");
/// assert_eq!(error.to_string(), "cannot encode payload: float is not finite");
/// ```
#[derive(Debug)]
pub struct SerializationError(Detail);

impl SerializationError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(Detail::new(message.into(), None))
    }

    /// Creates an error wrapping the format's own error.
    pub fn with_source(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        Self(Detail::new(message.into(), Some(Box::new(source))))
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write(f, "encode payload")
    }
}

impl Error for SerializationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// An inbound byte payload did not decode to a structured value, or a
/// structured value did not decode to the requested Rust type.
///
/// When this happens inside a connection's receive loop the connection can
/// no longer be trusted and is torn down.
///
/// # Examples
///
/// ```rust
/// use arpc::serialization::{JsonSerializer, Serializer};
///
/// let error = JsonSerializer::default().loads(b"{ not json").unwrap_err();
/// assert!(error.to_string().starts_with("cannot decode payload: invalid JSON"));
/// ```
#[derive(Debug)]
pub struct DeserializationError(Detail);

impl DeserializationError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(Detail::new(message.into(), None))
    }

    /// Creates an error wrapping the format's own error.
    pub fn with_source(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        Self(Detail::new(message.into(), Some(Box::new(source))))
    }
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write(f, "decode payload")
    }
}

impl Error for DeserializationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

// serde_json also lifts typed arguments into structured values, so these
// conversions do not depend on the `json` serializer feature.
impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("value has no JSON form", err)
    }
}

impl From<serde_json::Error> for DeserializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("invalid JSON", err)
    }
}

#[cfg(feature = "postcard")]
impl From<postcard::Error> for SerializationError {
    fn from(err: postcard::Error) -> Self {
        Self::with_source("postcard encoding failed", err)
    }
}

#[cfg(feature = "postcard")]
impl From<postcard::Error> for DeserializationError {
    fn from(err: postcard::Error) -> Self {
        Self::with_source("invalid postcard payload", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_only() {
        let error = SerializationError::new("number out of range");
        assert_eq!(error.to_string(), "cannot encode payload: number out of range");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_source_is_chained() {
        let error = SerializationError::with_source("write failed", std::io::Error::other("disk"));
        assert_eq!(error.to_string(), "cannot encode payload: write failed (disk)");
        assert_eq!(error.source().map(|s| s.to_string()), Some("disk".to_string()));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_slice::<serde_json::Value>(b"[1,").unwrap_err();
        let error = DeserializationError::from(json_err);
        assert!(error.to_string().starts_with("cannot decode payload: invalid JSON ("));
        assert!(error.source().is_some());
    }
}
