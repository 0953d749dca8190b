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

//! Serialization trait definitions.

use crate::serialization::{DeserializationError, SerializationError};
use serde_json::Value;

/// How much a serializer trusts the bytes it is handed.
///
/// Primitive serializers can only ever produce null, booleans, numbers,
/// strings, sequences and string-keyed maps. A serializer that rebuilds
/// arbitrary object graphs from bytes is a code-execution risk on untrusted
/// input, so the [`Registry`](crate::registry::Registry) refuses to hand one
/// out unless the configuration explicitly opts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializerTrust {
    /// Only the primitive structured-value model is produced.
    Primitive,
    /// Arbitrary object graphs may be reconstructed. Opt-in only.
    ObjectGraph,
}

/// Converts structured values to byte payloads and back.
///
/// Serializers are stateless and shared between every connection that
/// selects them, hence the `Send + Sync + 'static` bound. The trait is
/// object safe so connections can hold an `Arc<dyn Serializer>` chosen at
/// runtime.
///
/// # Examples
///
/// ## Using a serializer
///
/// ```rust
/// use arpc::serialization::{JsonSerializer, Serializer};
/// use serde_json::json;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let serializer = JsonSerializer::default();
/// let bytes = serializer.dumps(&json!({"method": "add", "params": [2, 3]}))?;
/// let value = serializer.loads(&bytes)?;
/// assert_eq!(value["params"][1], 3);
/// # Ok(())
/// # }
/// ```
///
/// ## Implementing a custom serializer
///
/// ```rust
/// use arpc::serialization::{DeserializationError, SerializationError, Serializer};
/// use serde_json::Value;
///
/// struct PrettyJson;
///
/// impl Serializer for PrettyJson {
///     fn dumps(&self, value: &Value) -> Result<Vec<u8>, SerializationError> {
///         serde_json::to_vec_pretty(value).map_err(Into::into)
///     }
///
///     fn loads(&self, bytes: &[u8]) -> Result<Value, DeserializationError> {
///         serde_json::from_slice(bytes).map_err(Into::into)
///     }
///
///     fn name(&self) -> &'static str {
///         "pretty-json"
///     }
/// }
/// ```
pub trait Serializer: Send + Sync + 'static {
    /// Serializes a structured value to bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializationError`] if the value cannot be represented
    /// in this format (for example a non-finite float).
    fn dumps(&self, value: &Value) -> Result<Vec<u8>, SerializationError>;

    /// Deserializes bytes to a structured value.
    ///
    /// # Errors
    ///
    /// Returns a [`DeserializationError`] if the bytes are not a valid
    /// encoding of a structured value.
    fn loads(&self, bytes: &[u8]) -> Result<Value, DeserializationError>;

    /// Returns the registry key of this serializer.
    fn name(&self) -> &'static str;

    /// Returns the trust level of this serializer.
    ///
    /// Defaults to [`SerializerTrust::Primitive`].
    fn trust(&self) -> SerializerTrust {
        SerializerTrust::Primitive
    }
}
