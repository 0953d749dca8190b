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

//! JSON serializer implementation.

use crate::serialization::{DeserializationError, SerializationError, Serializer};
use serde_json::Value;

/// JSON serializer.
///
/// The default serializer of the crate and the natural companion of the
/// JSON-RPC protocol codec. Output is compact unless pretty printing is
/// requested, which is mostly useful when tracing wire traffic by hand.
///
/// # Examples
///
/// ```rust
/// use arpc::serialization::{JsonSerializer, Serializer};
/// use serde_json::json;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let serializer = JsonSerializer::new();
/// let bytes = serializer.dumps(&json!({"jsonrpc": "2.0", "result": 5, "id": 1}))?;
/// assert_eq!(bytes, br#"{"id":1,"jsonrpc":"2.0","result":5}"#);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Creates a new JSON serializer producing compact output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Configures the serializer to produce pretty-printed JSON.
    pub fn with_pretty_print(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Serializer for JsonSerializer {
    fn dumps(&self, value: &Value) -> Result<Vec<u8>, SerializationError> {
        if self.pretty {
            serde_json::to_vec_pretty(value).map_err(Into::into)
        } else {
            serde_json::to_vec(value).map_err(Into::into)
        }
    }

    fn loads(&self, bytes: &[u8]) -> Result<Value, DeserializationError> {
        serde_json::from_slice(bytes).map_err(Into::into)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
