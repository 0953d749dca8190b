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

//! Postcard serializer implementation.
//!
//! Postcard is not self-describing, so a dynamic structured value cannot be
//! handed to it directly. Values are first lowered into [`WireValue`], an
//! explicitly tagged mirror of the structured-value model, and raised back
//! after decoding.

use crate::serialization::{DeserializationError, SerializationError, Serializer};
use serde::de::{
    self, DeserializeSeed, EnumAccess, SeqAccess, Unexpected, VariantAccess, Visitor,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Deepest sequence or map nesting accepted from the wire, the same limit
/// `serde_json` applies.
const MAX_DEPTH: usize = 128;

/// Tagged mirror of the structured-value model used on the postcard wire.
///
/// Encoding is derived. Decoding goes through [`WireSeed`] so nesting depth
/// is bounded before anything recurses.
#[derive(Debug, Clone, PartialEq, Serialize)]
enum WireValue {
    Null,
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    String(String),
    Seq(Vec<WireValue>),
    Map(Vec<(String, WireValue)>),
}

impl WireValue {
    fn lower(value: &Value) -> Result<Self, SerializationError> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Self::Unsigned(u)
                } else if let Some(i) = n.as_i64() {
                    Self::Signed(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    return Err(SerializationError::new(format!(
                        "number {} has no postcard representation",
                        n
                    )));
                }
            }
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Seq(
                items
                    .iter()
                    .map(Self::lower)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Self::lower(v)?)))
                    .collect::<Result<Vec<_>, SerializationError>>()?,
            ),
        })
    }

    fn raise(self) -> Result<Value, DeserializationError> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Unsigned(u) => Value::Number(u.into()),
            Self::Signed(i) => Value::Number(i.into()),
            Self::Float(f) => Number::from_f64(f).map(Value::Number).ok_or_else(|| {
                DeserializationError::new(format!("non-finite float {} on the wire", f))
            })?,
            Self::String(s) => Value::String(s),
            Self::Seq(items) => Value::Array(
                items
                    .into_iter()
                    .map(Self::raise)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Self::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    map.insert(k, v.raise()?);
                }
                Value::Object(map)
            }
        })
    }
}

const VARIANTS: &[&str] = &[
    "Null", "Bool", "Unsigned", "Signed", "Float", "String", "Seq", "Map",
];

/// Decodes one [`WireValue`] found `depth` containers deep.
#[derive(Clone, Copy)]
struct WireSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for WireSeed {
    type Value = WireValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<WireValue, D::Error> {
        deserializer.deserialize_enum("WireValue", VARIANTS, self)
    }
}

impl<'de> Visitor<'de> for WireSeed {
    type Value = WireValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a tagged structured value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<WireValue, A::Error> {
        let (tag, variant) = data.variant::<u32>()?;
        match tag {
            0 => variant.unit_variant().map(|()| WireValue::Null),
            1 => variant.newtype_variant().map(WireValue::Bool),
            2 => variant.newtype_variant().map(WireValue::Unsigned),
            3 => variant.newtype_variant().map(WireValue::Signed),
            4 => variant.newtype_variant().map(WireValue::Float),
            5 => variant.newtype_variant().map(WireValue::String),
            6 | 7 => {
                if self.depth >= MAX_DEPTH {
                    return Err(de::Error::custom(format!(
                        "value nested deeper than {}",
                        MAX_DEPTH
                    )));
                }
                variant.newtype_variant_seed(Container {
                    depth: self.depth + 1,
                    map: tag == 7,
                })
            }
            other => Err(de::Error::invalid_value(
                Unexpected::Unsigned(other.into()),
                &self,
            )),
        }
    }
}

/// Decodes the body of a `Seq` or `Map` whose elements sit at `depth`.
struct Container {
    depth: usize,
    map: bool,
}

impl<'de> DeserializeSeed<'de> for Container {
    type Value = WireValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<WireValue, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for Container {
    type Value = WireValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.map { "a map body" } else { "a sequence body" })
    }

    // Lengths come from the peer, so nothing is preallocated from them.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WireValue, A::Error> {
        let element = WireSeed { depth: self.depth };
        if self.map {
            let mut entries = Vec::new();
            while let Some(entry) = seq.next_element_seed(Entry(element))? {
                entries.push(entry);
            }
            Ok(WireValue::Map(entries))
        } else {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element_seed(element)? {
                items.push(item);
            }
            Ok(WireValue::Seq(items))
        }
    }
}

/// One `(key, value)` pair of a map body.
struct Entry(WireSeed);

impl<'de> DeserializeSeed<'de> for Entry {
    type Value = (String, WireValue);

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_tuple(2, self)
    }
}

impl<'de> Visitor<'de> for Entry {
    type Value = (String, WireValue);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map entry")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let key = seq
            .next_element::<String>()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let value = seq
            .next_element_seed(self.0)?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        Ok((key, value))
    }
}

/// Top-level entry point for `postcard::from_bytes`.
struct Decoded(WireValue);

impl<'de> Deserialize<'de> for Decoded {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireSeed { depth: 0 }.deserialize(deserializer).map(Decoded)
    }
}

/// Compact binary serializer built on postcard.
///
/// Useful when both peers are Rust processes and payload size matters more
/// than human readability.
///
/// # Examples
///
/// ```rust
/// use arpc::serialization::{PostcardSerializer, Serializer};
/// use serde_json::json;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let serializer = PostcardSerializer::new().with_max_size(64 * 1024);
/// let value = json!({"args": [2, 3], "kwargs": {}});
/// let bytes = serializer.dumps(&value)?;
/// assert_eq!(serializer.loads(&bytes)?, value);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct PostcardSerializer {
    max_size: Option<usize>,
}

impl PostcardSerializer {
    /// Creates a new postcard serializer with no size limit.
    pub fn new() -> Self {
        Self { max_size: None }
    }

    /// Rejects payloads larger than `max_size` bytes in both directions.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

impl Serializer for PostcardSerializer {
    fn dumps(&self, value: &Value) -> Result<Vec<u8>, SerializationError> {
        let bytes = postcard::to_allocvec(&WireValue::lower(value)?)?;
        if let Some(max_size) = self.max_size {
            if bytes.len() > max_size {
                return Err(SerializationError::new(format!(
                    "Serialized size {} exceeds maximum {}",
                    bytes.len(),
                    max_size
                )));
            }
        }
        Ok(bytes)
    }

    fn loads(&self, bytes: &[u8]) -> Result<Value, DeserializationError> {
        if let Some(max_size) = self.max_size {
            if bytes.len() > max_size {
                return Err(DeserializationError::new(format!(
                    "Input size {} exceeds maximum {}",
                    bytes.len(),
                    max_size
                )));
            }
        }
        let Decoded(wire) = postcard::from_bytes(bytes)?;
        wire.raise()
    }

    fn name(&self) -> &'static str {
        "postcard"
    }
}
