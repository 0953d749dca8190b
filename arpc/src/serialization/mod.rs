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

//! Structured value to byte payload conversion.
//!
//! A [`Serializer`] sits between the protocol codec, which speaks in
//! structured values ([`serde_json::Value`]), and the transport, which only
//! moves byte frames. Built-in serializers:
//!
//! | Name       | Type                   | Feature    |
//! |------------|------------------------|------------|
//! | `json`     | [`JsonSerializer`]     | `json`     |
//! | `postcard` | [`PostcardSerializer`] | `postcard` |

mod error;
mod traits;

#[cfg(feature = "json")]
mod json;
#[cfg(feature = "postcard")]
mod postcard;

pub use self::error::{DeserializationError, SerializationError};
pub use self::traits::{Serializer, SerializerTrust};

#[cfg(feature = "json")]
pub use self::json::JsonSerializer;
#[cfg(feature = "postcard")]
pub use self::postcard::PostcardSerializer;
