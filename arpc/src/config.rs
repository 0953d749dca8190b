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

//! Client and server configuration.

use serde::Deserialize;
use std::time::Duration;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum frame size for stream transports (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Selects the protocol and serializer of a client or server and tunes the
/// connections it opens.
///
/// Deserializable from any serde format; durations are given in
/// milliseconds and `null` disables the default timeout.
///
/// # Examples
///
/// ```rust
/// use arpc::config::RpcConfig;
/// use std::time::Duration;
///
/// let config = RpcConfig::new()
///     .with_protocol("arpc")
///     .with_serializer("postcard")
///     .with_default_timeout(Some(Duration::from_secs(5)));
/// assert_eq!(config.protocol, "arpc");
///
/// let loaded: RpcConfig = serde_json::from_str(r#"{"default_timeout": 1500}"#).unwrap();
/// assert_eq!(loaded.default_timeout, Some(Duration::from_millis(1500)));
/// assert_eq!(loaded.serializer, "json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Registry key of the protocol codec.
    ///
    /// Default: `"jsonrpc"`
    pub protocol: String,

    /// Registry key of the serializer.
    ///
    /// Default: `"json"`
    pub serializer: String,

    /// Timeout applied to calls that do not set their own. `None` waits
    /// forever.
    ///
    /// Default: 30 seconds
    #[serde(with = "millis")]
    pub default_timeout: Option<Duration>,

    /// Largest frame a stream transport accepts or sends.
    ///
    /// Default: 16 MiB
    pub max_frame_size: u32,

    /// Allow serializers that reconstruct arbitrary object graphs.
    ///
    /// Default: false
    pub allow_untrusted_serializers: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            protocol: "jsonrpc".to_string(),
            serializer: "json".to_string(),
            default_timeout: Some(DEFAULT_TIMEOUT),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            allow_untrusted_serializers: false,
        }
    }
}

impl RpcConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the protocol key.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the serializer key.
    pub fn with_serializer(mut self, serializer: impl Into<String>) -> Self {
        self.serializer = serializer.into();
        self
    }

    /// Sets the default call timeout.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets the maximum frame size.
    pub fn with_max_frame_size(mut self, size: u32) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Opts in to object-graph serializers.
    pub fn with_untrusted_serializers(mut self, allow: bool) -> Self {
        self.allow_untrusted_serializers = allow;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = RpcConfig::default();
        assert_eq!(config.protocol, "jsonrpc");
        assert_eq!(config.serializer, "json");
        assert_eq!(config.default_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.max_frame_size, 16 * 1024 * 1024);
        assert!(!config.allow_untrusted_serializers);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RpcConfig = serde_json::from_value(json!({
            "protocol": "arpc",
            "max_frame_size": 1024,
        }))
        .unwrap();
        assert_eq!(config.protocol, "arpc");
        assert_eq!(config.serializer, "json");
        assert_eq!(config.max_frame_size, 1024);
        assert_eq!(config.default_timeout, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_null_timeout_disables_it() {
        let config: RpcConfig =
            serde_json::from_value(json!({"default_timeout": null})).unwrap();
        assert_eq!(config.default_timeout, None);
    }

    #[test]
    fn test_builders() {
        let config = RpcConfig::new()
            .with_serializer("postcard")
            .with_default_timeout(None)
            .with_untrusted_serializers(true);
        assert_eq!(config.serializer, "postcard");
        assert_eq!(config.default_timeout, None);
        assert!(config.allow_untrusted_serializers);
    }
}
