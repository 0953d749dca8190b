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

//! Factory registry for protocol codecs and serializers.
//!
//! Connections depend only on [`ProtocolCodec`] and [`Serializer`]; which
//! concrete variant backs them is picked by key from a [`Registry`]. The
//! built-in keys are `"jsonrpc"` and `"arpc"` for protocols and `"json"`
//! and `"postcard"` for serializers.

use crate::config::RpcConfig;
use crate::protocol::{ArpcCodec, JsonRpcCodec, ProtocolCodec};
use crate::serialization::{Serializer, SerializerTrust};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// A key could not be resolved to a usable implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No protocol codec is registered under the key.
    #[error("unknown protocol `{0}`")]
    UnknownProtocol(String),

    /// No serializer is registered under the key.
    #[error("unknown serializer `{0}`")]
    UnknownSerializer(String),

    /// The serializer reconstructs object graphs and the configuration has
    /// not opted in.
    #[error("serializer `{0}` is not trusted; enable allow_untrusted_serializers to use it")]
    UntrustedSerializer(String),
}

/// Codec and serializer implementations keyed by name.
///
/// # Examples
///
/// ```rust
/// use arpc::config::RpcConfig;
/// use arpc::registry::Registry;
///
/// let registry = Registry::with_builtins();
/// let (codec, serializer) = registry
///     .build(&RpcConfig::new().with_protocol("arpc"))
///     .unwrap();
/// assert_eq!(codec.name(), "arpc");
/// assert_eq!(serializer.name(), "json");
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    protocols: HashMap<String, Arc<dyn ProtocolCodec>>,
    serializers: HashMap<String, Arc<dyn Serializer>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in codec and serializer.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_protocol(JsonRpcCodec);
        registry.register_protocol(ArpcCodec);
        #[cfg(feature = "json")]
        registry.register_serializer(crate::serialization::JsonSerializer::new());
        #[cfg(feature = "postcard")]
        registry.register_serializer(crate::serialization::PostcardSerializer::new());
        registry
    }

    /// Registers a codec under its [`name`](ProtocolCodec::name), replacing
    /// any previous entry.
    pub fn register_protocol(&mut self, codec: impl ProtocolCodec) -> &mut Self {
        self.protocols
            .insert(codec.name().to_string(), Arc::new(codec));
        self
    }

    /// Registers a serializer under its [`name`](Serializer::name),
    /// replacing any previous entry.
    pub fn register_serializer(&mut self, serializer: impl Serializer) -> &mut Self {
        self.serializers
            .insert(serializer.name().to_string(), Arc::new(serializer));
        self
    }

    /// Looks up a protocol codec.
    pub fn protocol(&self, key: &str) -> Result<Arc<dyn ProtocolCodec>, RegistryError> {
        self.protocols
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownProtocol(key.to_string()))
    }

    /// Looks up a serializer, refusing object-graph serializers unless
    /// `allow_untrusted` is set.
    pub fn serializer(
        &self,
        key: &str,
        allow_untrusted: bool,
    ) -> Result<Arc<dyn Serializer>, RegistryError> {
        let serializer = self
            .serializers
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSerializer(key.to_string()))?;
        if serializer.trust() == SerializerTrust::ObjectGraph && !allow_untrusted {
            return Err(RegistryError::UntrustedSerializer(key.to_string()));
        }
        Ok(serializer)
    }

    /// Resolves the codec and serializer named by `config`.
    pub fn build(
        &self,
        config: &RpcConfig,
    ) -> Result<(Arc<dyn ProtocolCodec>, Arc<dyn Serializer>), RegistryError> {
        let codec = self.protocol(&config.protocol)?;
        let serializer =
            self.serializer(&config.serializer, config.allow_untrusted_serializers)?;
        Ok((codec, serializer))
    }

    /// Registered protocol keys.
    pub fn protocols(&self) -> impl Iterator<Item = &str> {
        self.protocols.keys().map(String::as_str)
    }

    /// Registered serializer keys.
    pub fn serializers(&self) -> impl Iterator<Item = &str> {
        self.serializers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut protocols: Vec<_> = self.protocols().collect();
        let mut serializers: Vec<_> = self.serializers().collect();
        protocols.sort_unstable();
        serializers.sort_unstable();
        f.debug_struct("Registry")
            .field("protocols", &protocols)
            .field("serializers", &serializers)
            .finish()
    }
}
