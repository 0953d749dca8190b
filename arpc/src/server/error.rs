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

//! Server facade errors.

use crate::registry::RegistryError;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors raised while building or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A method name was registered twice.
    #[error("method `{name}` is already registered")]
    DuplicateMethod {
        /// The method name
        name: String,
    },

    /// The configured protocol or serializer could not be resolved.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Binding or accepting failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
