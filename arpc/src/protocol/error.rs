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

//! Protocol envelope errors.

use crate::protocol::ErrorObject;
use thiserror::Error;

/// A structured value is not a valid envelope for the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The top-level value is not a map.
    #[error("message must be an object, found {found}")]
    NotAnObject {
        /// Kind of value that was found
        found: &'static str,
    },

    /// A top-level key the envelope does not allow.
    #[error("key not allowed: {key}")]
    UnexpectedKey {
        /// The offending key
        key: String,
    },

    /// The version marker is missing or wrong.
    #[error("wrong or missing {field} version: expected {expected:?}, found {found}")]
    VersionMismatch {
        /// Name of the version field
        field: &'static str,
        /// Version this codec speaks
        expected: &'static str,
        /// What was found instead
        found: String,
    },

    /// A required field is missing.
    #[error("missing field `{field}`")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// A field has the wrong shape.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Name of the field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A response carries both or neither of `result` and `error`.
    #[error("response must carry exactly one of `result` and `error`")]
    AmbiguousResponse,

    /// Positional and keyword parameters in a protocol that allows only one.
    #[error("positional and keyword parameters cannot be combined")]
    MixedParams,
}

impl ProtocolError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Maps this error to the error payload sent back to the peer.
    pub fn error_object(&self) -> ErrorObject {
        match self {
            ProtocolError::MixedParams => ErrorObject::invalid_params(self.to_string()),
            ProtocolError::InvalidField {
                field: "params" | "args" | "kwargs",
                ..
            } => ErrorObject::invalid_params(self.to_string()),
            _ => ErrorObject::invalid_request(self.to_string()),
        }
    }
}
