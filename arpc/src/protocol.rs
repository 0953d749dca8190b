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

//! Protocol abstraction: the message model and the codecs that map it onto
//! wire envelopes.
//!
//! Every message is one of three kinds:
//!
//! - [`Request`]: a call carrying a correlation id, answered by exactly one
//!   [`Response`]
//! - [`Notification`]: a call without an id, never answered
//! - [`Response`]: either a result value or an [`ErrorObject`]
//!
//! A [`ProtocolCodec`] converts these to and from structured values. Two
//! codecs are built in:
//!
//! - [`JsonRpcCodec`]: JSON-RPC 2.0
//! - [`ArpcCodec`]: the native envelope, which carries positional and keyword
//!   arguments together and keeps handler-side error origins
//!
//! Both validate strictly. An envelope with unknown keys, a wrong version
//! marker, a non-string method, a malformed id or an ambiguous response is
//! rejected with a [`ProtocolError`].

mod arpc;
mod codec;
mod error;
mod jsonrpc;
mod message;

pub use self::arpc::{ARPC_VERSION, ArpcCodec};
pub use self::codec::ProtocolCodec;
pub use self::error::ProtocolError;
pub use self::jsonrpc::{JSON_RPC_VERSION, JsonRpcCodec};
pub use self::message::{
    ErrorObject, ErrorOrigin, Message, Notification, Params, Request, RequestId, Response, codes,
};
