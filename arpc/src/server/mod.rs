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

//! Serving methods to a peer.
//!
//! A [`MethodRegistry`] maps method names to [`Handler`]s. Handlers either
//! take raw [`Params`](crate::protocol::Params) or a typed argument decoded
//! with serde, and fail with a [`HandlerError`] that carries the code,
//! message and data sent back to the caller. A panicking handler is answered
//! with an internal error instead of taking the connection down.
//!
//! [`Server`] wraps a registry with a codec and serializer chosen from the
//! configuration and binds it to transports, one
//! [`Connection`](crate::dispatcher::Connection) each.

mod builder;
mod error;
mod handler;
mod methods;

pub use self::builder::{Server, ServerBuilder};
pub use self::error::ServerError;
pub use self::handler::{
    FnHandler, Handler, HandlerError, HandlerFuture, TypedHandler, decode_params,
};
pub use self::methods::MethodRegistry;

pub use crate::dispatcher::{Direction, TraceHook};
