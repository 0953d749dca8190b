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

//! The call multiplexer.
//!
//! This module turns a frame transport into a concurrent request/response
//! system. Its pieces, leaves first:
//!
//! - [`CorrelationIdGenerator`]: per-connection, monotonically increasing ids
//! - [`PendingCalls`]: the table of calls awaiting a response, the one piece
//!   of state shared between callers, deadlines and the receive loop
//! - [`PendingCall`]: the caller's future, carrying its own deadline
//! - [`Connection`]: the bound transport plus the receive loop that routes
//!   responses to pending calls and requests to registered methods
//!
//! # Call lifecycle
//!
//! ```text
//! Created -> Sent -> Success | ApplicationError | TimedOut | Cancelled | ConnectionFailed
//! ```
//!
//! Leaving `Sent` is a single removal from the pending table, so exactly one
//! of the racing outcomes wins and the rest are no-ops. A response whose call
//! already settled is logged and dropped.
//!
//! # Inbound routing
//!
//! - Responses settle the matching pending call.
//! - Requests for unknown methods are answered with "method not found" right
//!   away; known methods run on their own task so a slow handler never
//!   stalls the loop, and their responses may go out in any order.
//! - Notifications run the same way but are never answered, not even on
//!   failure; handler errors are logged instead.
//!
//! A frame that cannot be deserialized or decoded ends the connection.

mod call;
mod connection;
mod id;
mod pending;

pub use self::call::{CancelHandle, PendingCall};
pub use self::connection::{
    Connection, ConnectionOptions, ConnectionState, Direction, TraceHook,
};
pub use self::id::CorrelationIdGenerator;
pub use self::pending::{CallResult, PendingCalls, Resolution};
