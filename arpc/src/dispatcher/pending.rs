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

//! The pending-call table.
//!
//! Every in-flight call has exactly one entry, keyed by correlation id. Four
//! parties race to settle an entry: the receive loop (a matching response),
//! the call's deadline, the caller (cancellation) and connection teardown.
//! Whoever removes the entry under the lock delivers the outcome; everyone
//! else finds nothing and does nothing. That single removal is the only
//! transition out of the in-flight state.

use crate::error::RpcError;
use crate::protocol::{ErrorObject, ProtocolError, RequestId};
use crate::transport::TransportError;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;

/// Outcome delivered to a waiting caller.
pub type CallResult = Result<Value, RpcError>;

/// How a pending call was settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A success response arrived.
    Success(Value),
    /// An error response arrived.
    Failed(ErrorObject),
    /// The deadline elapsed first.
    TimedOut(Duration),
    /// The caller gave up.
    Cancelled,
    /// The connection closed with the call outstanding.
    ConnectionFailed(String),
}

impl Resolution {
    fn into_result(self, method: String) -> CallResult {
        match self {
            Resolution::Success(value) => Ok(value),
            Resolution::Failed(error) => Err(RpcError::Application(error)),
            Resolution::TimedOut(timeout) => Err(RpcError::Timeout { method, timeout }),
            Resolution::Cancelled => Err(RpcError::Cancelled { method }),
            Resolution::ConnectionFailed(reason) => {
                Err(RpcError::Transport(TransportError::connection_lost(reason)))
            }
        }
    }
}

struct Entry {
    method: String,
    tx: oneshot::Sender<CallResult>,
}

#[derive(Default)]
struct Table {
    calls: HashMap<RequestId, Entry>,
    closed: Option<String>,
}

/// Calls awaiting a response on one connection.
///
/// # Example
///
/// ```rust
/// use arpc::dispatcher::{PendingCalls, Resolution};
/// use arpc::protocol::RequestId;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pending = PendingCalls::new();
/// let rx = pending.register(RequestId::Number(1), "add")?;
///
/// assert!(pending.resolve(&RequestId::Number(1), Resolution::Success(json!(5))));
/// assert!(!pending.resolve(&RequestId::Number(1), Resolution::Cancelled));
///
/// assert_eq!(rx.await?.unwrap(), json!(5));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct PendingCalls {
    table: Mutex<Table>,
}

impl PendingCalls {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a call and returns the receiver its outcome is delivered on.
    ///
    /// # Errors
    ///
    /// Fails with a connection-lost error once the table has been drained,
    /// or with a protocol error if `id` is already in flight.
    pub fn register(
        &self,
        id: RequestId,
        method: &str,
    ) -> Result<oneshot::Receiver<CallResult>, RpcError> {
        let mut table = self.table.lock();
        if let Some(reason) = &table.closed {
            return Err(RpcError::Transport(TransportError::connection_lost(
                reason.clone(),
            )));
        }
        if table.calls.contains_key(&id) {
            return Err(RpcError::Protocol(ProtocolError::invalid(
                "id",
                format!("{} is already in flight", id),
            )));
        }
        let (tx, rx) = oneshot::channel();
        table.calls.insert(
            id,
            Entry {
                method: method.to_string(),
                tx,
            },
        );
        Ok(rx)
    }

    /// Settles the call `id` if it is still pending.
    ///
    /// Returns `false` if the call was already settled or never existed.
    pub fn resolve(&self, id: &RequestId, resolution: Resolution) -> bool {
        let entry = self.table.lock().calls.remove(id);
        match entry {
            Some(entry) => {
                // The caller may have stopped listening; the call still counts as settled.
                let _ = entry.tx.send(resolution.into_result(entry.method));
                true
            }
            None => false,
        }
    }

    /// Removes a call without delivering anything.
    pub(crate) fn discard(&self, id: &RequestId) {
        self.table.lock().calls.remove(id);
    }

    /// Fails every pending call with a connection-lost error and refuses new
    /// registrations from now on. Returns how many calls were failed.
    pub fn drain(&self, reason: &str) -> usize {
        let calls = {
            let mut table = self.table.lock();
            table.closed.get_or_insert_with(|| reason.to_string());
            std::mem::take(&mut table.calls)
        };
        let count = calls.len();
        for (_, entry) in calls {
            let _ = entry.tx.send(
                Resolution::ConnectionFailed(reason.to_string()).into_result(entry.method),
            );
        }
        count
    }

    /// Returns `true` if `id` is still pending.
    pub fn contains(&self, id: &RequestId) -> bool {
        self.table.lock().calls.contains_key(id)
    }

    /// Number of pending calls.
    pub fn len(&self) -> usize {
        self.table.lock().calls.len()
    }

    /// Returns `true` if no calls are pending.
    pub fn is_empty(&self) -> bool {
        self.table.lock().calls.is_empty()
    }

    /// Returns `true` once the table has been drained.
    pub fn is_closed(&self) -> bool {
        self.table.lock().closed.is_some()
    }
}
