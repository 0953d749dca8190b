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

//! The caller's side of an in-flight call.

use crate::dispatcher::pending::{CallResult, PendingCalls, Resolution};
use crate::error::RpcError;
use crate::protocol::RequestId;
use crate::transport::TransportError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// Future resolving to the outcome of one call.
///
/// The deadline is watched by its own task from the moment the call is
/// created, so a call that is never polled still times out on schedule and
/// leaves the pending table; a response arriving afterwards is discarded as
/// unknown. Dropping the future before it completes cancels the call.
///
/// # Example
///
/// ```rust,no_run
/// use arpc::dispatcher::Connection;
/// use arpc::protocol::Params;
/// use std::time::Duration;
///
/// # async fn example(connection: Connection) -> arpc::Result<()> {
/// let call = connection
///     .start_call("slow", Params::none(), Some(Duration::from_secs(1)))
///     .await?;
/// let cancel = call.cancel_handle();
/// cancel.cancel();
/// assert!(call.await.unwrap_err().is_cancelled());
/// # Ok(())
/// # }
/// ```
#[must_use = "a call is cancelled when its future is dropped"]
pub struct PendingCall {
    id: RequestId,
    rx: oneshot::Receiver<CallResult>,
    watcher: Option<AbortHandle>,
    pending: Weak<PendingCalls>,
    done: bool,
}

impl PendingCall {
    /// Must be called from within a Tokio runtime when `timeout` is set.
    pub(crate) fn new(
        id: RequestId,
        rx: oneshot::Receiver<CallResult>,
        timeout: Option<Duration>,
        pending: Weak<PendingCalls>,
    ) -> Self {
        let watcher = timeout.map(|timeout| {
            let id = id.clone();
            let pending = pending.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(pending) = pending.upgrade() {
                    pending.resolve(&id, Resolution::TimedOut(timeout));
                }
            })
            .abort_handle()
        });
        Self {
            id,
            rx,
            watcher,
            pending,
            done: false,
        }
    }

    /// Correlation id of this call.
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns a handle that cancels this call from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            id: self.id.clone(),
            pending: self.pending.clone(),
        }
    }

    /// Marks the call as settled without touching the pending table.
    pub(crate) fn disarm(&mut self) {
        self.done = true;
        self.stop_watcher();
    }

    fn stop_watcher(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

impl Future for PendingCall {
    type Output = CallResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let result = ready!(Pin::new(&mut this.rx).poll(cx));
        this.done = true;
        this.stop_watcher();
        Poll::Ready(result.unwrap_or_else(|_| {
            Err(RpcError::Transport(TransportError::connection_lost(
                "connection dropped",
            )))
        }))
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.stop_watcher();
        if !self.done {
            if let Some(pending) = self.pending.upgrade() {
                pending.resolve(&self.id, Resolution::Cancelled);
            }
        }
    }
}

/// Cancels a call from outside its future.
///
/// Cancellation is local only: the peer is not told, and a handler already
/// running on the other side keeps running.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    id: RequestId,
    pending: Weak<PendingCalls>,
}

impl CancelHandle {
    /// Cancels the call. Returns `false` if it had already settled.
    pub fn cancel(&self) -> bool {
        self.pending
            .upgrade()
            .is_some_and(|pending| pending.resolve(&self.id, Resolution::Cancelled))
    }

    /// Correlation id of the call this handle cancels.
    pub fn id(&self) -> &RequestId {
        &self.id
    }
}
