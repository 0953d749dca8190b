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

//! Correlation id generation.

use crate::protocol::RequestId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generates the correlation ids of one connection.
///
/// Ids start at 1 and increase monotonically, so an id is never reused while
/// the connection lives. Every connection owns its own generator; ids are
/// only unique per connection.
///
/// # Example
///
/// ```rust
/// use arpc::dispatcher::CorrelationIdGenerator;
/// use arpc::protocol::RequestId;
///
/// let generator = CorrelationIdGenerator::new();
/// assert_eq!(generator.next_id(), RequestId::Number(1));
/// assert_eq!(generator.next_id(), RequestId::Number(2));
/// ```
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next_id: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a new generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the next correlation id.
    #[must_use]
    pub fn next_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the id the next call to [`next_id`](Self::next_id) will hand out.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
