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

//! Transport layer abstractions.
//!
//! A transport moves whole byte frames between peers. It knows nothing about
//! messages, ids or methods; the [`dispatcher`](crate::dispatcher) layers all
//! of that on top. Every transport splits into a shared [`FrameSink`] and a
//! single [`FrameSource`] owned by the connection's receive loop.
//!
//! Built-in implementations:
//!
//! - [`MemoryTransport`]: in-process queue pair (loopback)
//! - [`MemoryBus`]: in-process subjects with implicit reply inboxes
//! - [`TcpTransport`]: length-prefixed frames over TCP (requires `tcp` feature)
//!
//! # Addressing
//!
//! Point-to-point transports ignore the `destination` argument of
//! [`FrameSink::send`]; the reply path is the connection itself. Bus-style
//! transports stamp each outbound frame with the sender's own subject, and
//! the receiving side answers on the [`Frame::reply_to`] it was handed.
//!
//! # Examples
//!
//! ```rust
//! use arpc::transport::{MemoryTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, server) = MemoryTransport::pair(1024);
//! let (client_sink, _) = Box::new(client).split();
//! let (_, mut server_source) = Box::new(server).split();
//!
//! client_sink.send(b"Hello".to_vec(), None).await?;
//! let frame = server_source.recv().await.unwrap()?;
//! assert_eq!(frame.payload, b"Hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All transport operations return [`TransportError`]:
//!
//! ```rust,no_run
//! # #[cfg(feature = "tcp")]
//! # async fn example() {
//! use arpc::transport::{TcpTransport, TransportError};
//!
//! match TcpTransport::connect("127.0.0.1:1").await {
//!     Ok(_transport) => println!("Connected"),
//!     Err(TransportError::ConnectionFailed { address, source }) => {
//!         eprintln!("Failed to connect to {}: {}", address, source);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # }
//! ```

mod bus;
mod error;
pub mod framing;
mod memory;
#[cfg(feature = "tcp")]
mod tcp;
mod traits;
mod types;

pub use self::bus::{BusTransport, INBOX_PREFIX, MemoryBus};
pub use self::error::TransportError;
pub use self::memory::MemoryTransport;
#[cfg(feature = "tcp")]
pub use self::tcp::{TcpTransport, TcpTransportListener};
pub use self::traits::{FrameSink, FrameSource, Transport, TransportListener};
pub use self::types::{Frame, TransportId, TransportMetadata};
