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

//! Length-prefixed framing for stream transports.
//!
//! Stream sockets have no message boundaries, so every frame is written as
//!
//! ```text
//! [length: u32 big-endian][payload: length bytes]
//! ```
//!
//! and read back whole. This is what gives stream transports the
//! frame-integrity guarantee that datagram-style transports get for free.

use crate::transport::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default maximum frame size (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Size of the length prefix in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Writes one length-prefixed frame and flushes it.
///
/// # Errors
///
/// Returns [`TransportError::FrameTooLarge`] without writing anything if
/// the payload exceeds `max_size`, or [`TransportError::WriteFailed`] on
/// I/O failure.
pub async fn write_frame<W>(
    writer: &mut W,
    payload: &[u8],
    max_size: usize,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let len = payload.len();
    if len > max_size || len > u32::MAX as usize {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max: max_size,
        });
    }

    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + len);
    buf.extend_from_slice(&(len as u32).to_be_bytes());
    buf.extend_from_slice(payload);

    writer
        .write_all(&buf)
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;
    writer
        .flush()
        .await
        .map_err(|source| TransportError::WriteFailed { source })
}

/// Reads one length-prefixed frame.
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
///
/// # Errors
///
/// Returns [`TransportError::FrameTooLarge`] if the announced length exceeds
/// `max_size`, or [`TransportError::ReadFailed`] if the stream ends in the
/// middle of a frame or fails.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; FRAME_HEADER_SIZE];
    let mut filled = 0;
    while filled < FRAME_HEADER_SIZE {
        let n = reader
            .read(&mut len_bytes[filled..])
            .await
            .map_err(|source| TransportError::ReadFailed { source })?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(TransportError::ReadFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream ended inside a frame header",
                ),
            });
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > max_size {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max: max_size,
        });
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|source| TransportError::ReadFailed { source })?;
    Ok(Some(payload))
}
