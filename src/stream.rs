//! # Chunk Streaming Module
//!
//! Channel-backed body streaming used by the render coordinator and the
//! Fetch-style response type.
//!
//! ## Overview
//!
//! A streaming response body is produced incrementally by a renderer coroutine
//! and consumed by the transport layer as chunks become available. The two
//! halves are connected by an mpsc channel:
//!
//! - [`ChunkSender`] - producer side, held by the renderer
//! - [`ChunkReceiver`] - consumer side, drained by the transport
//! - [`channel()`] - creates a connected pair
//!
//! ## Disconnect Semantics
//!
//! A client disconnect drops the receiver. Further sends become no-ops rather
//! than errors: the renderer keeps running to completion without crashing the
//! process, and its writes land nowhere. This is the write-after-close
//! contract the coordinator relies on.
//!
//! ## Usage
//!
//! ```rust
//! use fngate::stream;
//!
//! let (tx, rx) = stream::channel();
//! tx.send(b"<html>".to_vec());
//! tx.send(b"</html>".to_vec());
//! drop(tx);
//!
//! let body = rx.collect();
//! assert_eq!(body, b"<html></html>");
//! ```

use may::sync::mpsc;

/// Producer half of a body stream.
///
/// Clone this to send chunks from multiple coroutines.
#[derive(Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChunkSender {
    /// Send one chunk. A send after the receiver is gone is a no-op.
    pub fn send(&self, chunk: impl Into<Vec<u8>>) {
        let _ = self.tx.send(chunk.into());
    }
}

/// Consumer half of a body stream.
pub struct ChunkReceiver {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChunkReceiver {
    /// Block for the next chunk, or `None` once all senders are dropped.
    pub fn recv(&self) -> Option<Vec<u8>> {
        self.rx.recv().ok()
    }

    /// Drain the whole stream into a single buffer.
    ///
    /// Used for crawler requests, where the complete document must be
    /// assembled before anything is sent.
    pub fn collect(self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(chunk) = self.rx.recv() {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

/// Create a new body stream returning the sender and receiver halves.
pub fn channel() -> (ChunkSender, ChunkReceiver) {
    let (tx, rx) = mpsc::channel();
    (ChunkSender { tx }, ChunkReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_concatenates_chunks() {
        let (tx, rx) = channel();
        tx.send(b"a".to_vec());
        tx.send(b"bc".to_vec());
        drop(tx);
        assert_eq!(rx.collect(), b"abc");
    }

    #[test]
    fn test_send_after_receiver_dropped_is_noop() {
        let (tx, rx) = channel();
        drop(rx);
        tx.send(b"lost".to_vec());
    }
}
