// src/error.rs

use std::io;
use thiserror::Error;

/// Errors reported by [`ByteRing`](crate::ByteRing) operations.
///
/// Overflowing the buffer is deliberately absent from this list: writing
/// more bytes than the buffer can hold evicts the oldest bytes and is the
/// defining behavior of the type, not a failure.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested capacity was zero; a ring needs at least one byte of
    /// backing storage.
    #[error("buffer capacity must be greater than zero")]
    InvalidCapacity,
    /// The sink passed to [`drain_to`](crate::ByteRing::drain_to) failed.
    /// `written` counts the bytes the sink accepted before the failure.
    #[error("sink failed after accepting {written} bytes")]
    Sink {
        written: usize,
        #[source]
        source: io::Error,
    },
    /// The source passed to [`ingest_from`](crate::ByteRing::ingest_from)
    /// failed. `ingested` counts the bytes already appended to the buffer;
    /// they are not rolled back.
    #[error("source failed after producing {ingested} bytes")]
    Source {
        ingested: usize,
        #[source]
        source: io::Error,
    },
}
