//! Fixed-capacity cyclic byte buffer.
//!
//! A [`ByteRing`] keeps the most recently written bytes in a fixed block of
//! storage, reusing the same allocation for the lifetime of the buffer.
//! Writes never fail: once the buffer is full, the oldest bytes are
//! silently evicted to make room, which makes the type a constant-memory
//! window over an unbounded byte stream (for example, the tail of a
//! process's recent output).
//!
//! Each buffer carries its own reader/writer lock, so it is safe to share
//! across threads.
//!
//! ```
//! use bytering::ByteRing;
//!
//! let ring = ByteRing::new(10)?;
//! ring.append(b"Tutaj");
//! ring.append(b"jest");
//! ring.append(b"tekst.");
//!
//! let mut dest = [0u8; 10];
//! ring.tail(&mut dest);
//! assert_eq!(&dest, b"jesttekst.");
//! # Ok::<(), bytering::Error>(())
//! ```

mod error;
mod ring;

pub use error::Error;
pub use ring::ByteRing;
