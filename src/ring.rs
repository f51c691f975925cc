use crate::error::Error;
use log::trace;
use std::io::{self, Read, Write};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Chunk size used by [`ByteRing::ingest_from`] when pulling from a source.
const INGEST_CHUNK: usize = 256;

/// Cyclic buffer over the most recently written bytes.
///
/// A `ByteRing` owns a fixed block of storage and behaves as an unbounded
/// append sink backed by it: writes always succeed, and once more than
/// `capacity` bytes have been written the oldest bytes are silently evicted.
/// Reads reconstruct chronological order even when the retained bytes wrap
/// around the end of physical storage.
///
/// All methods take `&self`; a per-instance reader/writer lock serializes
/// mutation against reads, so a `ByteRing` can be shared across threads
/// behind an `Arc`.
#[derive(Debug)]
pub struct ByteRing {
    capacity: usize,
    state: RwLock<RingState>,
}

/// Buffer contents and window position, guarded by the ring's lock.
///
/// `head` is the physical index of the oldest retained byte and `len` the
/// count of valid bytes. The next write lands at `(head + len) % capacity`;
/// the buffer is full exactly when `len == capacity`.
#[derive(Debug)]
struct RingState {
    buf: Vec<u8>,
    head: usize,
    len: usize,
}

impl ByteRing {
    /// Creates a ring with `capacity` bytes of zero-filled backing storage.
    ///
    /// The storage is allocated once and never resized. Fails with
    /// [`Error::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            state: RwLock::new(RingState {
                buf: vec![0; capacity],
                head: 0,
                len: 0,
            }),
        })
    }

    /// Returns the fixed capacity of the ring.
    ///
    /// Capacity is immutable after construction, so no lock is taken.
    pub fn size(&self) -> usize {
        self.capacity
    }

    /// Returns the number of valid bytes currently retained.
    ///
    /// Once `size()` bytes have been written this stays equal to `size()`.
    pub fn available(&self) -> usize {
        self.read_state().len
    }

    /// Appends `data`, evicting the oldest bytes once the ring is full.
    ///
    /// This never fails and always reports writing `data.len()` bytes:
    /// overflow is the defining behavior of the ring, not an error. When
    /// `data.len() >= size()` the entire contents are replaced by the last
    /// `size()` bytes of `data`; everything previously held, plus the
    /// leading excess of `data`, is discarded.
    pub fn append(&self, data: &[u8]) -> usize {
        self.write_state().push(data);
        data.len()
    }

    /// Logically empties the ring.
    ///
    /// Stale bytes remain in physical storage but fall outside the valid
    /// range; `available()` is zero afterwards.
    pub fn reset(&self) {
        let mut state = self.write_state();
        state.head = 0;
        state.len = 0;
    }

    /// Writes all retained bytes, oldest first, into `sink`.
    ///
    /// Returns the number of bytes the sink accepted. When the sink fails,
    /// the error carries that count alongside the underlying cause and the
    /// wrapped remainder is not attempted. The read guard is held across
    /// the sink calls, so a slow sink stalls concurrent writers.
    pub fn drain_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<usize, Error> {
        let state = self.read_state();
        let (first, second) = state.segments();

        let (mut total, err) = pour(sink, first);
        if let Some(source) = err {
            return Err(Error::Sink { written: total, source });
        }
        let (n, err) = pour(sink, second);
        total += n;
        if let Some(source) = err {
            return Err(Error::Sink { written: total, source });
        }
        trace!("drained {} bytes to sink", total);
        Ok(total)
    }

    /// Reads `source` to end-of-input, appending each chunk to the ring.
    ///
    /// Chunks of up to 256 bytes are read and appended one at a time; the
    /// write lock is taken per chunk, so a long ingestion interleaves with
    /// other threads rather than blocking them for the whole stream.
    /// Returns the total number of bytes ingested on a clean end of input.
    /// Any read error other than [`io::ErrorKind::Interrupted`] aborts the
    /// loop; chunks already appended stay in the ring.
    pub fn ingest_from<R: Read + ?Sized>(&self, source: &mut R) -> Result<usize, Error> {
        let mut chunk = [0u8; INGEST_CHUNK];
        let mut total = 0;
        loop {
            match source.read(&mut chunk) {
                Ok(0) => {
                    trace!("ingested {} bytes from source", total);
                    return Ok(total);
                }
                Ok(n) => {
                    self.append(&chunk[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(Error::Source {
                        ingested: total,
                        source,
                    })
                }
            }
        }
    }

    /// Copies the most recent bytes into `dest`, in chronological order.
    ///
    /// Fills `dest` with the last `min(dest.len(), available())` bytes and
    /// returns that count. The window matches the suffix a full drain would
    /// produce: `tail` is [`read_at`](Self::read_at) at offset
    /// `available() - k`.
    pub fn tail(&self, dest: &mut [u8]) -> usize {
        let state = self.read_state();
        let want = dest.len().min(state.len);
        state.copy_range(state.len - want, &mut dest[..want]);
        want
    }

    /// Copies retained bytes starting `offset` bytes past the oldest one.
    ///
    /// Offset `0` addresses the oldest retained byte, independent of where
    /// it sits physically. Returns the number of bytes copied:
    /// `min(dest.len(), available() - offset)`, or `0` when `offset` is at
    /// or past the end of the valid range. Out-of-range requests degrade to
    /// partial or empty copies, never an out-of-bounds access.
    pub fn read_at(&self, dest: &mut [u8], offset: usize) -> usize {
        let state = self.read_state();
        if offset >= state.len {
            return 0;
        }
        let want = dest.len().min(state.len - offset);
        state.copy_range(offset, &mut dest[..want]);
        want
    }

    // A poisoned guard cannot expose a torn window: every mutation either
    // completes or panics before it touches RingState, so the inner value
    // is recovered instead of propagating the poison.
    fn read_state(&self) -> RwLockReadGuard<'_, RingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RingState {
    /// Valid bytes as up to two physical slices in chronological order.
    ///
    /// The second slice is empty unless the window wraps around the end of
    /// storage.
    fn segments(&self) -> (&[u8], &[u8]) {
        let cap = self.buf.len();
        if self.len <= cap - self.head {
            (&self.buf[self.head..self.head + self.len], &[])
        } else {
            let split = cap - self.head;
            (&self.buf[self.head..], &self.buf[..self.len - split])
        }
    }

    /// Writes `data` at the window's tail, advancing `head` past however
    /// many of the oldest bytes get overwritten.
    fn push(&mut self, data: &[u8]) {
        let cap = self.buf.len();
        let n = data.len();
        if n == 0 {
            return;
        }

        // An input at least as large as the storage replaces everything;
        // only its last `cap` bytes survive.
        if n >= cap {
            self.buf.copy_from_slice(&data[n - cap..]);
            self.head = 0;
            self.len = cap;
            return;
        }

        let tail = (self.head + self.len) % cap;
        let room = cap - tail;
        if room >= n {
            self.buf[tail..tail + n].copy_from_slice(data);
        } else {
            // Wraps: split the input at the physical end of storage.
            self.buf[tail..].copy_from_slice(&data[..room]);
            self.buf[..n - room].copy_from_slice(&data[room..]);
        }

        let evicted = (self.len + n).saturating_sub(cap);
        if evicted > 0 {
            self.head = (self.head + evicted) % cap;
        }
        self.len = (self.len + n).min(cap);
    }

    /// Copies `dest.len()` valid bytes starting at logical `offset`.
    ///
    /// Callers clamp `dest` so that `offset + dest.len() <= self.len`.
    fn copy_range(&self, offset: usize, dest: &mut [u8]) {
        let (first, second) = self.segments();
        let mut copied = 0;
        if offset < first.len() {
            let take = (first.len() - offset).min(dest.len());
            dest[..take].copy_from_slice(&first[offset..offset + take]);
            copied = take;
        }
        if copied < dest.len() {
            // Continue from wherever the request lands in the wrapped part.
            let start = offset.saturating_sub(first.len());
            let end = start + dest.len() - copied;
            dest[copied..].copy_from_slice(&second[start..end]);
        }
    }
}

/// Feeds `data` into `sink`, retrying interrupted and short writes.
///
/// Returns the bytes the sink accepted together with the failure, if any,
/// so partial progress is never lost to the caller.
fn pour<W: Write + ?Sized>(sink: &mut W, data: &[u8]) -> (usize, Option<io::Error>) {
    let mut written = 0;
    while written < data.len() {
        match sink.write(&data[written..]) {
            Ok(0) => {
                let err = io::Error::new(
                    io::ErrorKind::WriteZero,
                    "sink refused additional bytes",
                );
                return (written, Some(err));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (written, Some(e)),
        }
    }
    (written, None)
}
