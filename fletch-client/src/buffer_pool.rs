//! Shared `BytesMut` buffer pool.
//!
//! Request bodies are encoded into pooled buffers and response bodies are
//! drained into them, so steady-state traffic does not allocate per request.
//!
//! The pool is process-wide and internally synchronized. Buffers are handed
//! out as [`PooledBuffer`] guards that return to the pool exactly once, when
//! dropped. A guard can be turned into [`Bytes`] with
//! [`PooledBuffer::into_bytes`]; the buffer then returns when the last clone
//! of those bytes is dropped.
//!
//! ```rust
//! use fletch_client::buffer_pool::{acquire_buffer, BufferSize};
//!
//! let mut buf = acquire_buffer(BufferSize::Small);
//! buf.extend_from_slice(b"hello");
//! let bytes = buf.into_bytes();
//! assert_eq!(&bytes[..], b"hello");
//! ```

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Buffer size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSize {
    /// 4 KB - small JSON and form bodies
    Small,
    /// 16 KB - typical bodies
    Medium,
    /// 64 KB - larger bodies
    Large,
    /// 256 KB - bulk payloads
    Huge,
}

impl BufferSize {
    /// Byte capacity of this class.
    #[inline]
    pub const fn capacity(self) -> usize {
        match self {
            Self::Small => 4096,
            Self::Medium => 16384,
            Self::Large => 65536,
            Self::Huge => 262144,
        }
    }

    /// Smallest class that holds `bytes` without growing.
    #[inline]
    pub const fn for_bytes(bytes: usize) -> Self {
        if bytes <= 4096 {
            Self::Small
        } else if bytes <= 16384 {
            Self::Medium
        } else if bytes <= 65536 {
            Self::Large
        } else {
            Self::Huge
        }
    }

    /// Class a buffer of this capacity is returned to, if any.
    #[inline]
    const fn for_capacity(capacity: usize) -> Option<Self> {
        if capacity >= 262144 {
            if capacity <= 262144 * 2 {
                Some(Self::Huge)
            } else {
                None
            }
        } else if capacity >= 65536 {
            Some(Self::Large)
        } else if capacity >= 16384 {
            Some(Self::Medium)
        } else if capacity >= 4096 {
            Some(Self::Small)
        } else {
            None
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
            Self::Huge => 3,
        }
    }
}

/// Pool statistics.
#[derive(Debug, Default)]
pub struct PoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    discards: AtomicU64,
}

impl PoolStats {
    /// Buffers reused from the pool.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Buffers freshly allocated.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Buffers given back to the pool.
    pub fn returns(&self) -> u64 {
        self.returns.load(Ordering::Relaxed)
    }

    /// Buffers dropped because the pool was full or the buffer oversized.
    pub fn discards(&self) -> u64 {
        self.discards.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            (hits / total) * 100.0
        } else {
            0.0
        }
    }
}

const MAX_PER_CLASS: usize = 64;

struct BufferPool {
    classes: [Mutex<Vec<BytesMut>>; 4],
    stats: PoolStats,
}

impl BufferPool {
    fn new() -> Self {
        Self {
            classes: [
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
            ],
            stats: PoolStats::default(),
        }
    }

    fn acquire(&self, size: BufferSize) -> BytesMut {
        let reused = self.classes[size.index()].lock().pop();
        match reused {
            Some(mut buf) => {
                buf.clear();
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                BytesMut::with_capacity(size.capacity())
            }
        }
    }

    fn release(&self, mut buf: BytesMut) {
        let Some(size) = BufferSize::for_capacity(buf.capacity()) else {
            self.stats.discards.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let mut class = self.classes[size.index()].lock();
        if class.len() < MAX_PER_CLASS {
            buf.clear();
            class.push(buf);
            self.stats.returns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.discards.fetch_add(1, Ordering::Relaxed);
        }
    }
}

static POOL: LazyLock<BufferPool> = LazyLock::new(BufferPool::new);

/// Get the global pool statistics.
pub fn pool_stats() -> &'static PoolStats {
    &POOL.stats
}

/// A buffer acquired from the pool that returns automatically when dropped.
pub struct PooledBuffer {
    inner: BytesMut,
}

impl PooledBuffer {
    /// Take ownership of the inner buffer; it will not return to the pool.
    pub fn take(mut self) -> BytesMut {
        std::mem::take(&mut self.inner)
    }

    /// Convert into immutable [`Bytes`] that still owns the pooled buffer.
    ///
    /// The buffer goes back to the pool once every clone of the returned
    /// bytes has been dropped.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from_owner(self)
    }
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl std::io::Write for PooledBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Write for PooledBuffer {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.inner.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // A taken buffer leaves an empty, zero-capacity BytesMut behind.
        let buf = std::mem::take(&mut self.inner);
        if buf.capacity() > 0 {
            POOL.release(buf);
        }
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.inner.len())
            .field("capacity", &self.inner.capacity())
            .finish()
    }
}

/// Acquire a buffer from the pool.
pub fn acquire_buffer(size: BufferSize) -> PooledBuffer {
    PooledBuffer {
        inner: POOL.acquire(size),
    }
}

/// Acquire a buffer sized for the given byte count.
pub fn acquire_buffer_for_bytes(bytes: usize) -> PooledBuffer {
    acquire_buffer(BufferSize::for_bytes(bytes))
}
