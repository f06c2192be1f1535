//! Process-wide pools for encoder growth buffers and decoder info-table scratch arrays
//! (§4.5). Both are optional from a wire-format standpoint; they exist purely to amortize
//! allocation. Guarded by per-class `Mutex`es and exposed only through RAII guards so a
//! failure partway through an encode/decode (a `?` on `Error::Corrupt`, say) can never leak
//! a pooled buffer.

#[cfg(not(feature = "std"))]
compile_error!("the pool module requires the `std` feature (it uses std::sync primitives)");

use std::sync::{Mutex, OnceLock};

/// Base capacity of the smallest byte-buffer pool class (4 KiB).
const BYTE_POOL_BASE: usize = 1 << 12;
/// Growth factor between byte-buffer pool classes.
const BYTE_POOL_STEP: usize = 4;
/// Number of byte-buffer pool size classes (4 KiB, 16 KiB, 64 KiB, 256 KiB, 1 MiB, 4 MiB).
const BYTE_POOL_CLASSES: usize = 6;
/// Maximum buffers held per byte-buffer pool class.
const BYTE_POOL_CAP: usize = 8;

struct BytePoolClass {
    capacity: usize,
    buffers: Mutex<Vec<Vec<u8>>>,
}

/// Six fixed size classes of pooled `Vec<u8>` buffers used for encoder growth.
pub struct BufferPool {
    classes: [BytePoolClass; BYTE_POOL_CLASSES],
}

impl BufferPool {
    fn new() -> Self {
        let classes = core::array::from_fn(|i| BytePoolClass {
            capacity: BYTE_POOL_BASE * BYTE_POOL_STEP.pow(i as u32),
            buffers: Mutex::new(Vec::with_capacity(BYTE_POOL_CAP)),
        });
        BufferPool { classes }
    }

    /// The process-wide singleton pool.
    pub fn global() -> &'static BufferPool {
        static POOL: OnceLock<BufferPool> = OnceLock::new();
        POOL.get_or_init(BufferPool::new)
    }

    /// Rounds `size` up to the smallest class capacity `>= size` and returns a buffer of at
    /// least that capacity, reused from the pool when available.
    pub fn acquire(&self, size: usize) -> PooledBuffer {
        for class in &self.classes {
            if class.capacity >= size {
                let mut buffers = class.buffers.lock().expect("pool mutex poisoned");
                let mut buf = buffers.pop().unwrap_or_else(|| Vec::with_capacity(class.capacity));
                buf.clear();
                drop(buffers);
                return PooledBuffer {
                    buf: Some(buf),
                    class_capacity: Some(class.capacity),
                };
            }
        }
        // larger than the biggest class: allocate fresh, not pooled
        PooledBuffer {
            buf: Some(Vec::with_capacity(size)),
            class_capacity: None,
        }
    }

    fn release(&self, capacity: usize, mut buf: Vec<u8>) {
        for class in &self.classes {
            if class.capacity == capacity {
                let mut buffers = class.buffers.lock().expect("pool mutex poisoned");
                if buffers.len() < BYTE_POOL_CAP {
                    buf.clear();
                    buffers.push(buf);
                }
                return;
            }
        }
    }
}

/// An RAII-held `Vec<u8>` acquired from [`BufferPool`]. Returns itself to its size class on
/// drop so encode failures can never leak a buffer.
pub struct PooledBuffer {
    buf: Option<Vec<u8>>,
    class_capacity: Option<usize>,
}

impl PooledBuffer {
    /// Takes ownership of the underlying `Vec<u8>`, preventing it from being returned to the
    /// pool. Used when the caller wants to hand the bytes to an owner outside this crate.
    pub fn take(mut self) -> Vec<u8> {
        self.buf.take().expect("buffer already taken")
    }
}

impl core::ops::Deref for PooledBuffer {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        self.buf.as_ref().expect("buffer already taken")
    }
}

impl core::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.buf.as_mut().expect("buffer already taken")
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let (Some(buf), Some(capacity)) = (self.buf.take(), self.class_capacity) {
            BufferPool::global().release(capacity, buf);
        }
    }
}

/// Fixed-shape pool for the decoder's info-table scratch arrays (§4.3): 32-slot and 64-slot
/// shapes are pooled; larger requests allocate fresh and are not returned to the pool.
pub struct InfoArrayPool {
    small: Mutex<Vec<Vec<u64>>>, // 32 slots, up to 24 held
    large: Mutex<Vec<Vec<u64>>>, // 64 slots, up to 8 held
}

const SMALL_SHAPE: usize = 32;
const LARGE_SHAPE: usize = 64;
const SMALL_CAP: usize = 24;
const LARGE_CAP: usize = 8;

impl InfoArrayPool {
    fn new() -> Self {
        InfoArrayPool {
            small: Mutex::new(Vec::with_capacity(SMALL_CAP)),
            large: Mutex::new(Vec::with_capacity(LARGE_CAP)),
        }
    }

    /// The process-wide singleton pool.
    pub fn global() -> &'static InfoArrayPool {
        static POOL: OnceLock<InfoArrayPool> = OnceLock::new();
        POOL.get_or_init(InfoArrayPool::new)
    }

    /// Returns a zero-filled `Vec<u64>` of at least `min_slots` length.
    pub fn acquire(&self, min_slots: usize) -> Vec<u64> {
        if min_slots <= SMALL_SHAPE {
            if let Some(mut v) = self.small.lock().expect("pool mutex poisoned").pop() {
                v.clear();
                v.resize(SMALL_SHAPE, 0);
                return v;
            }
            return vec![0u64; SMALL_SHAPE];
        }
        if min_slots <= LARGE_SHAPE {
            if let Some(mut v) = self.large.lock().expect("pool mutex poisoned").pop() {
                v.clear();
                v.resize(LARGE_SHAPE, 0);
                return v;
            }
            return vec![0u64; LARGE_SHAPE];
        }
        vec![0u64; min_slots]
    }

    /// Returns `array` to the pool if its shape matches one of the two pooled sizes and that
    /// class is not already full.
    pub fn release(&self, array: Vec<u64>) {
        match array.len() {
            SMALL_SHAPE => {
                let mut buffers = self.small.lock().expect("pool mutex poisoned");
                if buffers.len() < SMALL_CAP {
                    buffers.push(array);
                }
            }
            LARGE_SHAPE => {
                let mut buffers = self.large.lock().expect("pool mutex poisoned");
                if buffers.len() < LARGE_CAP {
                    buffers.push(array);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_rounds_up_to_class() {
        let pool = BufferPool::new();
        let buf = pool.acquire(100);
        assert_eq!(buf.capacity(), BYTE_POOL_BASE);
    }

    #[test]
    fn release_then_acquire_reuses_buffer() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire(10);
            buf.extend_from_slice(&[1, 2, 3]);
        }
        let buf = pool.acquire(10);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn pool_class_caps_are_respected() {
        let pool = BufferPool::new();
        let mut held = Vec::new();
        for _ in 0..(BYTE_POOL_CAP + 4) {
            held.push(pool.acquire(10));
        }
        drop(held);
        let buffers = pool.classes[0].buffers.lock().unwrap();
        assert!(buffers.len() <= BYTE_POOL_CAP);
    }

    #[test]
    fn info_array_pool_shapes() {
        let pool = InfoArrayPool::new();
        let small = pool.acquire(10);
        assert_eq!(small.len(), SMALL_SHAPE);
        let large = pool.acquire(40);
        assert_eq!(large.len(), LARGE_SHAPE);
        let oversized = pool.acquire(100);
        assert_eq!(oversized.len(), 100);

        pool.release(small);
        pool.release(large);
        pool.release(oversized);
        let smalls = pool.small.lock().unwrap();
        assert_eq!(smalls.len(), 1);
    }
}
