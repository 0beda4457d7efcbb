//! Append-only slot storage with lock-free appends.
//!
//! Indices are reserved from one atomic counter and map to fixed positions
//! in geometrically growing buckets, so a slot never moves once filled.
//! Readers copy the contiguous filled prefix and never exclude appenders.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

const FIRST_BUCKET_BITS: u32 = 5;
const FIRST_BUCKET_LEN: u64 = 1 << FIRST_BUCKET_BITS;
const BUCKETS: usize = (u64::BITS - FIRST_BUCKET_BITS) as usize;

type Bucket<T> = Box<[OnceLock<T>]>;

pub(crate) struct AppendLog<T> {
    reserved: AtomicU64,
    filled: AtomicU64,
    buckets: [OnceLock<Bucket<T>>; BUCKETS],
}

/// Bucket `b` holds `FIRST_BUCKET_LEN << b` slots.
fn locate(index: u64) -> (usize, usize) {
    let position = index + FIRST_BUCKET_LEN;
    let bucket = (u64::BITS - 1 - position.leading_zeros() - FIRST_BUCKET_BITS) as usize;
    let offset = (position - (FIRST_BUCKET_LEN << bucket)) as usize;
    (bucket, offset)
}

impl<T> AppendLog<T> {
    pub(crate) fn new() -> Self {
        Self {
            reserved: AtomicU64::new(0),
            filled: AtomicU64::new(0),
            buckets: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub(crate) fn reserve(&self) -> u64 {
        self.reserved.fetch_add(1, Ordering::AcqRel)
    }

    /// Store `value` at a reserved index. A slot is written at most once.
    pub(crate) fn fill(&self, index: u64, value: T) {
        let (bucket, offset) = locate(index);
        let slots = self.buckets[bucket].get_or_init(|| {
            (0..FIRST_BUCKET_LEN << bucket)
                .map(|_| OnceLock::new())
                .collect()
        });
        if slots[offset].set(value).is_ok() {
            self.filled.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn get(&self, index: u64) -> Option<&T> {
        let (bucket, offset) = locate(index);
        self.buckets.get(bucket)?.get()?.get(offset)?.get()
    }

    /// Index the next reservation will receive.
    pub(crate) fn reserved(&self) -> u64 {
        self.reserved.load(Ordering::Acquire)
    }

    /// Number of filled slots.
    pub(crate) fn filled(&self) -> u64 {
        self.filled.load(Ordering::Acquire)
    }

    /// Clones of the filled slots from `from` up to the first slot still
    /// being written.
    pub(crate) fn snapshot_from(&self, from: u64) -> Vec<T>
    where
        T: Clone,
    {
        let end = self.reserved();
        (from..end).map_while(|index| self.get(index).cloned()).collect()
    }
}
