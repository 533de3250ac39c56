// src/core/double_buffer.rs
//
// SPSC publish/snapshot handoff (spec §4.1, C3). Two equal-capacity
// arrays plus a handful of atomics: the producer always writes the
// array not currently exposed to the consumer, and a `Release` store
// on `published_index`/`version` hands it off once the write is
// complete.

use std::cell::UnsafeCell;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};

use super::error::{CoreError, CoreResult};
use super::time::TimestampUs;

pub struct DoubleBuffer<T> {
    buf_a: UnsafeCell<Box<[T]>>,
    buf_b: UnsafeCell<Box<[T]>>,
    capacity: usize,
    /// Index (0 or 1) of the array currently visible to the consumer.
    published_index: AtomicUsize,
    published_count: AtomicUsize,
    published_ts_us: AtomicI64,
    version: AtomicU64,
    #[cfg(debug_assertions)]
    snapshot_outstanding: AtomicBool,
    /// Index backing the currently outstanding `Snapshot`, if any.
    /// Meaningful only while `snapshot_outstanding` is true.
    #[cfg(debug_assertions)]
    snapshot_index: AtomicUsize,
}

// SAFETY: exactly one producer thread ever calls `publish`, exactly one
// consumer thread ever calls `snapshot`/`try_snapshot`. The producer only
// ever writes the array *not* currently exposed by `published_index`, and
// the swap that exposes it happens-after the write via `Ordering::Release`
// on `published_index`/`version`.
unsafe impl<T: Send> Sync for DoubleBuffer<T> {}

impl<T: Copy + Default> DoubleBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf_a: UnsafeCell::new(vec![T::default(); capacity].into_boxed_slice()),
            buf_b: UnsafeCell::new(vec![T::default(); capacity].into_boxed_slice()),
            capacity,
            published_index: AtomicUsize::new(0),
            published_count: AtomicUsize::new(0),
            published_ts_us: AtomicI64::new(0),
            version: AtomicU64::new(0),
            #[cfg(debug_assertions)]
            snapshot_outstanding: AtomicBool::new(false),
            #[cfg(debug_assertions)]
            snapshot_index: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Producer-side: write `data` into the non-published array and make
    /// it visible. Fails with `CapacityExceeded` if `data.len() >
    /// capacity` — a programmer error, never expected from a correct
    /// producer.
    pub fn publish(&self, data: &[T], ts: TimestampUs) -> CoreResult<()> {
        if data.len() > self.capacity {
            return Err(CoreError::CapacityExceeded {
                attempted: data.len(),
                capacity: self.capacity,
            });
        }

        let current = self.published_index.load(Ordering::Acquire);
        let write_index = 1 - current;

        // A live Snapshot is only guaranteed not to alias the array this
        // publish is about to overwrite for as long as that array isn't
        // the one backing the snapshot. With only two arrays, holding a
        // Snapshot across a second publish() targets exactly the array
        // it reads from — catch that here rather than let it race.
        #[cfg(debug_assertions)]
        {
            if self.snapshot_outstanding.load(Ordering::Acquire)
                && self.snapshot_index.load(Ordering::Acquire) == write_index
            {
                panic!(
                    "DoubleBuffer: publish would overwrite data behind a live Snapshot \
                     (Snapshot held across more than one publish())"
                );
            }
        }

        let target = self.array_mut(write_index);
        target[..data.len()].copy_from_slice(data);

        self.published_count.store(data.len(), Ordering::Release);
        self.published_ts_us.store(ts.as_i64(), Ordering::Release);
        self.published_index.store(write_index, Ordering::Release);
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Consumer-side: take the current published view. Panics in debug
    /// builds if a previous `Snapshot` from this buffer is still alive —
    /// the contract is "valid for this frame only"; holding two
    /// overlapping borrows is a caller bug (spec §9 design note).
    pub fn snapshot(&self) -> Snapshot<'_, T> {
        let version = self.version.load(Ordering::Acquire);
        let index = self.published_index.load(Ordering::Acquire);
        let count = self.published_count.load(Ordering::Acquire);
        let ts = self.published_ts_us.load(Ordering::Acquire);

        #[cfg(debug_assertions)]
        {
            if self.snapshot_outstanding.swap(true, Ordering::AcqRel) {
                panic!("DoubleBuffer: overlapping snapshot borrows are forbidden");
            }
            self.snapshot_index.store(index, Ordering::Release);
        }

        let data = self.array_ref(index);

        Snapshot {
            #[cfg(debug_assertions)]
            owner: self,
            data: &data[..count],
            count,
            ts: TimestampUs::new(ts),
            version,
        }
    }

    /// Returns `None` without taking a snapshot if nothing new has been
    /// published since `last_version` (spec §4.1).
    pub fn try_snapshot(&self, last_version: u64) -> Option<Snapshot<'_, T>> {
        if self.version.load(Ordering::Acquire) == last_version {
            return None;
        }
        Some(self.snapshot())
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Legal only when quiescent — `&mut self` makes that a compile-time
    /// fact rather than a runtime check.
    pub fn reset(&mut self) {
        self.published_index.store(0, Ordering::Release);
        self.published_count.store(0, Ordering::Release);
        self.published_ts_us.store(0, Ordering::Release);
        self.version.store(0, Ordering::Release);
    }

    fn array_ref(&self, index: usize) -> &[T] {
        // SAFETY: the producer always targets `1 - current`, so the very
        // next publish() cannot alias this read. A Snapshot held across
        // a second publish() would alias it; `publish()`'s debug-only
        // `snapshot_index` check catches that case, and callers are
        // otherwise responsible for dropping a Snapshot before more than
        // one further publish() (spec §9 design note).
        unsafe {
            if index == 0 {
                &*self.buf_a.get()
            } else {
                &*self.buf_b.get()
            }
        }
    }

    #[allow(clippy::mut_from_ref)]
    fn array_mut(&self, index: usize) -> &mut [T] {
        // SAFETY: only the single producer thread calls this, and only
        // for the array not currently exposed to the consumer.
        unsafe {
            if index == 0 {
                &mut *self.buf_a.get()
            } else {
                &mut *self.buf_b.get()
            }
        }
    }
}

/// A read-only view of the most recently published data, valid for the
/// duration of one consumer frame.
pub struct Snapshot<'a, T> {
    #[cfg(debug_assertions)]
    owner: &'a DoubleBuffer<T>,
    data: &'a [T],
    count: usize,
    ts: TimestampUs,
    version: u64,
}

impl<'a, T> Snapshot<'a, T> {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn timestamp(&self) -> TimestampUs {
        self.ts
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<'a, T> Deref for Snapshot<'a, T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        self.data
    }
}

#[cfg(debug_assertions)]
impl<'a, T> Drop for Snapshot<'a, T> {
    fn drop(&mut self) {
        self.owner.snapshot_outstanding.store(false, Ordering::Release);
    }
}
