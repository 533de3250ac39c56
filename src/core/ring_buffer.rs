// src/core/ring_buffer.rs
//
// Fixed-capacity windowed history of timestamped samples (spec §4.2, C4).
// A capacity-sized slot array, a sequence number per slot, and
// timeout-guarded locks from core::lock — single-writer (the DSP
// thread), since reads here are bulk copy-outs (get_latest/get_range),
// not a per-reader pop cursor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use super::lock::{lock_mutex, lock_rwlock_read, lock_rwlock_write};
use super::logging::{ComponentLogger, LogContext};
use super::time::TimestampUs;

const SLOT_LOCK_TIMEOUT: Duration = Duration::from_millis(5);

/// Anything storable in the ring buffer must know its own timestamp.
pub trait Timestamped: Clone {
    fn timestamp_us(&self) -> TimestampUs;
}

struct Slot<T> {
    seq: AtomicU64,
    value: RwLock<Option<T>>,
}

/// Overwrites the oldest entry on overflow. `get_range` is a documented
/// linear scan — samples may be non-uniformly spaced due to gaps, which
/// forbids binary search (spec §4.2).
pub struct RingBuffer<T> {
    slots: Vec<Slot<T>>,
    capacity: usize,
    next_seq: AtomicU64,
    head_seq: AtomicU64,
    dropped: Mutex<u64>,
}

impl<T: Timestamped> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be > 0");
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                seq: AtomicU64::new(0),
                value: RwLock::new(None),
            });
        }
        Self {
            slots,
            capacity,
            next_seq: AtomicU64::new(1),
            head_seq: AtomicU64::new(0),
            dropped: Mutex::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write(&self, sample: T) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let idx = (seq as usize) % self.capacity;
        let slot = &self.slots[idx];

        let mut guard = lock_rwlock_write(&slot.value, "ring_buffer.write.slot");
        *guard = Some(sample);
        drop(guard);
        slot.seq.store(seq, Ordering::Release);
        self.head_seq.store(seq, Ordering::Release);

        if seq > self.capacity as u64 {
            *lock_mutex(&self.dropped, "ring_buffer.write.dropped") += 1;
        }
    }

    pub fn write_batch(&self, samples: &[T]) {
        for sample in samples {
            self.write(sample.clone());
        }
    }

    pub fn len(&self) -> usize {
        let head = self.head_seq.load(Ordering::Acquire);
        if head == 0 {
            return 0;
        }
        (head - self.oldest_seq(head) + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped_count(&self) -> u64 {
        *lock_mutex(&self.dropped, "ring_buffer.dropped_count")
    }

    pub fn oldest_ts(&self) -> Option<TimestampUs> {
        let head = self.head_seq.load(Ordering::Acquire);
        if head == 0 {
            return None;
        }
        self.read_by_seq(self.oldest_seq(head)).map(|s| s.timestamp_us())
    }

    pub fn newest_ts(&self) -> Option<TimestampUs> {
        let head = self.head_seq.load(Ordering::Acquire);
        if head == 0 {
            return None;
        }
        self.read_by_seq(head).map(|s| s.timestamp_us())
    }

    /// Indexed access: `0` is the oldest visible sample, `count()-1` the
    /// newest.
    pub fn get(&self, index: usize) -> Option<T> {
        let head = self.head_seq.load(Ordering::Acquire);
        if head == 0 {
            return None;
        }
        let oldest = self.oldest_seq(head);
        let seq = oldest + index as u64;
        if seq > head {
            return None;
        }
        self.read_by_seq(seq)
    }

    /// Copy the `n` most recent samples (oldest-first) into `out`.
    pub fn get_latest(&self, n: usize, out: &mut Vec<T>) {
        out.clear();
        let head = self.head_seq.load(Ordering::Acquire);
        if head == 0 {
            return;
        }
        let oldest = self.oldest_seq(head);
        let count = (head - oldest + 1) as usize;
        let n = n.min(count);
        let start = head - n as u64 + 1;
        for seq in start..=head {
            if let Some(v) = self.read_by_seq(seq) {
                out.push(v);
            }
        }
    }

    /// Linear scan over `[start_ts, end_ts]`, inclusive. O(capacity)
    /// worst case, O(visible samples) typical — documented as acceptable
    /// because timestamps are not guaranteed uniform (spec §4.2).
    pub fn get_range(&self, start_ts: TimestampUs, end_ts: TimestampUs, out: &mut Vec<T>) {
        out.clear();
        let head = self.head_seq.load(Ordering::Acquire);
        if head == 0 {
            return;
        }
        let oldest = self.oldest_seq(head);
        for seq in oldest..=head {
            if let Some(v) = self.read_by_seq(seq) {
                let ts = v.timestamp_us();
                if ts >= start_ts && ts <= end_ts {
                    out.push(v);
                }
            }
        }
    }

    fn oldest_seq(&self, head: u64) -> u64 {
        if head >= self.capacity as u64 {
            head - self.capacity as u64 + 1
        } else {
            1
        }
    }

    fn read_by_seq(&self, seq: u64) -> Option<T> {
        let slot = &self.slots[(seq as usize) % self.capacity];
        let guard = lock_rwlock_read(&slot.value, "ring_buffer.read_by_seq.slot");
        if slot.seq.load(Ordering::Acquire) != seq {
            return None;
        }
        guard.clone()
    }
}

impl<T: Timestamped> ComponentLogger for RingBuffer<T> {
    fn log_context(&self) -> LogContext {
        LogContext::new("RingBuffer", &format!("{:p}", self as *const _))
    }
}

impl Timestamped for super::samples::EegSample {
    fn timestamp_us(&self) -> TimestampUs {
        self.timestamp
    }
}

impl Timestamped for super::samples::NirsSample {
    fn timestamp_us(&self) -> TimestampUs {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Sample {
        ts: TimestampUs,
        value: f64,
    }

    impl Timestamped for Sample {
        fn timestamp_us(&self) -> TimestampUs {
            self.ts
        }
    }

    fn sample(us: i64, v: f64) -> Sample {
        Sample {
            ts: TimestampUs::new(us),
            value: v,
        }
    }

    #[test]
    fn write_and_indexed_access() {
        let rb: RingBuffer<Sample> = RingBuffer::new(4);
        for i in 0..4 {
            rb.write(sample(i * 100, i as f64));
        }
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.get(0).unwrap().value, 0.0);
        assert_eq!(rb.get(3).unwrap().value, 3.0);
    }

    #[test]
    fn overflow_overwrites_oldest() {
        let rb: RingBuffer<Sample> = RingBuffer::new(2);
        rb.write(sample(0, 1.0));
        rb.write(sample(1, 2.0));
        rb.write(sample(2, 3.0));
        assert_eq!(rb.len(), 2);
        assert_eq!(rb.get(0).unwrap().value, 2.0);
        assert_eq!(rb.get(1).unwrap().value, 3.0);
    }

    #[test]
    fn raw_samples_bitwise_stable_before_overwrite() {
        let rb: RingBuffer<Sample> = RingBuffer::new(8);
        let s = sample(42, 3.5);
        rb.write(s.clone());
        let first_read = rb.get(0).unwrap();
        let second_read = rb.get(0).unwrap();
        assert_eq!(first_read, s);
        assert_eq!(second_read, s);
    }

    #[test]
    fn get_range_scans_inclusive_window() {
        let rb: RingBuffer<Sample> = RingBuffer::new(16);
        for i in 0..10 {
            rb.write(sample(i * 100, i as f64));
        }
        let mut out = Vec::new();
        rb.get_range(TimestampUs::new(200), TimestampUs::new(500), &mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].value, 2.0);
        assert_eq!(out[3].value, 5.0);
    }

    #[test]
    fn get_latest_returns_oldest_first() {
        let rb: RingBuffer<Sample> = RingBuffer::new(16);
        for i in 0..5 {
            rb.write(sample(i * 100, i as f64));
        }
        let mut out = Vec::new();
        rb.get_latest(3, &mut out);
        assert_eq!(out.iter().map(|s| s.value).collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    }
}
