// src/dsp/pyramid.rs
//
// Multi-level min/max downsampling pyramid (spec §4.6, C8). A single
// mutex guards both append and query, since pyramid mutation here is
// not a hot SPSC path (spec §5: "only the ring-buffer and pyramid use a
// mutex").

use crate::core::lock::lock_mutex;
use crate::core::time::TimestampUs;
use std::sync::Mutex;

pub const MAX_LEVELS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxPair {
    pub min: f64,
    pub max: f64,
}

impl MinMaxPair {
    pub fn single(v: f64) -> Self {
        Self { min: v, max: v }
    }

    pub fn merge(a: MinMaxPair, b: MinMaxPair) -> MinMaxPair {
        MinMaxPair {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }
}

struct Inner {
    level0: Vec<f64>,
    levels: Vec<Vec<MinMaxPair>>,
    pending: Vec<Option<MinMaxPair>>,
    base_ts: Option<TimestampUs>,
}

/// Per-channel LOD pyramid. Construction is incremental: each new L0
/// sample propagates upward through a single "pending" slot per level,
/// merging with the spike-preservation rule (`MinMaxPair::merge`) when a
/// second entry arrives at a level.
pub struct LodPyramid {
    sample_interval_us: i64,
    inner: Mutex<Inner>,
}

impl LodPyramid {
    pub fn new(sample_interval_us: i64) -> Self {
        Self {
            sample_interval_us,
            inner: Mutex::new(Inner {
                level0: Vec::new(),
                levels: (0..MAX_LEVELS).map(|_| Vec::new()).collect(),
                pending: vec![None; MAX_LEVELS],
                base_ts: None,
            }),
        }
    }

    pub fn append(&self, ts: TimestampUs, value: f64) {
        let mut inner = lock_mutex(&self.inner, "lod_pyramid.append");
        if inner.base_ts.is_none() {
            inner.base_ts = Some(ts);
        }
        inner.level0.push(value);

        let mut pair = MinMaxPair::single(value);
        for level in 0..MAX_LEVELS {
            match inner.pending[level].take() {
                None => {
                    inner.pending[level] = Some(pair);
                    break;
                }
                Some(existing) => {
                    let merged = MinMaxPair::merge(existing, pair);
                    inner.levels[level].push(merged);
                    pair = merged;
                }
            }
        }
    }

    pub fn level0_len(&self) -> usize {
        lock_mutex(&self.inner, "lod_pyramid.level0_len").level0.len()
    }

    pub fn level_len(&self, n: usize) -> usize {
        let inner = lock_mutex(&self.inner, "lod_pyramid.level_len");
        if n == 0 {
            inner.level0.len()
        } else {
            inner.levels[n - 1].len()
        }
    }

    /// `get_level(n, start_ts, end_ts, out)`: converts timestamps to
    /// indices via `elapsed / (sample_interval << n)`, clamped to
    /// `[0, level_length)` (spec §4.6).
    pub fn get_level(
        &self,
        n: usize,
        start_ts: TimestampUs,
        end_ts: TimestampUs,
        out: &mut Vec<MinMaxPair>,
    ) -> usize {
        out.clear();
        let n = n.min(MAX_LEVELS);
        let inner = lock_mutex(&self.inner, "lod_pyramid.get_level");
        let base = inner.base_ts.unwrap_or(TimestampUs::ZERO);
        let interval = self.sample_interval_us << n;

        let (len, read): (usize, Box<dyn Fn(usize) -> MinMaxPair + '_>) = if n == 0 {
            (inner.level0.len(), Box::new(|i| MinMaxPair::single(inner.level0[i])))
        } else {
            (inner.levels[n - 1].len(), Box::new(|i| inner.levels[n - 1][i]))
        };

        if len == 0 {
            return 0;
        }

        let start_idx = (start_ts.saturating_sub(base).max(0) / interval) as usize;
        let end_idx = (end_ts.saturating_sub(base).max(0) / interval) as usize;
        let start_idx = start_idx.min(len - 1);
        let end_idx = end_idx.min(len - 1);

        for i in start_idx..=end_idx {
            out.push(read(i));
        }
        out.len()
    }

    /// Level selection (spec §4.6): smallest `n` such that
    /// `(delta_t / sample_interval) >> n` divided by viewport width is
    /// `<= 4`. Clamped to `[0, 10]`.
    pub fn select_level(&self, delta_t_us: i64, viewport_px: usize) -> usize {
        if viewport_px == 0 {
            return 0;
        }
        let total_samples = (delta_t_us / self.sample_interval_us).max(0) as u64;
        for n in 0..=MAX_LEVELS {
            let entries_per_pixel = (total_samples >> n) as f64 / viewport_px as f64;
            if entries_per_pixel <= 4.0 {
                return n;
            }
        }
        MAX_LEVELS
    }
}
