// src/dsp/histogram.rs
//
// Counter-driven 230-bin amplitude-distribution frames (spec §4.5, C7),
// expressed in the same struct-with-new-and-mutating-methods idiom as
// dsp::filter/dsp::aeeg.

use crate::core::time::TimestampUs;

pub const BIN_COUNT: usize = 230;
const LINEAR_BINS: usize = 100;
const LINEAR_SPAN_UV: f64 = 10.0;
const LOG_BINS: usize = 130;
const LOG_SPAN_MAX_UV: f64 = 200.0;
const SATURATION_BIN: usize = 229;
const SATURATION_CAP: u16 = 249;

/// A closed, emitted 15-second (by device-counter convention) frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GsFrame {
    pub frame_index: u64,
    pub start_ts: TimestampUs,
    pub end_ts: TimestampUs,
    pub bins: [u16; BIN_COUNT],
}

/// Bin assignment for a rectified amplitude in microvolts. Bin layout is
/// invariant: 100 linear bins over 0-10 uV, 130 log-spaced bins over
/// 10-200 uV; samples >= 200 uV clamp to bin 229.
pub fn bin_for_amplitude(uv: f64) -> usize {
    if uv < 0.0 {
        return 0;
    }
    if uv < LINEAR_SPAN_UV {
        let bin = (uv / LINEAR_SPAN_UV * LINEAR_BINS as f64) as usize;
        return bin.min(LINEAR_BINS - 1);
    }
    if uv >= LOG_SPAN_MAX_UV {
        return SATURATION_BIN;
    }
    // log-spaced across [10, 200) uV into LOG_BINS buckets.
    let log_min = LINEAR_SPAN_UV.log10();
    let log_max = LOG_SPAN_MAX_UV.log10();
    let frac = (uv.log10() - log_min) / (log_max - log_min);
    let bin = LINEAR_BINS + (frac * LOG_BINS as f64) as usize;
    bin.min(BIN_COUNT - 1)
}

/// Per-channel GS histogram accumulator, driven by the device byte-16
/// counter rather than wall-clock time (spec §4.5).
pub struct GsHistogram {
    bins: [u16; BIN_COUNT],
    frame_index: u64,
    start_ts: Option<TimestampUs>,
    last_ts: TimestampUs,
}

impl GsHistogram {
    pub fn new() -> Self {
        Self {
            bins: [0; BIN_COUNT],
            frame_index: 0,
            start_ts: None,
            last_ts: TimestampUs::ZERO,
        }
    }

    /// Feed one rectified amplitude sample with its device counter byte.
    /// Returns `Some(GsFrame)` exactly when `counter == 229` closes the
    /// frame; `counter == 255` contributes nothing at all, not even to
    /// a bin.
    pub fn process_sample(&mut self, uv: f64, counter: u8, ts: TimestampUs) -> Option<GsFrame> {
        if counter == 255 {
            return None;
        }

        if self.start_ts.is_none() {
            self.start_ts = Some(ts);
        }
        self.last_ts = ts;

        let bin = bin_for_amplitude(uv);
        if bin == SATURATION_BIN {
            if self.bins[bin] < SATURATION_CAP {
                self.bins[bin] += 1;
            }
        } else {
            self.bins[bin] = self.bins[bin].saturating_add(1);
        }

        if counter == 229 {
            let frame = GsFrame {
                frame_index: self.frame_index,
                start_ts: self.start_ts.unwrap_or(ts),
                end_ts: ts,
                bins: self.bins,
            };
            self.frame_index += 1;
            self.bins = [0; BIN_COUNT];
            self.start_ts = None;
            Some(frame)
        } else {
            None
        }
    }
}

impl Default for GsHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_for_5uv_is_linear_bin_50() {
        assert_eq!(bin_for_amplitude(5.0), 50);
    }

    #[test]
    fn gs_counter_behaviour_two_frames() {
        // S2: 30 samples at 5 uV; counters [0..0, 229, 0..0, 255, 0..0, 229]
        let mut hist = GsHistogram::new();
        let mut counters = vec![0u8; 9];
        counters.push(229);
        counters.extend(vec![0u8; 9]);
        counters.push(255);
        counters.extend(vec![0u8; 9]);
        counters.push(229);
        assert_eq!(counters.len(), 30);

        let mut frames = Vec::new();
        for (i, &c) in counters.iter().enumerate() {
            if let Some(f) = hist.process_sample(5.0, c, TimestampUs::new(i as i64)) {
                frames.push(f);
            }
        }

        assert_eq!(frames.len(), 2);
        // the 255-counter sample contributed to no bin: second frame has
        // 9 (0-counter) + 1 (229-counter) = 10 samples in bin 50, not 11.
        assert_eq!(frames[1].bins[50], 10);
        assert_eq!(frames[0].bins[50], 10);
    }

    #[test]
    fn saturation_clamps_at_249() {
        // S3: 300 samples at 500 uV, counter=0 then counter=229
        let mut hist = GsHistogram::new();
        let mut last_frame = None;
        for i in 0..300 {
            let counter = if i == 299 { 229 } else { 0 };
            if let Some(f) = hist.process_sample(500.0, counter, TimestampUs::new(i)) {
                last_frame = Some(f);
            }
        }
        let frame = last_frame.expect("frame must close on counter=229");
        assert_eq!(frame.bins[SATURATION_BIN], SATURATION_CAP);
        for (i, &count) in frame.bins.iter().enumerate() {
            if i != SATURATION_BIN {
                assert_eq!(count, 0);
            }
        }
    }

    #[test]
    fn counter_255_contributes_to_no_bin() {
        let mut hist = GsHistogram::new();
        hist.process_sample(5.0, 255, TimestampUs::new(0));
        let frame = hist.process_sample(5.0, 229, TimestampUs::new(1)).unwrap();
        assert_eq!(frame.bins[50], 1);
    }
}
