// src/dsp/aeeg.rs
//
// Band-pass -> half-wave rectify -> envelope -> semi-log map (spec §4.4,
// C6): one per-channel accumulation-window struct, one result emitted
// per window, with the filtering stage delegated to dsp::filter's
// SosCascade.

use super::filter::{aeeg_hpf_2hz, aeeg_lpf_15hz, SosCascade};
use crate::core::samples::QualityFlag;
use crate::core::time::{TimestampUs, EEG_SAMPLE_INTERVAL_US};

/// EEG sample rate, used to size the 1-second envelope window.
const EEG_SAMPLE_RATE_HZ: usize = 160;

/// One second of aEEG trend for a single channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeegOutput {
    pub ts_center: TimestampUs,
    pub min_uv: f64,
    pub max_uv: f64,
    pub quality: QualityFlag,
}

/// Per-channel aEEG pipeline: owns its own band-pass cascade and
/// envelope accumulator. RMS is deliberately never computed here —
/// rectification is the medically defined operation (spec §4.4).
pub struct AeegChannel {
    hpf: SosCascade,
    lpf: SosCascade,
    window_min: f64,
    window_max: f64,
    window_count: usize,
    window_quality: QualityFlag,
    warmup_remaining: usize,
}

impl AeegChannel {
    pub fn new() -> Self {
        let hpf = aeeg_hpf_2hz();
        let warmup = hpf.warmup_samples();
        Self {
            hpf,
            lpf: aeeg_lpf_15hz(),
            window_min: f64::INFINITY,
            window_max: f64::NEG_INFINITY,
            window_count: 0,
            window_quality: QualityFlag::Normal,
            warmup_remaining: warmup,
        }
    }

    /// Re-enter warm-up, e.g. after a detected acquisition gap (spec
    /// §4.4: "the first 240 samples after start or gap are flagged
    /// Warming and not emitted").
    pub fn reset_warmup(&mut self) {
        self.hpf.reset();
        self.lpf.reset();
        self.warmup_remaining = self.hpf.warmup_samples();
        self.window_min = f64::INFINITY;
        self.window_max = f64::NEG_INFINITY;
        self.window_count = 0;
    }

    /// Feed one EEG sample; returns `Some(AeegOutput)` once per second
    /// (every 160 samples), `None` otherwise (including throughout
    /// warm-up, when nothing is emitted at all).
    pub fn process_sample(
        &mut self,
        uv: f64,
        quality: QualityFlag,
        ts: TimestampUs,
    ) -> Option<AeegOutput> {
        let filtered = self.lpf.process(self.hpf.process(uv));
        let rectified = filtered.abs();

        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return None;
        }

        self.window_min = self.window_min.min(rectified);
        self.window_max = self.window_max.max(rectified);
        if quality != QualityFlag::Normal {
            self.window_quality = quality;
        }
        self.window_count += 1;

        if self.window_count >= EEG_SAMPLE_RATE_HZ {
            let out = AeegOutput {
                ts_center: ts,
                min_uv: self.window_min,
                max_uv: self.window_max,
                quality: self.window_quality,
            };
            self.window_min = f64::INFINITY;
            self.window_max = f64::NEG_INFINITY;
            self.window_count = 0;
            self.window_quality = QualityFlag::Normal;
            Some(out)
        } else {
            None
        }
    }
}

impl Default for AeegChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Semi-log display mapping (spec §4.4 point 4): linear 0-10 uV over
/// the lower half of `total_height`, log10 10-100 uV over the upper
/// half. `uv_to_y` is the forward (display) direction; `y_to_uv` its
/// inverse. Negative `uv` is undefined (NaN); `uv >= 0` always produces
/// a finite `y`.
pub fn uv_to_y(uv: f64, total_height: f64) -> f64 {
    if uv < 0.0 {
        return f64::NAN;
    }
    let half = total_height / 2.0;
    if uv <= 10.0 {
        uv / 10.0 * half
    } else {
        let frac = (uv.log10() - 1.0).max(0.0);
        half + frac * half
    }
}

pub fn y_to_uv(y: f64, total_height: f64) -> f64 {
    let half = total_height / 2.0;
    if y <= half {
        (y / half) * 10.0
    } else {
        let frac = (y - half) / half;
        10f64.powf(1.0 + frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_suppresses_first_240_samples() {
        let mut ch = AeegChannel::new();
        for i in 0..239 {
            let out = ch.process_sample(5.0, QualityFlag::Normal, TimestampUs::new(i * EEG_SAMPLE_INTERVAL_US));
            assert!(out.is_none());
        }
    }

    #[test]
    fn emits_once_per_second_after_warmup() {
        let mut ch = AeegChannel::new();
        let mut emitted = 0;
        for i in 0..(240 + 160 * 3) {
            if ch
                .process_sample(5.0, QualityFlag::Normal, TimestampUs::new(i * EEG_SAMPLE_INTERVAL_US))
                .is_some()
            {
                emitted += 1;
            }
        }
        assert_eq!(emitted, 3);
    }

    #[test]
    fn semi_log_round_trip_uv_domain() {
        for uv_milli in (0..=10_000).step_by(37) {
            let uv = uv_milli as f64 / 100.0;
            let y = uv_to_y(uv, 200.0);
            let back = y_to_uv(y, 200.0);
            assert!((back - uv).abs() < 1e-6, "uv={} back={}", uv, back);
        }
    }

    #[test]
    fn semi_log_round_trip_y_domain() {
        for y_i in (0..=200).step_by(3) {
            let y = y_i as f64;
            let uv = y_to_uv(y, 200.0);
            let back = uv_to_y(uv, 200.0);
            assert!((back - y).abs() < 1e-9, "y={} back={}", y, back);
        }
    }

    #[test]
    fn negative_uv_is_nan() {
        assert!(uv_to_y(-1.0, 200.0).is_nan());
    }
}
