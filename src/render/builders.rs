// src/render/builders.rs
//
// Off-render-thread builders that turn windowed samples into the
// immutable snapshots the render path consumes (spec §4.9, C11): build
// a snapshot, hand it off, never mutate it in place — value types
// crossing a thread boundary rather than a guard held across it.

use crate::core::samples::{EegSample, QualityFlag};
use crate::core::time::TimestampUs;
use crate::dsp::aeeg::{uv_to_y, AeegOutput};

/// Display gain, μV per centimeter. Only these seven values are valid
/// (spec §4.9 table); anything else is a caller bug, not a runtime error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gain {
    Uv10,
    Uv20,
    Uv50,
    Uv70,
    Uv100,
    Uv200,
    Uv1000,
}

impl Gain {
    fn as_uv_per_cm(self) -> f64 {
        match self {
            Gain::Uv10 => 10.0,
            Gain::Uv20 => 20.0,
            Gain::Uv50 => 50.0,
            Gain::Uv70 => 70.0,
            Gain::Uv100 => 100.0,
            Gain::Uv200 => 200.0,
            Gain::Uv1000 => 1000.0,
        }
    }
}

/// Pixels per μV for a given gain and screen DPI.
fn uv_to_px(gain: Gain, dpi: f64) -> f64 {
    (dpi / 2.54) / gain.as_uv_per_cm()
}

/// Consecutive missing samples beyond this count break the polyline
/// into a new segment (spec §4.9: "> 4 consecutive missing samples,
/// > 25 ms" — at the 160 Hz sample interval the two thresholds agree).
const MAX_BRIDGEABLE_GAP_SAMPLES: usize = 4;

/// Immutable render snapshot for one channel's windowed EEG polyline.
#[derive(Debug, Clone, Default)]
pub struct PolylineData {
    pub points: Vec<f32>,
    pub segments: Vec<(usize, usize)>,
    pub gaps: Vec<(usize, usize)>,
    pub saturation_indices: Vec<usize>,
}

pub struct PolylineBuilder;

impl PolylineBuilder {
    /// Builds a polyline for `channel` (0..=3) over `samples`, already
    /// windowed by the caller. Zero interpolation: a gap is a break,
    /// never a bridge (iron law 2).
    pub fn build(
        samples: &[EegSample],
        channel: usize,
        gain: Gain,
        dpi: f64,
        baseline_px: f64,
        saturation_threshold_uv: f64,
    ) -> PolylineData {
        let px_per_uv = uv_to_px(gain, dpi);
        let mut data = PolylineData {
            points: Vec::with_capacity(samples.len()),
            segments: Vec::new(),
            gaps: Vec::new(),
            saturation_indices: Vec::new(),
        };

        let channel_value = |s: &EegSample| -> f64 {
            match channel {
                0 => s.ch1,
                1 => s.ch2,
                2 => s.ch3,
                _ => s.ch4,
            }
        };

        let mut segment_start: Option<usize> = None;
        let mut missing_run_start: Option<usize> = None;
        let mut missing_run_len = 0usize;

        for (i, sample) in samples.iter().enumerate() {
            let uv = channel_value(sample);
            data.points.push((baseline_px - uv * px_per_uv) as f32);

            if uv.abs() >= saturation_threshold_uv {
                data.saturation_indices.push(i);
            }

            let missing = sample.quality[channel.min(3)] == QualityFlag::Missing;
            if missing {
                if missing_run_start.is_none() {
                    missing_run_start = Some(i);
                }
                missing_run_len += 1;
            } else {
                if missing_run_len > MAX_BRIDGEABLE_GAP_SAMPLES {
                    if let Some(start) = segment_start.take() {
                        data.segments.push((start, missing_run_start.unwrap() - start));
                    }
                    data.gaps.push((missing_run_start.unwrap(), missing_run_len));
                }
                missing_run_start = None;
                missing_run_len = 0;
                if segment_start.is_none() {
                    segment_start = Some(i);
                }
            }
        }

        if missing_run_len > MAX_BRIDGEABLE_GAP_SAMPLES {
            if let Some(start) = segment_start.take() {
                data.segments.push((start, missing_run_start.unwrap() - start));
            }
            data.gaps.push((missing_run_start.unwrap(), missing_run_len));
        } else if let Some(start) = segment_start {
            data.segments.push((start, samples.len() - start));
        }

        data
    }
}

/// `> 2 s` between consecutive `AeegOutput` centers breaks the band
/// (spec §4.9).
const AEEG_GAP_THRESHOLD_US: i64 = 2_000_000;

#[derive(Debug, Clone, Default)]
pub struct AeegSeriesData {
    pub ts: Vec<TimestampUs>,
    pub min_y: Vec<f32>,
    pub max_y: Vec<f32>,
    pub segments: Vec<(usize, usize)>,
}

pub struct AeegSeriesBuilder;

impl AeegSeriesBuilder {
    pub fn build(outputs: &[AeegOutput], total_height_px: f64) -> AeegSeriesData {
        let mut data = AeegSeriesData {
            ts: Vec::with_capacity(outputs.len()),
            min_y: Vec::with_capacity(outputs.len()),
            max_y: Vec::with_capacity(outputs.len()),
            segments: Vec::new(),
        };

        let mut segment_start = 0usize;
        for (i, out) in outputs.iter().enumerate() {
            data.ts.push(out.ts_center);
            data.min_y.push(uv_to_y(out.min_uv, total_height_px) as f32);
            data.max_y.push(uv_to_y(out.max_uv, total_height_px) as f32);

            if i > 0 {
                let gap = out.ts_center.as_i64() - outputs[i - 1].ts_center.as_i64();
                if gap > AEEG_GAP_THRESHOLD_US {
                    data.segments.push((segment_start, i - segment_start));
                    segment_start = i;
                }
            }
        }
        if segment_start < outputs.len() {
            data.segments.push((segment_start, outputs.len() - segment_start));
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::TimestampUs;

    fn sample(uv: f64, quality: QualityFlag) -> EegSample {
        EegSample::new(
            TimestampUs::ZERO,
            uv,
            0.0,
            0.0,
            [quality, QualityFlag::Normal, QualityFlag::Normal, QualityFlag::Normal],
        )
    }

    #[test]
    fn polyline_segments_on_large_gap_only() {
        let mut samples = vec![sample(1.0, QualityFlag::Normal); 10];
        // a 2-sample gap is bridgeable: no segment break.
        samples[5] = EegSample::gap_marker(TimestampUs::ZERO);
        samples[6] = EegSample::gap_marker(TimestampUs::ZERO);
        let data = PolylineBuilder::build(&samples, 0, Gain::Uv100, 96.0, 0.0, 1000.0);
        assert_eq!(data.segments.len(), 1);
        assert!(data.gaps.is_empty());
    }

    #[test]
    fn polyline_breaks_on_gap_over_four_samples() {
        let mut samples = vec![sample(1.0, QualityFlag::Normal); 12];
        for s in samples.iter_mut().skip(4).take(6) {
            *s = EegSample::gap_marker(TimestampUs::ZERO);
        }
        let data = PolylineBuilder::build(&samples, 0, Gain::Uv100, 96.0, 0.0, 1000.0);
        assert_eq!(data.segments.len(), 2);
        assert_eq!(data.gaps.len(), 1);
        assert_eq!(data.gaps[0], (4, 6));
    }

    #[test]
    fn saturation_flags_out_of_range_samples() {
        let samples = vec![sample(150.0, QualityFlag::Normal), sample(1.0, QualityFlag::Normal)];
        let data = PolylineBuilder::build(&samples, 0, Gain::Uv200, 96.0, 0.0, 100.0);
        assert_eq!(data.saturation_indices, vec![0]);
    }

    #[test]
    fn aeeg_series_segments_on_two_second_gap() {
        let outputs = vec![
            AeegOutput { ts_center: TimestampUs::new(0), min_uv: 2.0, max_uv: 8.0, quality: QualityFlag::Normal },
            AeegOutput { ts_center: TimestampUs::new(1_000_000), min_uv: 2.0, max_uv: 8.0, quality: QualityFlag::Normal },
            AeegOutput { ts_center: TimestampUs::new(4_000_000), min_uv: 2.0, max_uv: 8.0, quality: QualityFlag::Normal },
        ];
        let data = AeegSeriesBuilder::build(&outputs, 200.0);
        assert_eq!(data.segments, vec![(0, 2), (2, 1)]);
    }
}
