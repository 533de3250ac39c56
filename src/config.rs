// src/config.rs
//
// `MonitorConfig`: ring capacities, gap/sync thresholds, gain table, and
// the externally-supplied filter coefficient tables (Open Question (a)).
// `load`/`save` go through `toml::from_str`/`to_string_pretty`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::error::{CoreError, CoreResult};
use crate::dsp::filter::SosCoefficients;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RingConfig {
    pub eeg_capacity: usize,
    pub nirs_capacity: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            eeg_capacity: 160 * 60 * 30, // 30 minutes at 160 Hz
            nirs_capacity: 60 * 30,      // 30 minutes at 1 Hz
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    pub gap_threshold_us: i64,
    pub sync_tolerance_us: i64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            gap_threshold_us: 25_000,
            sync_tolerance_us: 100_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// μV per cm, one of {10,20,50,70,100,200,1000} (spec §4.9).
    pub default_gain_uv_per_cm: f64,
    pub saturation_threshold_uv: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_gain_uv_per_cm: 100.0,
            saturation_threshold_uv: 150.0,
        }
    }
}

/// One filter's SOS sections as they arrive from the external table the
/// core must never recompute (Open Question (a)). `sections` is a flat
/// list of `[b0,b1,b2,a1,a2]` rows.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterTableEntry {
    pub gain: f64,
    pub sections: Vec<[f64; 5]>,
}

impl FilterTableEntry {
    pub fn to_coefficients(&self) -> SosCoefficients {
        SosCoefficients {
            gain: self.gain,
            sections: self.sections.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FilterTables {
    #[serde(flatten)]
    pub entries: HashMap<String, FilterTableEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub filters: FilterTables,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            playback: PlaybackConfig::default(),
            display: DisplayConfig::default(),
            filters: FilterTables::default(),
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &str) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::with_context("reading config file", e))?;
        toml::from_str(&text).map_err(|e| CoreError::with_context("parsing config file", e))
    }

    pub fn save(&self, path: &str) -> CoreResult<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| CoreError::with_context("serializing config", e))?;
        std::fs::write(path, text).map_err(|e| CoreError::with_context("writing config file", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = MonitorConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: MonitorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.ring.eeg_capacity, config.ring.eeg_capacity);
        assert_eq!(parsed.playback.gap_threshold_us, config.playback.gap_threshold_us);
    }

    #[test]
    fn filter_table_entry_converts_to_coefficients() {
        let entry = FilterTableEntry {
            gain: 0.5,
            sections: vec![[1.0, -2.0, 1.0, -1.8, 0.9]],
        };
        let coeffs = entry.to_coefficients();
        assert_eq!(coeffs.gain, 0.5);
        assert_eq!(coeffs.sections.len(), 1);
    }
}
