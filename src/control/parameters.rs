// src/control/parameters.rs
//
// Active gain/filter selection. A `RwLock`-guarded struct swapped whole
// rather than a set of lock-free atomic pointers — the whole-selection
// swap happens rarely (clinician-driven), so a plain `RwLock` write is
// the right tool, not a hot path needing `ArcSwap`.

use std::sync::{Arc, RwLock};

use crate::core::lock::{lock_rwlock_read, lock_rwlock_write};
use crate::core::logging::{ComponentLogger, LogContext};
use crate::dsp::filter::FilterVariant;

use super::event_bus::EventBus;
use super::events::{AuditEvent, AuditEventKind};

/// The seven display gains named in spec §4.9.
pub const VALID_GAINS_UV_PER_CM: [f64; 7] = [10.0, 20.0, 50.0, 70.0, 100.0, 200.0, 1000.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSelection {
    pub hpf: FilterVariant,
    pub lpf: FilterVariant,
    pub notch_enabled: bool,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            hpf: FilterVariant::Hpf1Hz,
            lpf: FilterVariant::Lpf70Hz,
            notch_enabled: true,
        }
    }
}

pub struct ParameterControl {
    instance_id: String,
    gain_uv_per_cm: RwLock<f64>,
    filters: RwLock<FilterSelection>,
    event_bus: Option<Arc<EventBus>>,
}

impl ParameterControl {
    pub fn new(instance_id: &str, event_bus: Option<Arc<EventBus>>) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            gain_uv_per_cm: RwLock::new(100.0),
            filters: RwLock::new(FilterSelection::default()),
            event_bus,
        }
    }

    pub fn gain(&self) -> f64 {
        *lock_rwlock_read(&self.gain_uv_per_cm, "parameter_control.gain")
    }

    /// Rejects a gain outside the enumerated set (spec §4.9 table)
    /// rather than silently clamping it.
    pub fn set_gain(&self, gain_uv_per_cm: f64) -> bool {
        if !VALID_GAINS_UV_PER_CM.contains(&gain_uv_per_cm) {
            return false;
        }
        let previous = {
            let mut guard = lock_rwlock_write(&self.gain_uv_per_cm, "parameter_control.set_gain");
            let previous = *guard;
            *guard = gain_uv_per_cm;
            previous
        };
        self.emit(
            AuditEventKind::GainChange,
            serde_json::json!({"previous_uv_per_cm": previous, "new_uv_per_cm": gain_uv_per_cm}),
        );
        true
    }

    pub fn filters(&self) -> FilterSelection {
        *lock_rwlock_read(&self.filters, "parameter_control.filters")
    }

    pub fn set_filters(&self, selection: FilterSelection) {
        let previous = {
            let mut guard = lock_rwlock_write(&self.filters, "parameter_control.set_filters");
            let previous = *guard;
            *guard = selection;
            previous
        };
        self.emit(
            AuditEventKind::FilterChange,
            serde_json::json!({
                "previous": format!("{:?}", previous),
                "new": format!("{:?}", selection),
            }),
        );
    }

    fn emit(&self, kind: AuditEventKind, payload: serde_json::Value) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.publish(AuditEvent::new(kind, "parameters", payload));
        }
    }
}

impl ComponentLogger for ParameterControl {
    fn log_context(&self) -> LogContext {
        LogContext::new("ParameterControl", &self.instance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_gain_outside_the_enumerated_set() {
        let control = ParameterControl::new("test", None);
        assert!(!control.set_gain(33.0));
        assert_eq!(control.gain(), 100.0);
    }

    #[test]
    fn accepts_and_stores_an_enumerated_gain() {
        let control = ParameterControl::new("test", None);
        assert!(control.set_gain(200.0));
        assert_eq!(control.gain(), 200.0);
    }

    #[test]
    fn filter_change_emits_an_audit_event() {
        let bus = EventBus::new("params_test");
        let audit = std::sync::Arc::new(super::super::event_bus::EventAuditHandler::new(
            "audit",
            super::super::events::EventPriority::Debug,
        ));
        bus.register_handler(audit.clone());
        bus.start();

        let control = ParameterControl::new("test", Some(std::sync::Arc::new(bus)));
        control.set_filters(FilterSelection {
            hpf: FilterVariant::Hpf05Hz,
            lpf: FilterVariant::Lpf35Hz,
            notch_enabled: false,
        });

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(audit.stats().total_events, 1);
    }
}
