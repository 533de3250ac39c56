// src/control/events.rs
//
// Audit event taxonomy (spec §6, nine kinds). `AuditEventKind` names
// the core's own audit surface; `payload` is a free-form
// `serde_json::Value` so handlers can carry kind-specific detail
// without a matching struct per variant.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::time::utc_us_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditEventKind {
    MonitoringStart,
    MonitoringStop,
    FilterChange,
    GainChange,
    DeviceLost,
    DeviceRestored,
    CrcError,
    SerialError,
    StorageCleanup,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EventPriority {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl AuditEventKind {
    /// Default severity for each kind; callers can still override when
    /// constructing the event.
    pub fn default_priority(self) -> EventPriority {
        match self {
            AuditEventKind::MonitoringStart | AuditEventKind::MonitoringStop => EventPriority::Info,
            AuditEventKind::FilterChange | AuditEventKind::GainChange => EventPriority::Info,
            AuditEventKind::DeviceLost => EventPriority::Error,
            AuditEventKind::DeviceRestored => EventPriority::Info,
            AuditEventKind::CrcError | AuditEventKind::SerialError => EventPriority::Warning,
            AuditEventKind::StorageCleanup => EventPriority::Info,
        }
    }
}

/// One audit record. The core publishes these to `control::event_bus`;
/// the on-disk audit log itself is out of scope (spec §1 Non-goals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: u64,
    pub timestamp_us: i64,
    pub kind: AuditEventKind,
    pub priority: EventPriority,
    pub source: String,
    pub payload: serde_json::Value,
}

impl AuditEvent {
    pub fn new(kind: AuditEventKind, source: &str, payload: serde_json::Value) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self {
            id: COUNTER.fetch_add(1, Ordering::Relaxed),
            timestamp_us: utc_us_now(),
            kind,
            priority: kind.default_priority(),
            source: source.to_string(),
            payload,
        }
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }
}
