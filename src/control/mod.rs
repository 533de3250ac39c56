// src/control/mod.rs
pub mod event_bus;
pub mod events;
pub mod parameters;

pub use event_bus::{EventAuditHandler, EventBus, EventHandler, EventHandlerStats};
pub use events::{AuditEvent, AuditEventKind, EventPriority};
pub use parameters::{FilterSelection, ParameterControl, VALID_GAINS_UV_PER_CM};
