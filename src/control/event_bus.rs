// src/control/event_bus.rs
//
// An unbounded crossbeam channel, a dedicated processing thread
// selecting between a stop signal and incoming events, and an
// `EventHandler` trait dispatch with priority filtering. Carries
// `AuditEvent`.

use crossbeam::channel::{select, unbounded, Receiver, Sender};

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, RwLock,
};

use crate::core::error::{CoreError, CoreResult};
use crate::core::lock::{lock_mutex, lock_rwlock_read, lock_rwlock_write};
use crate::core::logging::{ComponentLogger, LogContext};

use super::events::{AuditEvent, AuditEventKind, EventPriority};

pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &AuditEvent);
    fn name(&self) -> &str;

    fn priority_filter(&self) -> Option<EventPriority> {
        None
    }
}

pub struct EventBus {
    name: String,
    event_tx: Sender<AuditEvent>,
    event_rx: Receiver<AuditEvent>,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
    running: Arc<AtomicBool>,
    event_count: Arc<AtomicU64>,
    thread_handle: std::sync::Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl EventBus {
    pub fn new(name: &str) -> Self {
        let (event_tx, event_rx) = unbounded();
        let (stop_tx, stop_rx) = unbounded();
        let bus = Self {
            name: name.to_string(),
            event_tx,
            event_rx,
            stop_tx,
            stop_rx,
            handlers: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            event_count: Arc::new(AtomicU64::new(0)),
            thread_handle: std::sync::Mutex::new(None),
        };
        bus.info(&format!("event bus '{}' created", name));
        bus
    }

    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let event_rx = self.event_rx.clone();
        let stop_rx = self.stop_rx.clone();
        let handlers = self.handlers.clone();
        let running = self.running.clone();
        let event_count = self.event_count.clone();
        let name = self.name.clone();

        let handle = std::thread::spawn(move || {
            processing_loop(name, event_rx, stop_rx, handlers, running, event_count);
        });
        *lock_mutex(&self.thread_handle, "event_bus.start") = Some(handle);
        self.info("event bus started");
    }

    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.stop_tx.send(());
        if let Some(handle) = lock_mutex(&self.thread_handle, "event_bus.stop").take() {
            let _ = handle.join();
        }
        self.info("event bus stopped");
    }

    pub fn publish(&self, event: AuditEvent) -> CoreResult<()> {
        self.event_count.fetch_add(1, Ordering::Relaxed);
        match event.priority {
            EventPriority::Critical | EventPriority::Error => {
                self.error(&format!("{:?}: {}", event.kind, event.payload))
            }
            EventPriority::Warning => self.warn(&format!("{:?}: {}", event.kind, event.payload)),
            _ => self.debug(&format!("{:?}: {}", event.kind, event.payload)),
        }
        self.event_tx
            .send(event)
            .map_err(|e| CoreError::message(format!("event bus send failed: {e}")))
    }

    pub fn register_handler(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = lock_rwlock_write(&self.handlers, "event_bus.register_handler");
        self.info(&format!("registered handler '{}'", handler.name()));
        handlers.push(handler);
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }
}

impl ComponentLogger for EventBus {
    fn log_context(&self) -> LogContext {
        LogContext::new("EventBus", &self.name)
    }
}

fn processing_loop(
    name: String,
    event_rx: Receiver<AuditEvent>,
    stop_rx: Receiver<()>,
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
    running: Arc<AtomicBool>,
    event_count: Arc<AtomicU64>,
) {
    let logger = EventBusLogger { name };
    while running.load(Ordering::Relaxed) {
        select! {
            recv(stop_rx) -> _ => break,
            recv(event_rx) -> msg => {
                let event = match msg {
                    Ok(e) => e,
                    Err(_) => break,
                };
                let handlers_guard = lock_rwlock_read(&handlers, "event_bus.processing_loop");
                for handler in handlers_guard.iter() {
                    if let Some(min) = handler.priority_filter() {
                        if event.priority < min {
                            continue;
                        }
                    }
                    handler.handle_event(&event);
                }
            }
        }
        let count = event_count.load(Ordering::Relaxed);
        if count > 0 && count % 1000 == 0 {
            logger.info(&format!("processed {} events", count));
        }
    }
}

struct EventBusLogger {
    name: String,
}

impl ComponentLogger for EventBusLogger {
    fn log_context(&self) -> LogContext {
        LogContext::new("EventBus", &self.name)
    }
}

#[derive(Debug, Default, Clone)]
pub struct EventHandlerStats {
    pub total_events: u64,
    pub events_by_kind: HashMap<String, u64>,
    pub last_event_timestamp_us: Option<i64>,
}

/// Accumulates counts per `AuditEventKind`.
pub struct EventAuditHandler {
    name: String,
    min_priority: EventPriority,
    stats: std::sync::Mutex<EventHandlerStats>,
}

impl EventAuditHandler {
    pub fn new(name: &str, min_priority: EventPriority) -> Self {
        Self {
            name: name.to_string(),
            min_priority,
            stats: std::sync::Mutex::new(EventHandlerStats::default()),
        }
    }

    pub fn stats(&self) -> EventHandlerStats {
        lock_mutex(&self.stats, "event_audit_handler.stats").clone()
    }
}

impl EventHandler for EventAuditHandler {
    fn handle_event(&self, event: &AuditEvent) {
        let mut stats = lock_mutex(&self.stats, "event_audit_handler.handle_event");
        stats.total_events += 1;
        *stats
            .events_by_kind
            .entry(format!("{:?}", event.kind))
            .or_insert(0) += 1;
        stats.last_event_timestamp_us = Some(event.timestamp_us);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority_filter(&self) -> Option<EventPriority> {
        Some(self.min_priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn published_events_reach_a_registered_handler() {
        let bus = EventBus::new("test");
        let audit = Arc::new(EventAuditHandler::new("audit", EventPriority::Debug));
        bus.register_handler(audit.clone());
        bus.start();

        bus.publish(AuditEvent::new(
            AuditEventKind::GainChange,
            "parameters",
            serde_json::json!({"gain": 100.0}),
        ))
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        bus.stop();

        let stats = audit.stats();
        assert_eq!(stats.total_events, 1);
    }

    #[test]
    fn priority_filter_drops_low_priority_events() {
        let bus = EventBus::new("test2");
        let audit = Arc::new(EventAuditHandler::new("audit", EventPriority::Error));
        bus.register_handler(audit.clone());
        bus.start();

        bus.publish(AuditEvent::new(
            AuditEventKind::MonitoringStart,
            "coordinator",
            serde_json::json!({}),
        ))
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        bus.stop();

        assert_eq!(audit.stats().total_events, 0);
    }
}
