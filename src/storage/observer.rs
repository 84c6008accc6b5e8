//! Operation observers
//!
//! The gateway keeps no history of its own. Every finished operation is
//! reported once to an injected [`OperationObserver`]; logging and
//! aggregate counters are observers like any other.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Read,
    Write,
    Upload,
    Download,
    List,
    Metadata,
    Delete,
    Stats,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Upload => "upload",
            OperationKind::Download => "download",
            OperationKind::List => "list",
            OperationKind::Metadata => "metadata",
            OperationKind::Delete => "delete",
            OperationKind::Stats => "stats",
        };
        f.write_str(name)
    }
}

/// Record of one finished gateway operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationEvent {
    pub operation: OperationKind,
    /// Path as supplied by the caller
    pub path: String,
    pub size_bytes: u64,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: f64,
    pub success: bool,
    pub error: Option<ErrorKind>,
}

impl OperationEvent {
    pub fn new(
        operation: OperationKind,
        path: &str,
        outcome: Result<u64, ErrorKind>,
        duration: Duration,
    ) -> Self {
        let (size_bytes, error) = match outcome {
            Ok(size) => (size, None),
            Err(kind) => (0, Some(kind)),
        };
        Self {
            operation,
            path: path.to_string(),
            size_bytes,
            timestamp: Utc::now(),
            duration_ms: duration.as_secs_f64() * 1000.0,
            success: error.is_none(),
            error,
        }
    }
}

/// Sink for operation events. Called synchronously on the thread that ran
/// the operation, so implementations must be cheap and non-blocking.
pub trait OperationObserver: Send + Sync {
    fn on_operation(&self, event: &OperationEvent);
}

/// Logs every operation through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl OperationObserver for LogObserver {
    fn on_operation(&self, event: &OperationEvent) {
        match event.error {
            None => info!(
                "{} {:?} ok ({} bytes, {:.2} ms)",
                event.operation, event.path, event.size_bytes, event.duration_ms
            ),
            Some(kind) => warn!(
                "{} {:?} failed: {} ({:.2} ms)",
                event.operation, event.path, kind, event.duration_ms
            ),
        }
    }
}

/// Fans one event out to several observers, in order
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn OperationObserver>>,
}

impl ObserverSet {
    pub fn new(observers: Vec<Arc<dyn OperationObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Arc<dyn OperationObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl OperationObserver for ObserverSet {
    fn on_operation(&self, event: &OperationEvent) {
        for observer in &self.observers {
            observer.on_operation(event);
        }
    }
}

/// Running counters over every observed operation
#[derive(Debug, Default)]
pub struct OperationStats {
    files_read: AtomicU64,
    files_written: AtomicU64,
    bytes_processed: AtomicU64,
    errors: AtomicU64,
    operations: AtomicU64,
    successes: AtomicU64,
    last_operation: Mutex<Option<OperationEvent>>,
}

/// Point-in-time copy of [`OperationStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub files_read: u64,
    pub files_written: u64,
    pub bytes_processed: u64,
    pub errors: u64,
    pub operations_count: u64,
    /// Percentage of successful operations, 0 when nothing ran yet
    pub success_rate: f64,
    pub last_operation: Option<OperationEvent>,
}

impl OperationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let operations = self.operations.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        let success_rate = if operations == 0 {
            0.0
        } else {
            successes as f64 / operations as f64 * 100.0
        };
        let last_operation = match self.last_operation.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        StatsSnapshot {
            files_read: self.files_read.load(Ordering::Relaxed),
            files_written: self.files_written.load(Ordering::Relaxed),
            bytes_processed: self.bytes_processed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            operations_count: operations,
            success_rate,
            last_operation,
        }
    }
}

impl OperationObserver for OperationStats {
    fn on_operation(&self, event: &OperationEvent) {
        self.operations.fetch_add(1, Ordering::Relaxed);

        if event.success {
            self.successes.fetch_add(1, Ordering::Relaxed);
            match event.operation {
                OperationKind::Read | OperationKind::Download => {
                    self.files_read.fetch_add(1, Ordering::Relaxed);
                    self.bytes_processed
                        .fetch_add(event.size_bytes, Ordering::Relaxed);
                }
                OperationKind::Write | OperationKind::Upload => {
                    self.files_written.fetch_add(1, Ordering::Relaxed);
                    self.bytes_processed
                        .fetch_add(event.size_bytes, Ordering::Relaxed);
                }
                _ => {}
            }
        } else {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }

        let mut last = match self.last_operation.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some(event.clone());
    }
}
