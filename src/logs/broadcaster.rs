//! Shared in-memory log buffer with snapshot fan-out to subscribers.
//!
//! Every `log` call appends to a bounded buffer and then hands the complete
//! retained sequence to each live subscriber, so a viewer that subscribes
//! late renders correctly from its first notification. No lock is held while
//! callbacks run; a callback that logs again has its notification queued
//! behind the round that is currently being delivered.

use parking_lot::Mutex;
use serde_json::Value;
use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

use crate::logs::entry::{LogEntry, LogLevel};

pub const DEFAULT_LOG_CAPACITY: usize = 1000;

type Callback = dyn Fn(&[LogEntry]) + Send + Sync;

struct Subscriber {
    id: u64,
    live: AtomicBool,
    callback: Box<Callback>,
}

struct BufferState {
    entries: VecDeque<LogEntry>,
    subscribers: Vec<Arc<Subscriber>>,
    dispatching: bool,
    pending: bool,
}

impl BufferState {
    fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Process-wide diagnostic log. Create one at startup and share it by `Arc`.
pub struct LogBroadcaster {
    capacity: usize,
    state: Mutex<BufferState>,
    next_id: AtomicU64,
}

impl LogBroadcaster {
    /// Create a broadcaster retaining at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(BufferState {
                entries: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
                subscribers: Vec::new(),
                dispatching: false,
                pending: false,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Current retained entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.state.lock().snapshot()
    }

    /// Record an entry and notify every live subscriber with the full snapshot.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, details: Option<Value>) {
        let entry = LogEntry::new(level, message, details);
        mirror_to_tracing(&entry);

        {
            let mut state = self.state.lock();
            state.entries.push_back(entry);
            while state.entries.len() > self.capacity {
                state.entries.pop_front();
            }

            if state.dispatching {
                // Picked up by the round already in flight
                state.pending = true;
                return;
            }
            state.dispatching = true;
        }

        self.dispatch();
    }

    pub fn info(&self, message: impl Into<String>, details: Option<Value>) {
        self.log(LogLevel::Info, message, details);
    }

    pub fn warn(&self, message: impl Into<String>, details: Option<Value>) {
        self.log(LogLevel::Warn, message, details);
    }

    pub fn error(&self, message: impl Into<String>, details: Option<Value>) {
        self.log(LogLevel::Error, message, details);
    }

    pub fn debug(&self, message: impl Into<String>, details: Option<Value>) {
        self.log(LogLevel::Debug, message, details);
    }

    /// Register a callback. It is invoked once right away with the current
    /// snapshot and then after every subsequent `log` until unsubscribed.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&[LogEntry]) + Send + Sync + 'static,
    {
        let subscriber = Arc::new(Subscriber {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            live: AtomicBool::new(true),
            callback: Box::new(callback),
        });

        let snapshot = {
            let mut state = self.state.lock();
            state.subscribers.push(Arc::clone(&subscriber));
            state.snapshot()
        };
        debug!(subscriber = subscriber.id, "Log subscriber registered");

        deliver(&subscriber, &snapshot);

        Subscription {
            subscriber,
            broadcaster: Arc::downgrade(self),
        }
    }

    fn dispatch(&self) {
        loop {
            let (snapshot, subscribers) = {
                let state = self.state.lock();
                (state.snapshot(), state.subscribers.clone())
            };

            for subscriber in &subscribers {
                deliver(subscriber, &snapshot);
            }

            let mut state = self.state.lock();
            if state.pending {
                state.pending = false;
                continue;
            }
            state.dispatching = false;
            break;
        }
    }

    fn remove(&self, id: u64) {
        self.state.lock().subscribers.retain(|s| s.id != id);
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl fmt::Debug for LogBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LogBroadcaster")
            .field("capacity", &self.capacity)
            .field("entries", &state.entries.len())
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

thread_local! {
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is running a subscriber callback. Panics
/// raised there are caught by the broadcaster, so process-wide panic hooks
/// can use this to leave shared state such as the terminal alone.
pub fn in_delivery() -> bool {
    DELIVERING.with(Cell::get)
}

struct DeliveryGuard {
    previous: bool,
}

impl DeliveryGuard {
    fn enter() -> Self {
        Self {
            previous: DELIVERING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for DeliveryGuard {
    fn drop(&mut self) {
        DELIVERING.with(|flag| flag.set(self.previous));
    }
}

fn deliver(subscriber: &Subscriber, snapshot: &[LogEntry]) {
    if !subscriber.live.load(Ordering::SeqCst) {
        return;
    }

    let result = {
        let _guard = DeliveryGuard::enter();
        panic::catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(snapshot)))
    };
    if result.is_err() {
        warn!(subscriber = subscriber.id, "Log subscriber panicked, continuing delivery");
    }
}

fn mirror_to_tracing(entry: &LogEntry) {
    let details = entry
        .details
        .as_ref()
        .map(|d| d.to_string())
        .unwrap_or_default();

    match entry.level {
        LogLevel::Info => info!(target: "flowchat::logs", details = %details, "{}", entry.message),
        LogLevel::Warn => warn!(target: "flowchat::logs", details = %details, "{}", entry.message),
        LogLevel::Error => error!(target: "flowchat::logs", details = %details, "{}", entry.message),
        LogLevel::Debug => debug!(target: "flowchat::logs", details = %details, "{}", entry.message),
    }
}

/// Handle returned by [`LogBroadcaster::subscribe`].
#[must_use = "dropping the handle leaves the callback registered; call unsubscribe() to stop it"]
pub struct Subscription {
    subscriber: Arc<Subscriber>,
    broadcaster: Weak<LogBroadcaster>,
}

impl Subscription {
    /// Stop notifications. Safe to call more than once, and from inside any
    /// subscriber callback.
    pub fn unsubscribe(&self) {
        if !self.subscriber.live.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.remove(self.subscriber.id);
        }
        debug!(subscriber = self.subscriber.id, "Log subscriber removed");
    }

    pub fn is_active(&self) -> bool {
        self.subscriber.live.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.subscriber.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn messages(entries: &[LogEntry]) -> Vec<String> {
        entries.iter().map(|e| e.message.clone()).collect()
    }

    fn recorder() -> (Arc<Mutex<Vec<Vec<String>>>>, impl Fn(&[LogEntry]) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |entries: &[LogEntry]| sink.lock().push(messages(entries)))
    }

    #[test]
    fn test_subscribe_delivers_initial_snapshot() {
        let logs = Arc::new(LogBroadcaster::new(10));
        logs.info("first", None);

        let (seen, callback) = recorder();
        let sub = logs.subscribe(callback);

        assert_eq!(*seen.lock(), vec![vec!["first".to_string()]]);
        assert_eq!(logs.subscriber_count(), 1);
        sub.unsubscribe();
    }

    #[test]
    fn test_log_pushes_full_snapshot_in_order() {
        let logs = Arc::new(LogBroadcaster::new(10));
        let (seen, callback) = recorder();
        let _sub = logs.subscribe(callback);

        logs.info("a", None);
        logs.warn("b", Some(json!({"k": 1})));
        logs.error("c", None);

        let seen = seen.lock();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].is_empty());
        assert_eq!(seen[3], vec!["a", "b", "c"]);
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let logs = Arc::new(LogBroadcaster::new(3));
        let (seen, callback) = recorder();
        let _sub = logs.subscribe(callback);

        for i in 0..5 {
            logs.debug(format!("m{}", i), None);
        }

        assert_eq!(logs.len(), 3);
        assert_eq!(messages(&logs.entries()), vec!["m2", "m3", "m4"]);
        assert_eq!(seen.lock().last().unwrap(), &vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_late_subscriber_sees_retained_history() {
        let logs = Arc::new(LogBroadcaster::new(2));
        logs.info("one", None);
        logs.info("two", None);
        logs.info("three", None);

        let (seen, callback) = recorder();
        let _sub = logs.subscribe(callback);
        logs.info("four", None);

        let seen = seen.lock();
        assert_eq!(seen[0], vec!["two", "three"]);
        assert_eq!(seen[1], vec!["three", "four"]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let logs = LogBroadcaster::new(0);
        assert_eq!(logs.capacity(), 1);
        logs.info("x", None);
        logs.info("y", None);
        assert_eq!(messages(&logs.entries()), vec!["y"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_final() {
        let logs = Arc::new(LogBroadcaster::new(10));
        let (seen, callback) = recorder();
        let sub = logs.subscribe(callback);

        logs.info("before", None);
        sub.unsubscribe();
        sub.unsubscribe();
        logs.info("after", None);

        assert!(!sub.is_active());
        assert_eq!(logs.subscriber_count(), 0);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_unsubscribe_during_broadcast_stops_later_subscriber() {
        let logs = Arc::new(LogBroadcaster::new(10));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let victim_handle = Arc::clone(&victim);
        let _killer = logs.subscribe(move |entries| {
            if !entries.is_empty() {
                if let Some(sub) = victim_handle.lock().as_ref() {
                    sub.unsubscribe();
                }
            }
        });

        let (seen, callback) = recorder();
        *victim.lock() = Some(logs.subscribe(callback));

        logs.info("trigger", None);

        // Only the initial snapshot reached the victim
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(logs.subscriber_count(), 1);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let logs = Arc::new(LogBroadcaster::new(10));
        let _bad = logs.subscribe(|entries| {
            if !entries.is_empty() {
                panic!("viewer exploded");
            }
        });
        let (seen, callback) = recorder();
        let _good = logs.subscribe(callback);

        logs.error("boom", None);
        logs.info("still alive", None);

        assert_eq!(logs.len(), 2);
        assert_eq!(seen.lock().last().unwrap(), &vec!["boom", "still alive"]);
    }

    #[test]
    fn test_delivery_flag_is_scoped_to_callbacks() {
        let logs = Arc::new(LogBroadcaster::new(10));
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let _sub = logs.subscribe(move |entries| {
            sink.lock().push(in_delivery());
            if !entries.is_empty() {
                panic!("viewer exploded");
            }
        });

        assert!(!in_delivery());
        logs.info("first", None);
        assert!(!in_delivery());

        assert_eq!(*observed.lock(), vec![true, true]);
    }

    #[test]
    fn test_reentrant_log_is_delivered_after_current_round() {
        let logs = Arc::new(LogBroadcaster::new(10));
        let nested_done = Arc::new(AtomicBool::new(false));

        let inner_logs = Arc::clone(&logs);
        let flag = Arc::clone(&nested_done);
        let _echo = logs.subscribe(move |entries| {
            let outer_seen = entries.last().map(|e| e.message == "outer").unwrap_or(false);
            if outer_seen && !flag.swap(true, Ordering::SeqCst) {
                inner_logs.debug("nested", None);
            }
        });

        let (seen, callback) = recorder();
        let _watcher = logs.subscribe(callback);

        logs.info("outer", None);

        let seen = seen.lock();
        // initial, the "outer" round, then the deferred "nested" round
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], vec!["outer"]);
        assert_eq!(seen[2], vec!["outer", "nested"]);
        assert_eq!(messages(&logs.entries()), vec!["outer", "nested"]);
    }

    #[test]
    fn test_subscription_outlives_broadcaster() {
        let logs = Arc::new(LogBroadcaster::new(4));
        let sub = logs.subscribe(|_| {});
        drop(logs);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
