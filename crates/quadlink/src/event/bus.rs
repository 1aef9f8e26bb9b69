// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event bus: per-kind handler lists with synchronous and pooled
//! asynchronous dispatch.

use crate::config::EVENT_WORKERS;
use crate::error::{Error, Result};
use crate::event::{Event, EventKind, EventPayload, StatusUpdate};
use crate::link::{Link, LinkShared};
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

/// Error type a handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type event handlers return.
pub type HandlerResult = std::result::Result<(), HandlerError>;

type Handler = Arc<dyn Fn(&Event) -> HandlerResult + Send + Sync>;

/// State shared between the bus handle and the worker threads.
struct BusShared {
    /// event kind -> handlers in registration order
    handlers: RwLock<HashMap<EventKind, Vec<Handler>>>,
    /// Owning link, stamped onto events at dispatch.
    origin: RwLock<Option<Weak<LinkShared>>>,
    /// Set once shutdown starts; new async tasks are refused after this.
    closed: AtomicBool,
}

impl BusShared {
    /// Run every handler registered for the event's exact kind, in
    /// registration order. A handler failure does not stop the rest; after
    /// all ran, failures are aggregated into one `Error::Dispatch`.
    fn dispatch(&self, mut event: Event) -> Result<()> {
        let origin = self
            .origin
            .read()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Link::from_shared);
        event.set_origin(origin);

        // Snapshot the handler list so handlers may subscribe re-entrantly.
        let handlers: Vec<Handler> = match self.handlers.read().get(&event.kind()) {
            Some(list) => list.clone(),
            None => return Ok(()),
        };

        let mut failures = Vec::new();
        for (index, handler) in handlers.iter().enumerate() {
            if let Err(err) = handler(&event) {
                log::warn!(
                    "[EVENT] handler {} for {:?} failed: {}",
                    index,
                    event.kind(),
                    err
                );
                failures.push(format!("handler {}: {}", index, err));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Dispatch(failures))
        }
    }
}

/// Maps event kinds to ordered handler lists and owns the async worker pool.
///
/// Synchronous [`dispatch`](EventBus::dispatch) runs on the caller's thread.
/// [`dispatch_async`](EventBus::dispatch_async) enqueues onto an unbounded
/// FIFO consumed by a fixed pool of [`EVENT_WORKERS`] threads: no ordering
/// guarantee across workers, per-worker FIFO. The queue is unbounded with no
/// drop and no timeout, so a pathological handler flood can grow it without
/// limit (known limitation).
pub struct EventBus {
    shared: Arc<BusShared>,
    tx: Mutex<Option<Sender<Event>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl EventBus {
    /// Create a bus and spawn the async worker pool.
    pub fn new() -> Self {
        let shared = Arc::new(BusShared {
            handlers: RwLock::new(HashMap::new()),
            origin: RwLock::new(None),
            closed: AtomicBool::new(false),
        });

        let (tx, rx) = unbounded::<Event>();
        let mut workers = Vec::with_capacity(EVENT_WORKERS);
        for id in 0..EVENT_WORKERS {
            match Self::spawn_worker(id, Arc::clone(&shared), rx.clone()) {
                Ok(handle) => workers.push(handle),
                // Degraded pool: remaining workers still drain the queue.
                Err(err) => log::error!("[EVENT] failed to spawn worker {}: {}", id, err),
            }
        }

        Self {
            shared,
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        }
    }

    fn spawn_worker(
        id: usize,
        shared: Arc<BusShared>,
        rx: Receiver<Event>,
    ) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(format!("quadlink-event-{}", id))
            .spawn(move || {
                // Exits when the sender is dropped and the queue drained.
                while let Ok(event) = rx.recv() {
                    if let Err(err) = shared.dispatch(event) {
                        // No caller to surface to on the async path.
                        log::warn!("[EVENT] async dispatch: {}", err);
                    }
                }
                log::debug!("[EVENT] worker {} exiting", id);
            })
    }

    /// Bind the bus to its owning link so dispatched events carry an origin.
    pub(crate) fn attach(&self, link: &Arc<LinkShared>) {
        *self.shared.origin.write() = Some(Arc::downgrade(link));
    }

    /// Register a handler for `kind`. Handlers run in registration order.
    ///
    /// Handlers used with synchronous dispatch may run on the receive loop's
    /// thread and must not block.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.shared
            .handlers
            .write()
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Convenience: subscribe to status updates with a typed callback.
    pub fn on_status_update<F>(&self, handler: F)
    where
        F: Fn(&StatusUpdate) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe(EventKind::StatusUpdate, move |event| {
            match event.payload() {
                EventPayload::StatusUpdate(status) => handler(status),
                _ => Ok(()),
            }
        });
    }

    /// Convenience: subscribe to connection timeouts with a typed callback.
    pub fn on_connection_timeout<F>(&self, handler: F)
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe(EventKind::ConnectionTimeout, handler);
    }

    /// Dispatch synchronously on the calling thread.
    ///
    /// Stamps the event's origin, then invokes every handler for the event's
    /// exact kind in registration order. One handler failing does not stop
    /// the remaining handlers; if any failed, `Error::Dispatch` carrying all
    /// failures is returned after the last handler ran.
    pub fn dispatch(&self, event: Event) -> Result<()> {
        self.shared.dispatch(event)
    }

    /// Enqueue a `dispatch` of this event on the worker pool.
    ///
    /// After [`shutdown`](EventBus::shutdown) the event is dropped with a
    /// debug log instead of being queued.
    pub fn dispatch_async(&self, event: Event) {
        if self.shared.closed.load(Ordering::Acquire) {
            log::debug!("[EVENT] bus closed, dropping async {:?}", event.kind());
            return;
        }
        if let Some(tx) = self.tx.lock().as_ref() {
            // Unbounded channel: send only fails if workers are gone.
            if tx.send(event).is_err() {
                log::warn!("[EVENT] worker pool gone, async event dropped");
            }
        }
    }

    /// Stop accepting new async tasks, let queued ones finish, and join the
    /// workers. Idempotent.
    ///
    /// Safe to call from inside a handler: a worker shutting the bus down
    /// (e.g. a handler closing the originating link) skips its own handle
    /// and exits on its own once the queue is drained.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Dropping the sender lets workers drain the queue and exit.
        self.tx.lock().take();
        let current = std::thread::current().id();
        for handle in self.workers.lock().drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                log::warn!("[EVENT] worker panicked during shutdown");
            }
        }
        log::debug!("[EVENT] bus shut down");
    }

    /// True once shutdown has started.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Instant;

    fn status_event() -> Event {
        Event::new(EventPayload::StatusUpdate(StatusUpdate {
            battery: 3.8,
            rssi: -55,
            fc_loop_time: 2.0,
            angle_x: 0.0,
            angle_y: 0.0,
            angle_z: 0.0,
            received_at: Instant::now(),
        }))
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(EventKind::StatusUpdate, move |_| {
                order.lock().push(tag);
                Ok(())
            });
        }

        bus.dispatch(status_event()).expect("no handler failed");
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
        bus.shutdown();
    }

    #[test]
    fn test_failing_handler_does_not_stop_rest() {
        let bus = EventBus::new();
        let ran = Arc::new(AtomicU32::new(0));

        bus.subscribe(EventKind::StatusUpdate, |_| Err("first blew up".into()));
        {
            let ran = Arc::clone(&ran);
            bus.subscribe(EventKind::StatusUpdate, move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        bus.subscribe(EventKind::StatusUpdate, |_| Err("third blew up".into()));

        let err = bus.dispatch(status_event());
        // Second handler still ran.
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        // Both failures aggregated.
        match err {
            Err(Error::Dispatch(failures)) => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].contains("first blew up"));
                assert!(failures[1].contains("third blew up"));
            }
            other => panic!("expected Dispatch error, got {:?}", other.map(|()| ())),
        }
        bus.shutdown();
    }

    #[test]
    fn test_dispatch_only_exact_kind() {
        let bus = EventBus::new();
        let status_count = Arc::new(AtomicU32::new(0));
        let timeout_count = Arc::new(AtomicU32::new(0));

        {
            let count = Arc::clone(&status_count);
            bus.subscribe(EventKind::StatusUpdate, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        {
            let count = Arc::clone(&timeout_count);
            bus.subscribe(EventKind::ConnectionTimeout, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        bus.dispatch(Event::new(EventPayload::ConnectionTimeout))
            .expect("dispatch");
        assert_eq!(status_count.load(Ordering::SeqCst), 0);
        assert_eq!(timeout_count.load(Ordering::SeqCst), 1);
        bus.shutdown();
    }

    #[test]
    fn test_dispatch_without_handlers_is_ok() {
        let bus = EventBus::new();
        assert!(bus.dispatch(status_event()).is_ok());
        bus.shutdown();
    }

    #[test]
    fn test_async_dispatch_runs_all_queued() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));
        {
            let count = Arc::clone(&count);
            bus.subscribe(EventKind::StatusUpdate, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        for _ in 0..50 {
            bus.dispatch_async(status_event());
        }
        // Shutdown drains the queue before joining workers.
        bus.shutdown();
        assert_eq!(count.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_async_after_shutdown_is_dropped() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));
        {
            let count = Arc::clone(&count);
            bus.subscribe(EventKind::StatusUpdate, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        bus.shutdown();
        bus.dispatch_async(status_event());
        // Give a dropped task a moment to (incorrectly) run.
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(bus.is_closed());
    }

    #[test]
    fn test_shutdown_from_worker_thread_returns() {
        let bus = Arc::new(EventBus::new());
        let done = Arc::new(AtomicU32::new(0));
        {
            let handler_bus = Arc::clone(&bus);
            let done = Arc::clone(&done);
            bus.subscribe(EventKind::StatusUpdate, move |_| {
                // Shutting down from the dispatching worker must not join it.
                handler_bus.shutdown();
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        bus.dispatch_async(status_event());

        let deadline = Instant::now() + std::time::Duration::from_secs(3);
        while done.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(
            done.load(Ordering::SeqCst),
            1,
            "handler never returned from shutdown"
        );
        assert!(bus.is_closed());
        // Second shutdown from the outside is still fine.
        bus.shutdown();
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let bus = EventBus::new();
        bus.shutdown();
        bus.shutdown();
        assert!(bus.is_closed());
    }

    #[test]
    fn test_typed_status_subscription() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            bus.on_status_update(move |status| {
                *seen.lock() = Some((status.battery, status.rssi));
                Ok(())
            });
        }

        bus.dispatch(status_event()).expect("dispatch");
        assert_eq!(*seen.lock(), Some((3.8, -55)));
        bus.shutdown();
    }

    #[test]
    fn test_detached_bus_events_have_no_origin() {
        let bus = EventBus::new();
        let saw_origin = Arc::new(AtomicU32::new(0));
        {
            let saw_origin = Arc::clone(&saw_origin);
            bus.subscribe(EventKind::ConnectionTimeout, move |event| {
                if event.origin().is_some() {
                    saw_origin.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            });
        }
        bus.dispatch(Event::new(EventPayload::ConnectionTimeout))
            .expect("dispatch");
        assert_eq!(saw_origin.load(Ordering::SeqCst), 0);
        bus.shutdown();
    }
}
