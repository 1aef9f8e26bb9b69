// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed publish/subscribe event layer.
//!
//! Events are immutable records of a link state transition. Handlers are
//! explicit typed callbacks registered per [`EventKind`]; registration order
//! is dispatch order. Synchronous dispatch runs on the caller's thread (which
//! may be the receive loop, so handlers must not block); asynchronous
//! dispatch runs on a small fixed worker pool.

mod bus;

pub use bus::{EventBus, HandlerError, HandlerResult};

use crate::link::Link;
use std::time::Instant;

/// Kinds of events the link emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A status packet was received and telemetry was updated.
    StatusUpdate,
    /// The watchdog force-closed the link after 2000 ms of silence.
    ConnectionTimeout,
}

/// Payload of a [`EventKind::StatusUpdate`] event.
///
/// `fc_loop_time` is in milliseconds (already scaled by the receive loop).
#[derive(Debug, Clone, Copy)]
pub struct StatusUpdate {
    /// Battery voltage.
    pub battery: f32,
    /// Signed RSSI.
    pub rssi: i8,
    /// Flight controller loop time, milliseconds.
    pub fc_loop_time: f32,
    /// Attitude angle around X.
    pub angle_x: f32,
    /// Attitude angle around Y.
    pub angle_y: f32,
    /// Attitude angle around Z.
    pub angle_z: f32,
    /// When the status packet was received.
    pub received_at: Instant,
}

/// Event payload, one variant per [`EventKind`].
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Telemetry update from the firmware.
    StatusUpdate(StatusUpdate),
    /// The link timed out and was closed.
    ConnectionTimeout,
}

/// An immutable record of a link state transition, delivered to handlers.
///
/// The originating [`Link`] is stamped by the bus at dispatch time; events
/// dispatched through a bus that is not attached to a link carry no origin.
#[derive(Debug, Clone)]
pub struct Event {
    payload: EventPayload,
    origin: Option<Link>,
}

impl Event {
    /// Create an event with no origin; the bus stamps it at dispatch.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            origin: None,
        }
    }

    /// The event's kind, used for handler lookup.
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::StatusUpdate(_) => EventKind::StatusUpdate,
            EventPayload::ConnectionTimeout => EventKind::ConnectionTimeout,
        }
    }

    /// The event payload.
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// The link this event originated from, when the bus is attached.
    pub fn origin(&self) -> Option<&Link> {
        self.origin.as_ref()
    }

    pub(crate) fn set_origin(&mut self, origin: Option<Link>) {
        self.origin = origin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_payload() {
        let status = Event::new(EventPayload::StatusUpdate(StatusUpdate {
            battery: 3.7,
            rssi: -60,
            fc_loop_time: 2.1,
            angle_x: 0.0,
            angle_y: 0.0,
            angle_z: 0.0,
            received_at: Instant::now(),
        }));
        assert_eq!(status.kind(), EventKind::StatusUpdate);

        let timeout = Event::new(EventPayload::ConnectionTimeout);
        assert_eq!(timeout.kind(), EventKind::ConnectionTimeout);
    }

    #[test]
    fn test_new_event_has_no_origin() {
        let event = Event::new(EventPayload::ConnectionTimeout);
        assert!(event.origin().is_none());
    }
}
