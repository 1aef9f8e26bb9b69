// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Link manager: session lifecycle, heartbeat, receive loop and watchdog.
//!
//! A [`Link`] is a cheaply clonable handle to one UDP session with the
//! flight controller. Opening a link spawns three threads: a sender
//! streaming the current setpoint every 20 ms, a receiver decoding inbound
//! telemetry, and a watchdog that force-closes the link after 2000 ms of
//! silence. The link is optimistic: `open` returns before any packet has
//! been exchanged.

mod telemetry;
mod transport;

use crate::config::{
    CONNECTION_TIMEOUT, DEFAULT_HOST, HEARTBEAT_INTERVAL, NONCE_MASK, RECV_BUFFER_LEN,
    STABLE_WINDOW, UDP_PORT, WATCHDOG_TICK,
};
use crate::error::{Error, Result};
use crate::event::{Event, EventBus, EventPayload, StatusUpdate};
use crate::protocol::{self, BufferReader, Control, Status, WirePacket, STATUS_PACKET_ID};
use crate::registry::RegistryClient;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use telemetry::{connection_strength, Telemetry};
use transport::UdpEndpoint;

// ============================================================================
// Shared Session State
// ============================================================================

/// State shared by the link handle and its three threads.
pub(crate) struct LinkShared {
    endpoint: UdpEndpoint,
    host: String,
    http_root: String,
    /// 24-bit outgoing sequence counter. The backing u32 wraps at 2^32,
    /// a multiple of 2^24, so the masked sequence has no gaps.
    nonce: AtomicU32,
    setpoint: ArcSwap<Control>,
    telemetry: ArcSwap<Telemetry>,
    opened_at: Instant,
    closed: AtomicBool,
    bus: EventBus,
    registry: RegistryClient,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl LinkShared {
    fn next_nonce(&self) -> u32 {
        self.nonce.fetch_add(1, Ordering::Relaxed) & NONCE_MASK
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn send_frame<P: WirePacket>(&self, packet: &P) -> Result<()> {
        let frame = protocol::serialize(packet, self.next_nonce())?;
        self.endpoint.send(&frame)
    }

    /// Elapsed time since the last status packet, or since open when none
    /// has arrived yet.
    fn silence(&self) -> std::time::Duration {
        self.telemetry
            .load()
            .last_status
            .unwrap_or(self.opened_at)
            .elapsed()
    }

    /// Stop all loops and shut the bus down. Joins every link thread except
    /// the calling one, so the watchdog can close the link it runs on.
    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!("[LINK] closing {}", self.host);
        self.bus.shutdown();
        let current = std::thread::current().id();
        for handle in self.threads.lock().drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                log::warn!("[LINK] thread panicked during close");
            }
        }
    }
}

// ===== Sender Loop =====

fn run_sender(shared: &LinkShared) {
    while !shared.is_closed() {
        let setpoint = shared.setpoint.load_full();
        if let Err(err) = shared.send_frame(setpoint.as_ref()) {
            // Heartbeat resends fresh state next cycle.
            log::warn!("[LINK] heartbeat send failed: {}", err);
        }
        std::thread::sleep(HEARTBEAT_INTERVAL);
    }
    log::debug!("[LINK] sender exiting");
}

// ===== Receiver Loop =====

fn run_receiver(shared: &LinkShared) {
    let mut buf = [0u8; RECV_BUFFER_LEN];
    while !shared.is_closed() {
        let len = match shared.endpoint.recv(&mut buf) {
            Ok(Some(len)) => len,
            Ok(None) => continue,
            Err(err) => {
                log::warn!("[LINK] receive failed: {}", err);
                continue;
            }
        };

        let mut reader = BufferReader::new(&buf[..len]);
        let header = match protocol::read_header(&mut reader) {
            Ok(header) => header,
            Err(_) => continue,
        };
        // Inbound nonce is parsed but not validated.
        match header.packet_id {
            STATUS_PACKET_ID => handle_status(shared, &mut reader),
            other => log::debug!("[LINK] ignoring unknown packet id {}", other),
        }
    }
    log::debug!("[LINK] receiver exiting");
}

fn handle_status(shared: &LinkShared, reader: &mut BufferReader<'_>) {
    let mut status = Status::default();
    if protocol::deserialize(reader, &mut status).is_err() {
        // Truncated payload; drop the frame.
        return;
    }
    // Firmware reports loop time in seconds; publish milliseconds.
    status.fc_loop_time *= 1000.0;

    let now = Instant::now();
    shared.telemetry.store(Arc::new(Telemetry {
        battery: status.battery,
        rssi: status.rssi,
        last_status: Some(now),
    }));

    shared.bus.dispatch_async(Event::new(EventPayload::StatusUpdate(StatusUpdate {
        battery: status.battery,
        rssi: status.rssi,
        fc_loop_time: status.fc_loop_time,
        angle_x: status.angle_x,
        angle_y: status.angle_y,
        angle_z: status.angle_z,
        received_at: now,
    })));
}

// ===== Watchdog Loop =====

fn run_watchdog(shared: &LinkShared) {
    let mut since_check = std::time::Duration::ZERO;
    loop {
        std::thread::sleep(WATCHDOG_TICK);
        if shared.is_closed() {
            break;
        }
        since_check += WATCHDOG_TICK;
        if since_check < CONNECTION_TIMEOUT {
            continue;
        }
        since_check = std::time::Duration::ZERO;

        if shared.silence() > CONNECTION_TIMEOUT {
            log::warn!(
                "[LINK] no status for {:?}, closing {}",
                shared.silence(),
                shared.host
            );
            // Close first so handlers observe a dead link; the timeout event
            // fires synchronously on this thread, exactly once.
            shared.close();
            if let Err(err) = shared.bus.dispatch(Event::new(EventPayload::ConnectionTimeout)) {
                log::warn!("[LINK] timeout dispatch: {}", err);
            }
            break;
        }
    }
    log::debug!("[LINK] watchdog exiting");
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for a [`Link`], for when the defaults don't fit.
pub struct LinkBuilder {
    host: String,
    port: u16,
}

impl LinkBuilder {
    /// Override the flight controller's UDP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Resolve, bind and spawn the session threads.
    pub fn build(self) -> Result<Link> {
        let endpoint = UdpEndpoint::open(&self.host, self.port)?;
        let http_root = format!("http://{}", self.host);
        let registry = RegistryClient::new(http_root.clone())?;

        let shared = Arc::new(LinkShared {
            endpoint,
            host: self.host,
            http_root,
            nonce: AtomicU32::new(0),
            setpoint: ArcSwap::from_pointee(Control::neutral()),
            telemetry: ArcSwap::from_pointee(Telemetry::default()),
            opened_at: Instant::now(),
            closed: AtomicBool::new(false),
            bus: EventBus::new(),
            registry,
            threads: Mutex::new(Vec::new()),
        });
        shared.bus.attach(&shared);

        let mut threads = Vec::with_capacity(3);
        for (name, body) in [
            ("quadlink-send", run_sender as fn(&LinkShared)),
            ("quadlink-recv", run_receiver as fn(&LinkShared)),
            ("quadlink-watchdog", run_watchdog as fn(&LinkShared)),
        ] {
            let worker = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(name.to_owned())
                .spawn(move || body(&worker));
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(e) => {
                    // Stop any loop that already started before bailing out.
                    shared.closed.store(true, Ordering::Release);
                    return Err(Error::Connection(format!("spawn {} failed: {}", name, e)));
                }
            }
        }
        *shared.threads.lock() = threads;

        log::info!(
            "[LINK] opened {} -> {}",
            shared.host,
            shared.endpoint.remote()
        );
        Ok(Link { shared })
    }
}

// ============================================================================
// Link Handle
// ============================================================================

/// Handle to one control-link session.
///
/// Clones share the same session. The link keeps running until
/// [`close`](Link::close) is called or the watchdog times out; dropping the
/// last handle does not stop the threads.
#[derive(Clone)]
pub struct Link {
    shared: Arc<LinkShared>,
}

impl Link {
    /// Open a link to `host` on the default port.
    pub fn open(host: &str) -> Result<Link> {
        Self::builder(host).build()
    }

    /// Open a link to the well-known `hackquad.local` hostname.
    pub fn open_default() -> Result<Link> {
        Self::open(DEFAULT_HOST)
    }

    /// Start building a link to `host`.
    pub fn builder(host: &str) -> LinkBuilder {
        LinkBuilder {
            host: host.to_owned(),
            port: UDP_PORT,
        }
    }

    pub(crate) fn from_shared(shared: Arc<LinkShared>) -> Link {
        Link { shared }
    }

    /// Replace the streamed setpoint. Validates before anything is sent: a
    /// negative throttle is refused and the previous setpoint stays active.
    pub fn set_control(
        &self,
        throttle: f32,
        pitch: f32,
        roll: f32,
        yaw_rate: f32,
        clear_panic: bool,
    ) -> Result<()> {
        let control = Control::new(throttle, pitch, roll, yaw_rate, clear_panic)?;
        self.shared.setpoint.store(Arc::new(control));
        Ok(())
    }

    /// Current setpoint snapshot.
    pub fn control(&self) -> Control {
        self.shared.setpoint.load().as_ref().clone()
    }

    /// Serialize and send one packet immediately, outside the heartbeat.
    pub fn send<P: WirePacket>(&self, packet: &P) -> Result<()> {
        if self.shared.is_closed() {
            return Err(Error::Connection("link is closed".into()));
        }
        self.shared.send_frame(packet)
    }

    /// Battery voltage from the last status packet, 0.0 before the first.
    pub fn battery(&self) -> f32 {
        self.shared.telemetry.load().battery
    }

    /// RSSI from the last status packet, 0 before the first.
    pub fn rssi(&self) -> i8 {
        self.shared.telemetry.load().rssi
    }

    /// Signal bars 0..=4 derived from the last RSSI.
    pub fn connection_strength(&self) -> u8 {
        connection_strength(self.shared.telemetry.load().rssi)
    }

    /// True while status packets keep arriving within the stability window.
    /// False before the first status packet.
    pub fn is_connection_stable(&self) -> bool {
        self.shared
            .telemetry
            .load()
            .last_status
            .map(|at| at.elapsed() < STABLE_WINDOW)
            .unwrap_or(false)
    }

    /// The event bus for this session.
    pub fn events(&self) -> &EventBus {
        &self.shared.bus
    }

    /// The registry client for this session's flight controller.
    pub fn registry(&self) -> &RegistryClient {
        &self.shared.registry
    }

    /// Hostname or address the link was opened with.
    pub fn host(&self) -> &str {
        &self.shared.host
    }

    /// Root URL of the flight controller's HTTP services.
    pub fn http_root(&self) -> &str {
        &self.shared.http_root
    }

    /// Ask the firmware to recalibrate its IMU. Fire-and-forget.
    pub fn calibrate(&self) {
        self.shared.registry.calibrate();
    }

    /// True once the link has been closed (by the caller or the watchdog).
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Close the session: stop the heartbeat, receiver and watchdog, shut
    /// the event bus down. Idempotent; subsequent sends fail with
    /// `Error::Connection`.
    pub fn close(&self) {
        self.shared.close();
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("host", &self.shared.host)
            .field("remote", &self.shared.endpoint.remote())
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_wraps_without_gaps_on_the_wire() {
        let peer = std::net::UdpSocket::bind("127.0.0.1:0").expect("peer bind");
        peer.set_read_timeout(Some(std::time::Duration::from_millis(500)))
            .expect("peer timeout");
        let port = peer.local_addr().expect("peer addr").port();

        let link = Link::builder("127.0.0.1").port(port).build().expect("open");
        // Seed the live counter just below the wrap point. A heartbeat or two
        // may already have consumed nonces 0/1 before the store lands.
        link.shared.nonce.store(NONCE_MASK - 1, Ordering::Relaxed);

        let mut buf = [0u8; 64];
        let mut nonces = Vec::new();
        while nonces.len() < 10 {
            let (len, _) = peer.recv_from(&mut buf).expect("heartbeat within timeout");
            assert!(len >= 4);
            nonces.push(
                u32::from(buf[1]) | (u32::from(buf[2]) << 8) | (u32::from(buf[3]) << 16),
            );
        }
        link.close();

        let seed_at = nonces
            .iter()
            .position(|&n| n == NONCE_MASK - 1)
            .expect("seeded nonce reached the wire");
        assert_eq!(nonces[seed_at + 1], NONCE_MASK);
        assert_eq!(nonces[seed_at + 2], 0);
        assert_eq!(nonces[seed_at + 3], 1);
    }

    #[test]
    fn test_set_control_rejects_negative_throttle() {
        let link = Link::builder("127.0.0.1").port(45991).build().expect("open");
        let err = link.set_control(-1.0, 0.0, 0.0, 0.0, false);
        assert!(matches!(err, Err(Error::Validation(_))));
        // Previous (neutral) setpoint still active.
        assert_eq!(link.control().throttle(), 0.0);
        link.close();
    }

    #[test]
    fn test_set_control_swaps_snapshot() {
        let link = Link::builder("127.0.0.1").port(45992).build().expect("open");
        link.set_control(0.5, 0.1, -0.1, 0.2, false).expect("valid");
        let ctrl = link.control();
        assert_eq!(ctrl.throttle(), 0.5);
        assert_eq!(ctrl.pitch, 0.1);
        link.close();
    }

    #[test]
    fn test_send_after_close_fails() {
        let link = Link::builder("127.0.0.1").port(45993).build().expect("open");
        link.close();
        let err = link.send(&Control::neutral());
        assert!(matches!(err, Err(Error::Connection(_))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let link = Link::builder("127.0.0.1").port(45994).build().expect("open");
        link.close();
        link.close();
        assert!(link.is_closed());
    }

    #[test]
    fn test_not_stable_before_first_status() {
        let link = Link::builder("127.0.0.1").port(45995).build().expect("open");
        assert!(!link.is_connection_stable());
        assert_eq!(link.battery(), 0.0);
        assert_eq!(link.connection_strength(), 4);
        link.close();
    }

    #[test]
    fn test_http_root_derived_from_host() {
        let link = Link::builder("127.0.0.1").port(45996).build().expect("open");
        assert_eq!(link.host(), "127.0.0.1");
        assert_eq!(link.http_root(), "http://127.0.0.1");
        assert_eq!(link.registry().root(), "http://127.0.0.1");
        link.close();
    }
}
