// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol constants shared across the crate.
//!
//! Timer periods and the UDP port are part of the wire contract with the
//! flight controller firmware and must match it exactly.

use std::time::Duration;

/// Well-known mDNS hostname of the flight controller when no address is given.
pub const DEFAULT_HOST: &str = "hackquad.local";

/// UDP port the flight controller listens on for control packets.
pub const UDP_PORT: u16 = 25565;

/// Delay between outbound control heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(20);

/// How long after the last status packet `is_connection_stable` stays true.
pub const STABLE_WINDOW: Duration = Duration::from_millis(500);

/// How long the link may go without a status packet before the watchdog
/// force-closes it.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_millis(2000);

/// Fixed receive buffer size. Inbound packets must fit.
pub const RECV_BUFFER_LEN: usize = 256;

/// Socket read timeout for the receive loop. Bounds how long `close()` can
/// take to unblock the receiver.
pub const RECV_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Sleep granularity of the watchdog loop so `close()` is observed promptly.
pub const WATCHDOG_TICK: Duration = Duration::from_millis(200);

/// Number of threads pooled for asynchronous event dispatch.
pub const EVENT_WORKERS: usize = 2;

/// The outgoing nonce is a 24-bit counter, wrapping at 2^24.
pub const NONCE_MASK: u32 = 0x00FF_FFFF;

/// Request timeout for the registry HTTP client.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchdog_tick_divides_timeout() {
        // The watchdog accumulates ticks up to the hard timeout.
        let ticks = CONNECTION_TIMEOUT.as_millis() / WATCHDOG_TICK.as_millis();
        assert_eq!(ticks * WATCHDOG_TICK.as_millis(), CONNECTION_TIMEOUT.as_millis());
    }

    #[test]
    fn test_nonce_mask_is_24_bits() {
        assert_eq!(NONCE_MASK, (1 << 24) - 1);
    }
}
