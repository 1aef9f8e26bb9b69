// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Last-received telemetry snapshot and derived connection metrics.

use std::time::Instant;

/// Snapshot of the latest status packet, replaced atomically as a whole.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Telemetry {
    /// Battery voltage from the last status packet.
    pub battery: f32,
    /// Signed RSSI from the last status packet.
    pub rssi: i8,
    /// When the last status packet arrived. `None` until the first one.
    pub last_status: Option<Instant>,
}

/// Map an RSSI reading to a 0..=4 bar count.
///
/// RSSI is a negative dBm figure in practice; the bands are on its magnitude
/// so a reading of -55 and a (mis-signed) 55 land in the same bar.
pub(crate) fn connection_strength(rssi: i8) -> u8 {
    // i8::MIN.abs() would overflow; widen first.
    let magnitude = i32::from(rssi).abs();
    match magnitude {
        0..=49 => 4,
        50..=69 => 3,
        70..=79 => 2,
        80..=89 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_bands() {
        let cases: [(i8, u8); 10] = [
            (0, 4),
            (-49, 4),
            (-50, 3),
            (-69, 3),
            (-70, 2),
            (-79, 2),
            (-80, 1),
            (-89, 1),
            (-90, 0),
            (-128, 0),
        ];
        for (rssi, bars) in cases {
            assert_eq!(connection_strength(rssi), bars, "rssi {}", rssi);
        }
    }

    #[test]
    fn test_strength_ignores_sign() {
        assert_eq!(connection_strength(55), connection_strength(-55));
        assert_eq!(connection_strength(90), 0);
        assert_eq!(connection_strength(i8::MIN), 0);
    }

    #[test]
    fn test_default_has_no_status() {
        let t = Telemetry::default();
        assert!(t.last_status.is_none());
        assert_eq!(t.rssi, 0);
    }
}
