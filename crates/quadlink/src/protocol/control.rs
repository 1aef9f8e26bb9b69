// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound control packet: the setpoint heartbeat sent every 20 ms.

use crate::error::{Error, Result};
use crate::protocol::packet::{FieldDef, FieldValue, NativeType, WirePacket};

/// Wire id of the outbound control packet.
pub const CONTROL_PACKET_ID: u8 = 69;

/// Control setpoint sent to the flight controller.
///
/// The stored throttle is always non-negative; the clear-panic flag is a
/// separate bool. On the wire the flag is encoded by negating the throttle's
/// sign bit (the firmware treats a negative throttle as "clear panic state",
/// using the magnitude as the actual throttle). Decoding reverses this, so
/// the stored invariant is never violated in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    throttle: f32,
    /// Pitch setpoint.
    pub pitch: f32,
    /// Roll setpoint.
    pub roll: f32,
    /// Yaw rate setpoint.
    pub yaw_rate: f32,
    clear_panic: bool,
}

impl Control {
    /// Create a control setpoint. Fails with `Error::Validation` if the
    /// throttle is negative, before any encoding happens.
    pub fn new(
        throttle: f32,
        pitch: f32,
        roll: f32,
        yaw_rate: f32,
        clear_panic: bool,
    ) -> Result<Self> {
        if throttle < 0.0 {
            return Err(Error::Validation(format!(
                "negative throttle {} is not acceptable",
                throttle
            )));
        }
        Ok(Self {
            throttle,
            pitch,
            roll,
            yaw_rate,
            clear_panic,
        })
    }

    /// All-zero setpoint with the panic flag clear. This is what the link
    /// streams until the application sets a control.
    pub fn neutral() -> Self {
        Self {
            throttle: 0.0,
            pitch: 0.0,
            roll: 0.0,
            yaw_rate: 0.0,
            clear_panic: false,
        }
    }

    /// Stored (non-negative) throttle.
    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    /// Whether the clear-panic flag is set.
    pub fn clear_panic(&self) -> bool {
        self.clear_panic
    }

    /// Throttle as it goes on the wire: sign bit carries the clear-panic flag.
    fn wire_throttle(&self) -> f32 {
        if self.clear_panic {
            -self.throttle
        } else {
            self.throttle
        }
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::neutral()
    }
}

impl WirePacket for Control {
    const PACKET_ID: u8 = CONTROL_PACKET_ID;
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef {
            name: "throttle",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.wire_throttle()),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.clear_panic = x.is_sign_negative();
                    p.throttle = x.abs();
                }
            },
        },
        FieldDef {
            name: "pitch",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.pitch),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.pitch = x;
                }
            },
        },
        FieldDef {
            name: "roll",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.roll),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.roll = x;
                }
            },
        },
        FieldDef {
            name: "yawRate",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.yaw_rate),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.yaw_rate = x;
                }
            },
        },
    ];
}
