// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inbound status packet: periodic telemetry from the flight controller.

use crate::protocol::packet::{FieldDef, FieldValue, NativeType, WirePacket};

/// Wire id of the inbound status packet.
pub const STATUS_PACKET_ID: u8 = 20;

/// Telemetry snapshot broadcast by the firmware.
///
/// `fc_loop_time` arrives in seconds; the receive loop scales it by 1000
/// before publishing, so handlers observe milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Status {
    /// Battery voltage.
    pub battery: f32,
    /// Received signal strength indicator, signed.
    pub rssi: i8,
    /// Flight controller main-loop time.
    pub fc_loop_time: f32,
    /// Attitude angle around X.
    pub angle_x: f32,
    /// Attitude angle around Y.
    pub angle_y: f32,
    /// Attitude angle around Z.
    pub angle_z: f32,
}

impl WirePacket for Status {
    const PACKET_ID: u8 = STATUS_PACKET_ID;
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef {
            name: "battery",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.battery),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.battery = x;
                }
            },
        },
        FieldDef {
            name: "rssi",
            ty: NativeType::I8,
            get: |p| FieldValue::I8(p.rssi),
            set: |p, v| {
                if let FieldValue::I8(x) = v {
                    p.rssi = x;
                }
            },
        },
        FieldDef {
            name: "fcLoopTime",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.fc_loop_time),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.fc_loop_time = x;
                }
            },
        },
        FieldDef {
            name: "angleX",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.angle_x),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.angle_x = x;
                }
            },
        },
        FieldDef {
            name: "angleY",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.angle_y),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.angle_y = x;
                }
            },
        },
        FieldDef {
            name: "angleZ",
            ty: NativeType::F32,
            get: |p| FieldValue::F32(p.angle_z),
            set: |p, v| {
                if let FieldValue::F32(x) = v {
                    p.angle_z = x;
                }
            },
        },
    ];
}
