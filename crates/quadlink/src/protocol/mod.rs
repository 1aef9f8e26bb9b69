// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary wire protocol shared with the flight controller firmware.
//!
//! Every frame is `[id:1][nonce:3 LE][fields in declared order]`, no padding.
//! Two packet types exist: the outbound [`Control`] setpoint (id 69) and the
//! inbound [`Status`] telemetry (id 20). The codec is little-endian and must
//! stay bit-exact with the firmware's layout.

/// Little-endian primitive reader/writer.
pub mod codec;
/// Outbound control packet (id 69).
pub mod control;
/// Static field descriptors and generic serialize/deserialize.
pub mod packet;
/// Inbound status packet (id 20).
pub mod status;

pub use codec::{BufferReader, BufferWriter};
pub use control::{Control, CONTROL_PACKET_ID};
pub use packet::{
    deserialize, read_header, serialize, FieldDef, FieldValue, FrameHeader, NativeType, WirePacket,
};
pub use status::{Status, STATUS_PACKET_ID};
