// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative packet schema walked by generic serialize/deserialize.
//!
//! Every packet type carries a static, ordered field descriptor table
//! ([`WirePacket::FIELDS`]). The wire layout is always
//! `[id:1][nonce:3 LE][fields in declared order]` with no padding. Field
//! order is part of the wire contract; it is fixed by the descriptor table,
//! never by incidental struct layout.

use crate::config::NONCE_MASK;
use crate::error::{Error, Result};
use crate::protocol::codec::{BufferReader, BufferWriter};

/// Native wire types a packet field can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    /// IEEE-754 32-bit float, little-endian bit pattern.
    F32,
    /// Single signed byte.
    I8,
    /// 32-bit signed integer, little-endian.
    I32,
    /// Null-terminated string, no length prefix.
    CStr,
}

/// One decoded field value, tagged with its native type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    F32(f32),
    I8(i8),
    I32(i32),
    CStr(String),
}

impl FieldValue {
    fn native_type(&self) -> NativeType {
        match self {
            FieldValue::F32(_) => NativeType::F32,
            FieldValue::I8(_) => NativeType::I8,
            FieldValue::I32(_) => NativeType::I32,
            FieldValue::CStr(_) => NativeType::CStr,
        }
    }
}

/// One entry of a packet's field descriptor table: a named
/// (accessor, native-type) pair.
///
/// `get` produces the wire value for serialization; `set` stores a decoded
/// value during deserialization. Accessors may translate between stored and
/// wire representation (the control packet's clear-panic sign bit does).
pub struct FieldDef<P> {
    /// Field name, for diagnostics only.
    pub name: &'static str,
    /// Wire type this field encodes as.
    pub ty: NativeType,
    /// Extract the wire value from the packet.
    pub get: fn(&P) -> FieldValue,
    /// Store a decoded wire value into the packet.
    pub set: fn(&mut P, FieldValue),
}

/// A packet with a fixed 1-byte id and a static ordered field table.
pub trait WirePacket: Sized + 'static {
    /// Wire id written as the first byte of every frame.
    const PACKET_ID: u8;
    /// Ordered field descriptors. Declaration order is the wire order.
    const FIELDS: &'static [FieldDef<Self>];
}

/// Frame header preceding the fields: packet id plus 24-bit nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// 1-byte packet id.
    pub packet_id: u8,
    /// 24-bit sender nonce. Received but not validated against the sender's
    /// sequence (reserved for future replay protection).
    pub nonce: u32,
}

/// Read the `[id:1][nonce:3]` frame header.
pub fn read_header(reader: &mut BufferReader<'_>) -> Result<FrameHeader> {
    let packet_id = reader.read_u8()?;
    let nonce = reader.read_u24_le()?;
    Ok(FrameHeader { packet_id, nonce })
}

/// Serialize a packet as `[id][nonce][fields in declared order]`.
///
/// The nonce is supplied by the caller (the link owns the counter) and is
/// masked to 24 bits.
pub fn serialize<P: WirePacket>(packet: &P, nonce: u32) -> Result<Vec<u8>> {
    let mut out = BufferWriter::with_capacity(4 + P::FIELDS.len() * 4);
    out.write_u8(P::PACKET_ID);
    out.write_u24_le(nonce & NONCE_MASK);

    for field in P::FIELDS {
        let value = (field.get)(packet);
        if value.native_type() != field.ty {
            return Err(Error::Protocol(format!(
                "field '{}' accessor returned {:?}, descriptor says {:?}",
                field.name,
                value.native_type(),
                field.ty
            )));
        }
        match value {
            FieldValue::F32(v) => out.write_f32_le(v),
            FieldValue::I8(v) => out.write_i8(v),
            FieldValue::I32(v) => out.write_i32_le(v),
            FieldValue::CStr(ref v) => out.write_cstr(v)?,
        }
    }

    Ok(out.into_inner())
}

/// Deserialize fields in declared order into a pre-existing target.
///
/// The caller has already consumed the frame header. A buffer too short for
/// any field fails with `Error::Protocol` and leaves the target partially
/// updated; callers discard the target on error.
pub fn deserialize<P: WirePacket>(reader: &mut BufferReader<'_>, target: &mut P) -> Result<()> {
    for field in P::FIELDS {
        let value = match field.ty {
            NativeType::F32 => FieldValue::F32(reader.read_f32_le()?),
            NativeType::I8 => FieldValue::I8(reader.read_i8()?),
            NativeType::I32 => FieldValue::I32(reader.read_i32_le()?),
            NativeType::CStr => FieldValue::CStr(reader.read_cstr()?),
        };
        (field.set)(target, value);
    }
    Ok(())
}
