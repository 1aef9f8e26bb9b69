// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian binary codec for the firmware wire format.
//!
//! Provides `BufferWriter` and `BufferReader` for the fixed-width primitives
//! the protocol uses: `u8`, LE `i32`, LE 24-bit unsigned, IEEE-754 LE `f32`,
//! and null-terminated strings. Must stay bit-exact with the firmware.

use crate::error::{Error, Result};

/// Growable byte buffer writing wire primitives in little-endian order.
pub struct BufferWriter {
    buf: Vec<u8>,
}

impl BufferWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create a writer with pre-allocated capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    /// Write a 32-bit signed integer, little-endian.
    pub fn write_i32_le(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write the low 24 bits of `value`, little-endian. The upper byte is
    /// discarded; callers mask the nonce before writing.
    pub fn write_u24_le(&mut self, value: u32) {
        let bytes = value.to_le_bytes();
        self.buf.extend_from_slice(&bytes[..3]);
    }

    /// Write a 32-bit float as its IEEE-754 bit pattern, little-endian.
    pub fn write_f32_le(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a null-terminated string. No length prefix; an embedded NUL in
    /// the value would corrupt the frame, so it is rejected.
    pub fn write_cstr(&mut self, value: &str) -> Result<()> {
        if value.as_bytes().contains(&0) {
            return Err(Error::Validation(
                "string value contains embedded NUL".into(),
            ));
        }
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer, returning the encoded bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the encoded bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl Default for BufferWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over a received datagram, reading wire primitives in order.
///
/// Every read checks the remaining length; a short buffer yields
/// `Error::Protocol`, never a panic.
pub struct BufferReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufferReader<'a> {
    /// Create a reader over `buf` starting at offset 0.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| {
            Error::Protocol(format!("offset overflow reading {}", what))
        })?;
        if end > self.buf.len() {
            return Err(Error::Protocol(format!(
                "buffer truncated reading {} at offset {}",
                what, self.pos
            )));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1, "i8")?[0] as i8)
    }

    /// Read a 32-bit signed integer, little-endian.
    pub fn read_i32_le(&mut self) -> Result<i32> {
        let b = self.take(4, "i32")?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 24-bit unsigned integer, little-endian.
    pub fn read_u24_le(&mut self) -> Result<u32> {
        let b = self.take(3, "u24")?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    /// Read a 32-bit float from its IEEE-754 bit pattern, little-endian.
    pub fn read_f32_le(&mut self) -> Result<f32> {
        let b = self.take(4, "f32")?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read bytes up to (and consuming) the null terminator.
    pub fn read_cstr(&mut self) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let nul = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            Error::Protocol(format!(
                "unterminated string at offset {}",
                self.pos
            ))
        })?;
        let bytes = &rest[..nul];
        self.pos += nul + 1;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::Protocol("string value is not valid UTF-8".into()))
    }

    /// Current offset into the buffer.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
