// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client for the flight controller's persistent key/value registry.
//!
//! The registry lives on the firmware and is reached over HTTP, separate
//! from the UDP control link. Values are typed on the wire (a small integer
//! type id per entry) and rendered to strings through a per-entry
//! [`Renderer`] resolved at fetch time.

mod client;
mod render;

pub use client::RegistryClient;
pub use render::{EnumTable, Renderer, WIFI_AUTH_MODES, WIFI_MODES};

use crate::error::Result;

// ============================================================================
// Register Types
// ============================================================================

/// Declared type of a registry entry, matching the firmware's type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterType {
    Int8,
    Int16,
    Int32,
    Int64,
    Str,
    Float,
}

impl RegisterType {
    /// Decode a wire type id. Unknown ids yield `None`.
    pub fn from_id(id: u8) -> Option<RegisterType> {
        match id {
            0 => Some(RegisterType::Int8),
            1 => Some(RegisterType::Int16),
            2 => Some(RegisterType::Int32),
            3 => Some(RegisterType::Int64),
            4 => Some(RegisterType::Str),
            5 => Some(RegisterType::Float),
            _ => None,
        }
    }

    /// The wire type id.
    pub fn id(&self) -> u8 {
        match self {
            RegisterType::Int8 => 0,
            RegisterType::Int16 => 1,
            RegisterType::Int32 => 2,
            RegisterType::Int64 => 3,
            RegisterType::Str => 4,
            RegisterType::Float => 5,
        }
    }

    /// Whether this type belongs to the integer family.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            RegisterType::Int8 | RegisterType::Int16 | RegisterType::Int32 | RegisterType::Int64
        )
    }
}

// ============================================================================
// Register Values
// ============================================================================

/// A registry value. Integers of every width share one variant; the entry's
/// [`RegisterType`] records the declared width.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterValue {
    Int(i64),
    Float(f32),
    Str(String),
}

// ============================================================================
// Registry Entries
// ============================================================================

/// One key/value pair fetched from the remote registry.
///
/// The entry carries its renderer, resolved once at fetch time, and a handle
/// back to the client so [`RegistryEntry::update`] can push the new value.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    key: String,
    ty: RegisterType,
    value: RegisterValue,
    renderer: Renderer,
    client: RegistryClient,
}

impl RegistryEntry {
    pub(crate) fn new(
        key: String,
        ty: RegisterType,
        value: RegisterValue,
        client: RegistryClient,
    ) -> Self {
        let renderer = Renderer::resolve(&key, ty);
        Self {
            key,
            ty,
            value,
            renderer,
            client,
        }
    }

    /// The entry's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The entry's declared type.
    pub fn ty(&self) -> RegisterType {
        self.ty
    }

    /// The current (locally cached) value.
    pub fn value(&self) -> &RegisterValue {
        &self.value
    }

    /// The renderer resolved for this entry.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Display string of the current value.
    pub fn render(&self) -> Result<String> {
        self.renderer.render(&self.value)
    }

    /// Parse a display string into a value for this entry, without updating.
    pub fn parse(&self, input: &str) -> Result<RegisterValue> {
        self.renderer.parse(input)
    }

    /// Replace the value: push to the firmware first, mutate the local copy
    /// only once the remote accepted it.
    pub fn update(&mut self, value: RegisterValue) -> Result<()> {
        self.client.set(&self.key, &value)?;
        self.value = value;
        Ok(())
    }

    /// Parse a display string and [`update`](Self::update) with the result.
    pub fn update_from_str(&mut self, input: &str) -> Result<()> {
        let value = self.renderer.parse(input)?;
        self.update(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ids_roundtrip() {
        for id in 0..=5u8 {
            let ty = RegisterType::from_id(id).expect("known id");
            assert_eq!(ty.id(), id);
        }
        assert!(RegisterType::from_id(6).is_none());
        assert!(RegisterType::from_id(255).is_none());
    }

    #[test]
    fn test_integer_family() {
        assert!(RegisterType::Int8.is_integer());
        assert!(RegisterType::Int64.is_integer());
        assert!(!RegisterType::Str.is_integer());
        assert!(!RegisterType::Float.is_integer());
    }
}
