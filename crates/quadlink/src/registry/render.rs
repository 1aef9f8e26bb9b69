// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bidirectional string rendering of registry values.
//!
//! A renderer is resolved once per entry when it is fetched: first by exact
//! key match against the known enum tables, then by the entry's declared
//! type. Rendering and parsing are inverse operations; any mismatch between
//! value and renderer is an [`Error::Render`], never a transport error.

use crate::error::{Error, Result};
use crate::registry::{RegisterType, RegisterValue};

// ============================================================================
// Enum Tables
// ============================================================================

/// A contiguous run of named integer values starting at `base`.
#[derive(Debug, Clone, Copy)]
pub struct EnumTable {
    /// Integer value of the first name.
    pub base: i64,
    /// Names in ascending value order.
    pub names: &'static [&'static str],
}

impl EnumTable {
    fn name_for(&self, value: i64) -> Option<&'static str> {
        let idx = value.checked_sub(self.base)?;
        usize::try_from(idx).ok().and_then(|i| self.names.get(i).copied())
    }

    fn value_for(&self, name: &str) -> Option<i64> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.base + i as i64)
    }
}

/// Wifi authentication modes as the firmware's SDK numbers them.
pub const WIFI_AUTH_MODES: EnumTable = EnumTable {
    base: 0,
    names: &[
        "WIFI_AUTH_OPEN",
        "WIFI_AUTH_WEP",
        "WIFI_AUTH_WPA_PSK",
        "WIFI_AUTH_WPA2_PSK",
        "WIFI_AUTH_WPA_WPA2_PSK",
        "WIFI_AUTH_WPA2_ENTERPRISE",
        "WIFI_AUTH_WPA3_PSK",
        "WIFI_AUTH_WPA2_WPA3_PSK",
    ],
};

/// Wifi interface modes. Numbering starts at 1 (0 is the SDK's NULL mode).
pub const WIFI_MODES: EnumTable = EnumTable {
    base: 1,
    names: &["WIFI_MODE_STA", "WIFI_MODE_AP", "WIFI_MODE_APSTA"],
};

// ============================================================================
// Renderer
// ============================================================================

/// String representation strategy for a registry value.
#[derive(Debug, Clone, Copy)]
pub enum Renderer {
    /// Decimal integer.
    Integer,
    /// Decimal float.
    Float,
    /// The string value itself.
    Passthrough,
    /// Integer shown by its symbolic name from a fixed table.
    Enumerated(EnumTable),
}

impl Renderer {
    /// Pick the renderer for an entry. Exact key matches win over the
    /// declared type so enum-typed registers show symbolic names.
    pub fn resolve(key: &str, ty: RegisterType) -> Renderer {
        match key {
            "WIFI_AP_AUTHMODE" | "WIFI_ST_AUTHMODE" => Renderer::Enumerated(WIFI_AUTH_MODES),
            "WIFI_MODE" => Renderer::Enumerated(WIFI_MODES),
            _ => match ty {
                RegisterType::Int8
                | RegisterType::Int16
                | RegisterType::Int32
                | RegisterType::Int64 => Renderer::Integer,
                RegisterType::Float => Renderer::Float,
                RegisterType::Str => Renderer::Passthrough,
            },
        }
    }

    /// Render a value to its display string.
    pub fn render(&self, value: &RegisterValue) -> Result<String> {
        match (self, value) {
            (Renderer::Integer, RegisterValue::Int(n)) => Ok(n.to_string()),
            (Renderer::Float, RegisterValue::Float(x)) => Ok(x.to_string()),
            (Renderer::Passthrough, RegisterValue::Str(s)) => Ok(s.clone()),
            (Renderer::Enumerated(table), RegisterValue::Int(n)) => {
                table.name_for(*n).map(str::to_owned).ok_or_else(|| {
                    Error::Render(format!("{} has no name in the enum table", n))
                })
            }
            (_, value) => Err(Error::Render(format!(
                "value {:?} does not match renderer {:?}",
                value, self
            ))),
        }
    }

    /// Parse a display string back into a value.
    pub fn parse(&self, input: &str) -> Result<RegisterValue> {
        match self {
            Renderer::Integer => input
                .trim()
                .parse::<i64>()
                .map(RegisterValue::Int)
                .map_err(|e| Error::Render(format!("'{}' is not an integer: {}", input, e))),
            Renderer::Float => input
                .trim()
                .parse::<f32>()
                .map(RegisterValue::Float)
                .map_err(|e| Error::Render(format!("'{}' is not a float: {}", input, e))),
            Renderer::Passthrough => Ok(RegisterValue::Str(input.to_owned())),
            Renderer::Enumerated(table) => table
                .value_for(input.trim())
                .map(RegisterValue::Int)
                .ok_or_else(|| {
                    Error::Render(format!("'{}' is not a name in the enum table", input))
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_key_beats_type() {
        let r = Renderer::resolve("WIFI_MODE", RegisterType::Int8);
        assert!(matches!(r, Renderer::Enumerated(_)));
        let r = Renderer::resolve("WIFI_AP_AUTHMODE", RegisterType::Int32);
        assert!(matches!(r, Renderer::Enumerated(_)));
    }

    #[test]
    fn test_resolve_by_type() {
        assert!(matches!(
            Renderer::resolve("PID_P", RegisterType::Float),
            Renderer::Float
        ));
        assert!(matches!(
            Renderer::resolve("WIFI_AP_SSID", RegisterType::Str),
            Renderer::Passthrough
        ));
        for ty in [
            RegisterType::Int8,
            RegisterType::Int16,
            RegisterType::Int32,
            RegisterType::Int64,
        ] {
            assert!(matches!(Renderer::resolve("ANY", ty), Renderer::Integer));
        }
    }

    #[test]
    fn test_wifi_mode_base_offset() {
        // Mode numbering starts at 1.
        let r = Renderer::Enumerated(WIFI_MODES);
        assert_eq!(r.render(&RegisterValue::Int(1)).unwrap(), "WIFI_MODE_STA");
        assert_eq!(r.render(&RegisterValue::Int(3)).unwrap(), "WIFI_MODE_APSTA");
        assert!(r.render(&RegisterValue::Int(0)).is_err());
        assert_eq!(r.parse("WIFI_MODE_AP").unwrap(), RegisterValue::Int(2));
    }

    #[test]
    fn test_auth_mode_roundtrip() {
        let r = Renderer::Enumerated(WIFI_AUTH_MODES);
        for (i, name) in WIFI_AUTH_MODES.names.iter().enumerate() {
            let rendered = r.render(&RegisterValue::Int(i as i64)).unwrap();
            assert_eq!(&rendered, name);
            assert_eq!(r.parse(name).unwrap(), RegisterValue::Int(i as i64));
        }
        assert!(r.render(&RegisterValue::Int(8)).is_err());
        assert!(r.parse("WIFI_AUTH_BOGUS").is_err());
    }

    #[test]
    fn test_scalar_parse_and_render() {
        assert_eq!(
            Renderer::Integer.parse("-42").unwrap(),
            RegisterValue::Int(-42)
        );
        assert_eq!(
            Renderer::Float.parse("2.5").unwrap(),
            RegisterValue::Float(2.5)
        );
        assert_eq!(
            Renderer::Passthrough
                .render(&RegisterValue::Str("quad".into()))
                .unwrap(),
            "quad"
        );
        assert!(Renderer::Integer.parse("2.5").is_err());
        assert!(Renderer::Float.parse("abc").is_err());
    }

    #[test]
    fn test_mismatched_value_is_render_error() {
        let err = Renderer::Integer.render(&RegisterValue::Str("x".into()));
        assert!(matches!(err, Err(Error::Render(_))));
    }
}
