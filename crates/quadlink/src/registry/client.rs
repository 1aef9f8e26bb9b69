// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking HTTP transport for the remote registry.

use crate::config::HTTP_TIMEOUT;
use crate::error::{Error, Result};
use crate::registry::{RegisterType, RegisterValue, RegistryEntry};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
struct EntryDto {
    key: String,
    #[serde(rename = "type")]
    ty: u8,
    value: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct KeyRequest<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct SetRequest<'a> {
    key: &'a str,
    value: serde_json::Value,
}

fn coerce_value(ty: RegisterType, raw: &serde_json::Value) -> Option<RegisterValue> {
    match ty {
        RegisterType::Int8 | RegisterType::Int16 | RegisterType::Int32 | RegisterType::Int64 => {
            raw.as_i64().map(RegisterValue::Int)
        }
        RegisterType::Float => raw.as_f64().map(|x| RegisterValue::Float(x as f32)),
        RegisterType::Str => raw.as_str().map(|s| RegisterValue::Str(s.to_owned())),
    }
}

fn to_json(value: &RegisterValue) -> serde_json::Value {
    match value {
        RegisterValue::Int(n) => serde_json::Value::from(*n),
        RegisterValue::Float(x) => serde_json::Value::from(f64::from(*x)),
        RegisterValue::Str(s) => serde_json::Value::from(s.as_str()),
    }
}

// ============================================================================
// Registry Client
// ============================================================================

/// HTTP client for the firmware's registry service.
///
/// Cheap to clone; entries hold a clone so they can push updates back.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::blocking::Client,
    root: String,
}

impl RegistryClient {
    /// Build a client rooted at a URL such as `http://hackquad.local`.
    pub fn new(root: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            root: root.into(),
        })
    }

    /// Root URL of the registry service.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Fetch every entry, in the order the firmware lists them.
    ///
    /// Failures are not fatal to the caller: a transport error or a non-200
    /// status yields an empty list with a logged warning.
    pub fn list(&self) -> Vec<RegistryEntry> {
        let url = format!("{}/reg/list", self.root);
        let response = match self.http.get(&url).send() {
            Ok(r) => r,
            Err(e) => {
                log::warn!("[REG] list failed: {}", e);
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            log::warn!("[REG] list returned {}", response.status());
            return Vec::new();
        }
        let dtos: Vec<EntryDto> = match response.json() {
            Ok(d) => d,
            Err(e) => {
                log::warn!("[REG] list body malformed: {}", e);
                return Vec::new();
            }
        };
        dtos.into_iter()
            .filter_map(|dto| self.entry_from_dto(dto))
            .collect()
    }

    /// Fetch a single entry by key. `None` when the key is unknown or the
    /// request failed.
    pub fn get(&self, key: &str) -> Option<RegistryEntry> {
        let url = format!("{}/reg/get", self.root);
        let response = match self.http.get(&url).json(&KeyRequest { key }).send() {
            Ok(r) => r,
            Err(e) => {
                log::warn!("[REG] get '{}' failed: {}", key, e);
                return None;
            }
        };
        if !response.status().is_success() {
            log::debug!("[REG] get '{}' returned {}", key, response.status());
            return None;
        }
        let dto: EntryDto = match response.json() {
            Ok(d) => d,
            Err(e) => {
                log::warn!("[REG] get '{}' body malformed: {}", key, e);
                return None;
            }
        };
        self.entry_from_dto(dto)
    }

    /// Push a value to the firmware. The firmware persists it; a non-200
    /// status or a transport failure is an [`Error::RemoteUpdate`].
    pub fn set(&self, key: &str, value: &RegisterValue) -> Result<()> {
        let url = format!("{}/reg/set", self.root);
        let response = self
            .http
            .post(&url)
            .json(&SetRequest {
                key,
                value: to_json(value),
            })
            .send()
            .map_err(|e| Error::RemoteUpdate(format!("set '{}': {}", key, e)))?;
        if !response.status().is_success() {
            return Err(Error::RemoteUpdate(format!(
                "set '{}' rejected with {}",
                key,
                response.status()
            )));
        }
        Ok(())
    }

    /// Ask the firmware to recalibrate its IMU. Fire-and-forget.
    pub(crate) fn calibrate(&self) {
        let url = format!("{}/mpu/calibrate", self.root);
        match self.http.post(&url).send() {
            Ok(r) if r.status().is_success() => {
                log::debug!("[REG] calibrate accepted");
            }
            Ok(r) => log::warn!("[REG] calibrate returned {}", r.status()),
            Err(e) => log::warn!("[REG] calibrate failed: {}", e),
        }
    }

    fn entry_from_dto(&self, dto: EntryDto) -> Option<RegistryEntry> {
        let ty = match RegisterType::from_id(dto.ty) {
            Some(ty) => ty,
            None => {
                log::warn!("[REG] '{}' has unknown type id {}", dto.key, dto.ty);
                return None;
            }
        };
        let value = match coerce_value(ty, &dto.value) {
            Some(v) => v,
            None => {
                log::warn!(
                    "[REG] '{}' value {} does not fit type {:?}",
                    dto.key,
                    dto.value,
                    ty
                );
                return None;
            }
        };
        Some(RegistryEntry::new(dto.key, ty, value, self.clone()))
    }
}
