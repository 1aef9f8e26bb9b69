// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # quadlink - Ground link for the `HackQuad` flight controller
//!
//! Ground-station side of the quadcopter control link: a UDP session that
//! streams control setpoints at 20 ms intervals, decodes inbound telemetry,
//! raises typed events, and reaches the firmware's persistent key/value
//! registry over HTTP.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quadlink::{Link, Result};
//!
//! fn main() -> Result<()> {
//!     // Resolves hackquad.local and starts the heartbeat immediately.
//!     let link = Link::open_default()?;
//!
//!     link.events().on_status_update(|status| {
//!         println!("battery {:.2} V, rssi {}", status.battery, status.rssi);
//!         Ok(())
//!     });
//!
//!     // Stream a mild throttle setpoint until replaced.
//!     link.set_control(0.25, 0.0, 0.0, 0.0, false)?;
//!
//!     // ... fly ...
//!     link.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        Application                           |
//! |        Link handle | event callbacks | registry client       |
//! +--------------------------------------------------------------+
//! |                        Session Layer                         |
//! |   sender (20 ms heartbeat) | receiver | watchdog (2000 ms)   |
//! +--------------------------------------------------------------+
//! |                        Protocol Layer                        |
//! |   [id:1][nonce:3 LE][fields] little-endian, no padding       |
//! +--------------------------------------------------------------+
//! |                         Transports                           |
//! |        UDP unicast (control)  |  HTTP (registry)             |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Link`] | One control-link session, cheap to clone |
//! | [`Control`] | Outbound setpoint packet streamed by the heartbeat |
//! | [`Status`] | Inbound telemetry packet from the firmware |
//! | [`EventBus`] | Typed handlers for status updates and timeouts |
//! | [`RegistryClient`] | HTTP client for the firmware's key/value store |
//!
//! ## Modules Overview
//!
//! - [`link`] - Session lifecycle, heartbeat and watchdog (start here)
//! - [`protocol`] - Wire codec and packet definitions
//! - [`event`] - Typed publish/subscribe event layer
//! - [`registry`] - Remote registry access and value rendering

/// Protocol constants shared with the firmware.
pub mod config;
/// Error and result types.
pub mod error;
/// Typed event bus.
pub mod event;
/// Link session management.
pub mod link;
/// Binary wire protocol.
pub mod protocol;
/// Remote key/value registry.
pub mod registry;

pub use error::{Error, Result};
pub use event::{Event, EventBus, EventKind, EventPayload, StatusUpdate};
pub use link::{Link, LinkBuilder};
pub use protocol::{Control, Status};
pub use registry::{RegisterType, RegisterValue, RegistryClient, RegistryEntry};

/// Crate version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
