//! Alerting System
//!
//! Drives the physical alarm device from drowsiness transitions: one command
//! byte per transition, delivered best effort over a serial link.

mod bridge;
mod error;
mod transport;

pub use bridge::{AlarmBridge, AlarmCommand, ApplyOutcome, BridgeStats};
pub use error::TransportError;
pub use transport::{AlarmConfig, AlarmTransport, MockTransport, SerialTransport};
