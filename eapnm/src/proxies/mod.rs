//! D-Bus proxy traits for NetworkManager interfaces.
//!
//! The `zbus::proxy` macro generates proxy implementations that handle
//! D-Bus communication automatically.
//!
//! # NetworkManager D-Bus Structure
//!
//! - `/org/freedesktop/NetworkManager/Settings` - Connection settings
//! - `/org/freedesktop/NetworkManager/Settings/*` - Saved connection profiles

mod settings;

pub use settings::{NMSettingsConnectionProxy, NMSettingsProxy};
