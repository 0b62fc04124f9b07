//! Connection settings builders.
//!
//! These construct the NetworkManager settings dictionaries sent over D-Bus.
//! [`ConnectionBuilder`] handles the sections every profile has and
//! [`EnterpriseWifiBuilder`] adds the WPA-Enterprise specific ones.
//!
//! Most users should go through [`Configurator`](crate::Configurator); the
//! builders are exposed for callers that manage profiles themselves.

pub mod connection_builder;
pub mod enterprise_builder;

pub use connection_builder::{ConnectionBuilder, SettingsMap};
pub use enterprise_builder::EnterpriseWifiBuilder;
