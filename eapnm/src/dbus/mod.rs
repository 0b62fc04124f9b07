//! NetworkManager settings access.

pub mod service;

pub use service::{NmSettings, RemoteSettings, SettingsService};
