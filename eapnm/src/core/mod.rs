//! Core internal logic for profile installation.
//!
//! - [`profile`] builds per-SSID payloads and writes the files they reference
//! - [`reconcile`] turns a network model into create/update/delete calls

pub mod profile;
pub mod reconcile;
