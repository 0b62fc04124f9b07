//! Type definitions and constants.
//!
//! This module contains EAP and NetworkManager constants.

pub(crate) mod constants;
