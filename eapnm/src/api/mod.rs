//! Public API module.
//!
//! This module contains the high-level user-facing API for the `eapnm` crate.

pub mod builders;
pub mod configure;
pub mod models;
pub mod state;
