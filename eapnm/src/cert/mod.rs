//! Certificate handling: CA trust chains and client certificates.

pub mod chain;
pub mod client;

#[cfg(test)]
pub(crate) mod testutil;

pub use chain::{CaCertificate, CertChain, Chain};
pub use client::ClientCert;
