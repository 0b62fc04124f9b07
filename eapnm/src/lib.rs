//! Install EAP-config described 802.1X Wi-Fi profiles into NetworkManager.
//!
//! An institution's EAP-config document (the XML format used by eduroam
//! CAT and geteduroam) describes the networks to join, the CA that signs
//! the RADIUS server certificate, the expected server names and how the
//! user authenticates. This crate turns such a document into saved
//! NetworkManager profiles, one per SSID:
//!
//! - Parsing and validating the document, with localized provider info
//! - Picking the first workable authentication method (TLS, TTLS or PEAP)
//! - Grouping the CA certificates into trust chains
//! - Writing the trust and client key material to a private directory
//! - Creating, updating and removing the profiles over D-Bus
//!
//! Re-running with a new document updates the profiles created last time
//! instead of piling up duplicates.
//!
//! # Example
//!
//! ```no_run
//! use eapnm::{Configurator, MaterialStore, NmSettings, StateFile};
//!
//! # async fn example() -> eapnm::Result<()> {
//! let service = NmSettings::system().await?;
//! let store = MaterialStore::default_location("eapnm");
//! let state = StateFile::in_store(&store);
//!
//! let document = std::fs::read("eduroam.eap-config")?;
//! let outcome = Configurator::new(&service, &state, store)
//!     .configure(&document)
//!     .await?;
//!
//! for uuid in &outcome.uuids {
//!     println!("installed {uuid}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Documents without embedded credentials need a [`CredentialPrompt`] or
//! [`CertificatePrompt`] to ask the user.
//!
//! # Error Handling
//!
//! All operations return `Result<T, ConfigureError>`. The error type
//! separates document problems (parse errors, no viable network) from
//! missing user input and from D-Bus or filesystem failures.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`. For example:

//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod core;
mod proxies;
mod types;
mod util;

// Public API modules
pub mod api;
pub mod cert;
pub mod dbus;
pub mod eap;

pub use api::builders;

// Re-exported public API
pub use api::configure::{CertificatePrompt, Configurator, CredentialPrompt, Status};
pub use api::models::{
    Base, CaTrust, CertificateNetwork, ClientMaterial, ConfigureError, ConfigureOutcome,
    Credentials, Helpdesk, NetworkModel, PasswordNetwork, ProfileOptions, ProviderInfo, Ssid,
};
pub use api::state::{ConnectionRecord, StateFile, StateStore};
pub use dbus::{NmSettings, RemoteSettings, SettingsService};
pub use eap::{EapMethod, InnerAuth, ParseOptions};
pub use util::files::MaterialStore;
pub use util::utils::validity_days;

/// A specialized `Result` type for configure operations.
pub type Result<T> = std::result::Result<T, ConfigureError>;
