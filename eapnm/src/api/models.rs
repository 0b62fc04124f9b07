use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cert::{CertChain, ClientCert};
use crate::eap::{EapMethod, InnerAuth};

/// Institution metadata shown to the user.
///
/// Every field is optional in the document and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderInfo {
    pub display_name: String,
    pub description: String,
    /// Raw logo image bytes.
    pub logo: Vec<u8>,
    /// MIME type of `logo`, e.g. `image/png`.
    pub logo_mime: String,
    pub terms: String,
    pub helpdesk: Helpdesk,
}

/// Contact details for the institution's helpdesk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Helpdesk {
    pub email: String,
    pub phone: String,
    pub web: String,
}

/// A network name together with its minimum cipher suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssid {
    pub value: String,
    /// Cipher suite such as `CCMP`. Never the weak legacy suite.
    pub min_rsn: String,
}

impl Ssid {
    pub fn new(value: impl Into<String>, min_rsn: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            min_rsn: min_rsn.into(),
        }
    }
}

/// Descriptor shared by every network shape.
#[derive(Debug, Clone)]
pub struct Base {
    pub cert_chain: CertChain,
    pub provider: ProviderInfo,
    /// Non-empty, in document order.
    pub ssids: Vec<Ssid>,
    /// Expected server DNS names, possibly empty.
    pub server_ids: Vec<String>,
    /// Outer (anonymous) identity.
    pub anon_identity: String,
}

/// Username/password material for password networks.
///
/// `prefix` and `suffix` constrain usernames entered by the user. The
/// suffix is stored with its leading `@`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub prefix: String,
    pub suffix: String,
    pub password: String,
}

impl Credentials {
    /// Whether both username and password are present.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Checks a candidate username against the prefix and suffix.
    pub fn accepts_username(&self, username: &str) -> bool {
        if username.is_empty() {
            return false;
        }
        if !username.starts_with(&self.prefix) || !username.ends_with(&self.suffix) {
            return false;
        }
        // the local part must not be empty once the suffix is stripped
        if !self.suffix.is_empty() && username.len() <= self.suffix.len() {
            return false;
        }
        true
    }
}

/// Client certificate material of a certificate network.
#[derive(Debug)]
pub enum ClientMaterial {
    /// Still encrypted. `data` may be empty when the document ships none.
    Container { data: Vec<u8>, passphrase: String },
    /// Opened with the right passphrase.
    Decoded(ClientCert),
}

/// Password based network (TTLS or PEAP).
#[derive(Debug, Clone)]
pub struct PasswordNetwork {
    pub base: Base,
    pub credentials: Credentials,
    pub outer: EapMethod,
    pub inner: InnerAuth,
}

/// Certificate based network (TLS).
#[derive(Debug)]
pub struct CertificateNetwork {
    pub base: Base,
    pub client: ClientMaterial,
}

impl CertificateNetwork {
    /// The decoded client certificate, if already opened.
    pub fn client_cert(&self) -> Option<&ClientCert> {
        match &self.client {
            ClientMaterial::Decoded(cert) => Some(cert),
            ClientMaterial::Container { .. } => None,
        }
    }
}

/// The resolved network description.
///
/// Exactly one is produced per document: the first workable
/// authentication method wins.
#[derive(Debug)]
pub enum NetworkModel {
    Password(PasswordNetwork),
    Certificate(CertificateNetwork),
}

impl NetworkModel {
    pub fn outer_method(&self) -> EapMethod {
        match self {
            Self::Password(n) => n.outer,
            Self::Certificate(_) => EapMethod::Tls,
        }
    }

    pub fn base(&self) -> &Base {
        match self {
            Self::Password(n) => &n.base,
            Self::Certificate(n) => &n.base,
        }
    }

    pub fn provider(&self) -> &ProviderInfo {
        &self.base().provider
    }
}

/// How the CA trust material is handed to NetworkManager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaTrust {
    /// A directory of PEM files with subject-hash symlinks (`ca-path`).
    #[default]
    Directory,
    /// A single PEM bundle (`ca-cert`).
    File,
}

/// Caller-tunable parts of the generated profiles.
#[derive(Debug, Clone)]
pub struct ProfileOptions {
    /// Shown in the profile id as `"<ssid> (from <app_name>)"`.
    pub app_name: String,
    pub autoconnect_priority: i32,
    /// User the profile is restricted to. `None` leaves it system wide.
    pub user: Option<String>,
    pub ca_trust: CaTrust,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            app_name: crate::types::constants::defaults::APP_NAME.to_string(),
            autoconnect_priority: crate::types::constants::defaults::AUTOCONNECT_PRIORITY,
            user: std::env::var("USER")
                .or_else(|_| std::env::var("LOGNAME"))
                .ok()
                .filter(|u| !u.is_empty()),
            ca_trust: CaTrust::Directory,
        }
    }
}

impl ProfileOptions {
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_ca_trust(mut self, mode: CaTrust) -> Self {
        self.ca_trust = mode;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.autoconnect_priority = priority;
        self
    }
}

/// Result of a successful Configure-call.
#[derive(Debug)]
pub struct ConfigureOutcome {
    /// Connection UUIDs now owned by us, in SSID order.
    pub uuids: Vec<String>,
    /// Client certificate expiry, for certificate networks.
    pub validity: Option<DateTime<Utc>>,
    /// Set when some but not all SSIDs could be installed.
    pub warning: Option<ConfigureError>,
}

/// Errors that can occur while turning a document into installed profiles.
#[derive(Debug, Error)]
pub enum ConfigureError {
    /// The document is not well-formed XML or does not fit the schema.
    #[error("failed to parse EAP config: {0}")]
    Parse(#[from] quick_xml::DeError),

    /// The document has no `EAPIdentityProvider`.
    #[error("EAP config contains no identity provider")]
    MissingProvider,

    /// The document lists no authentication methods.
    #[error("EAP config contains no authentication methods")]
    NoAuthenticationMethods,

    /// No SSID entry survived filtering.
    #[error("no viable SSID entry found")]
    NoViableSsid,

    /// No inner method of a candidate matches its outer method.
    #[error("no viable inner authentication method found")]
    NoViableInnerAuth,

    /// The outer EAP method code is not supported.
    #[error("unsupported EAP method: {0}")]
    UnsupportedMethod(i32),

    /// A candidate lacks a server side credential section.
    #[error("authentication method has no server side credentials")]
    MissingServerCredentials,

    /// None of the CA certificates is a self-signed CA.
    #[error("no root CA found")]
    NoRootFound,

    /// Every candidate failed; carries the last candidate's error.
    #[error("no viable network settings found in EAP config: {0}")]
    NoViableNetwork(Box<ConfigureError>),

    /// The client certificate container could not be opened.
    #[error("failed to decrypt client certificate: {0}")]
    CertificateDecrypt(String),

    /// A certificate network was reconciled without a decoded client certificate.
    #[error("client certificate is required but was not supplied")]
    ClientCertificateRequired,

    /// The supplied username violates the provider's prefix or suffix.
    #[error("username must start with '{prefix}' and end with '{suffix}'")]
    InvalidUsername { prefix: String, suffix: String },

    /// The prompt collaborator failed or was cancelled.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// Live settings returned by NetworkManager are not usable.
    #[error("invalid connection settings: {0}")]
    InvalidSettings(String),

    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// A D-Bus value could not be converted.
    #[error("D-Bus variant error: {0}")]
    Variant(#[from] zvariant::Error),

    /// Writing key material or state failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted state could not be encoded or decoded.
    #[error("state error: {0}")]
    State(#[from] serde_json::Error),

    /// OpenSSL failed while handling certificate material.
    #[error("crypto error: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
}
