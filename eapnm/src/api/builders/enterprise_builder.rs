//! WPA-Enterprise Wi-Fi connection builder.
//!
//! Wraps [`ConnectionBuilder`] and adds the `802-11-wireless`,
//! `802-11-wireless-security` and `802-1x` sections for an 802.1X profile.

use std::collections::HashMap;
use std::path::Path;
use zvariant::Value;

use super::connection_builder::{ConnectionBuilder, SettingsMap};
use crate::eap::{EapMethod, InnerAuth};
use crate::types::constants::section;
use crate::util::utils::encode_path;

/// Builder for WPA-Enterprise (802.1X) Wi-Fi connections.
///
/// # Example
///
/// ```rust
/// use eapnm::builders::EnterpriseWifiBuilder;
/// use eapnm::{EapMethod, InnerAuth};
///
/// let settings = EnterpriseWifiBuilder::new("eduroam (from eapnm)", "eduroam", "CCMP")
///     .password_auth(
///         EapMethod::Peap,
///         InnerAuth::EapMschapv2,
///         "alice@example.edu",
///         "hunter2",
///         "anonymous@example.edu",
///     )
///     .server_names(&["radius.example.edu"])
///     .ca_directory("/home/alice/.local/share/eapnm/ca")
///     .ipv4_auto()
///     .ipv6_auto()
///     .build();
/// ```
pub struct EnterpriseWifiBuilder {
    inner: ConnectionBuilder,
    ssid: String,
    cipher: String,
    dot1x: HashMap<&'static str, Value<'static>>,
}

impl EnterpriseWifiBuilder {
    /// Creates a builder for `ssid` with the given minimum cipher suite.
    pub fn new(id: impl Into<String>, ssid: impl Into<String>, min_rsn: &str) -> Self {
        Self {
            inner: ConnectionBuilder::new(section::WIRELESS, id),
            ssid: ssid.into(),
            cipher: min_rsn.to_lowercase(),
            dot1x: HashMap::new(),
        }
    }

    /// Username/password authentication inside a TTLS or PEAP tunnel.
    ///
    /// The inner method lands in `phase2-autheap` for EAP-typed methods
    /// under TTLS and in `phase2-auth` otherwise.
    pub fn password_auth(
        mut self,
        outer: EapMethod,
        inner: InnerAuth,
        identity: impl Into<String>,
        password: impl Into<String>,
        anonymous_identity: impl Into<String>,
    ) -> Self {
        self.dot1x
            .insert("eap", Self::string_array(&[outer.nm_name()]));
        self.dot1x
            .insert("identity", Value::from(identity.into()));
        self.dot1x
            .insert("password", Value::from(password.into()));
        self.dot1x.insert("password-flags", Value::from(0u32));
        self.dot1x
            .insert("anonymous-identity", Value::from(anonymous_identity.into()));
        self.dot1x
            .insert(inner.phase2_key(outer), Value::from(inner.nm_name()));
        self
    }

    /// EAP-TLS with a client certificate and encrypted key on disk.
    pub fn tls_auth(
        mut self,
        identity: impl Into<String>,
        client_cert: &Path,
        private_key: &Path,
        key_password: impl Into<String>,
    ) -> Self {
        self.dot1x
            .insert("eap", Self::string_array(&[EapMethod::Tls.nm_name()]));
        self.dot1x
            .insert("identity", Value::from(identity.into()));
        self.dot1x
            .insert("client-cert", Value::from(encode_path(client_cert)));
        self.dot1x
            .insert("private-key", Value::from(encode_path(private_key)));
        self.dot1x
            .insert("private-key-password", Value::from(key_password.into()));
        self.dot1x
            .insert("private-key-password-flags", Value::from(0u32));
        self
    }

    /// One `DNS:<name>` subject-alternative-name match per server name.
    pub fn server_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        if names.is_empty() {
            return self;
        }
        let matches: Vec<String> = names
            .iter()
            .map(|n| format!("DNS:{}", n.as_ref()))
            .collect();
        self.dot1x
            .insert("altsubject-matches", Value::from(matches));
        self
    }

    /// Trusts the hashed CA directory at `dir`.
    pub fn ca_directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.dot1x.insert(
            "ca-path",
            Value::from(dir.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Trusts the PEM bundle at `file`.
    pub fn ca_file(mut self, file: impl AsRef<Path>) -> Self {
        self.dot1x
            .insert("ca-cert", Value::from(encode_path(file.as_ref())));
        self
    }

    // Delegation methods to inner ConnectionBuilder

    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.inner = self.inner.uuid(uuid);
        self
    }

    pub fn autoconnect_priority(mut self, priority: i32) -> Self {
        self.inner = self.inner.autoconnect_priority(priority);
        self
    }

    pub fn permissions<S: AsRef<str>>(mut self, users: &[S]) -> Self {
        self.inner = self.inner.permissions(users);
        self
    }

    pub fn permission_entries(mut self, entries: Vec<String>) -> Self {
        self.inner = self.inner.permission_entries(entries);
        self
    }

    pub fn ipv4_auto(mut self) -> Self {
        self.inner = self.inner.ipv4_auto();
        self
    }

    pub fn ipv6_auto(mut self) -> Self {
        self.inner = self.inner.ipv6_auto();
        self
    }

    pub fn ipv4_method(mut self, method: impl Into<String>) -> Self {
        self.inner = self.inner.ipv4_method(method);
        self
    }

    pub fn ipv6_method(mut self, method: impl Into<String>) -> Self {
        self.inner = self.inner.ipv6_method(method);
        self
    }

    /// Builds the final connection settings dictionary.
    pub fn build(self) -> SettingsMap {
        let mut wireless = HashMap::new();
        wireless.insert("ssid", Value::from(self.ssid.as_bytes().to_vec()));
        wireless.insert("mode", Value::from("infrastructure"));
        wireless.insert("security", Value::from(section::WIRELESS_SECURITY));

        let mut security = HashMap::new();
        security.insert("key-mgmt", Value::from("wpa-eap"));
        security.insert("proto", Self::string_array(&["rsn"]));
        security.insert("pairwise", Self::string_array(&[&self.cipher]));
        security.insert("group", Self::string_array(&[&self.cipher]));

        self.inner
            .with_section(section::WIRELESS, wireless)
            .with_section(section::WIRELESS_SECURITY, security)
            .with_section(section::DOT1X, self.dot1x)
            .build()
    }

    fn string_array(xs: &[&str]) -> Value<'static> {
        let vals: Vec<String> = xs.iter().map(|s| s.to_string()).collect();
        Value::from(vals)
    }
}
