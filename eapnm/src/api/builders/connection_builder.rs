//! Core connection builder for NetworkManager settings.
//!
//! This module provides a builder API for constructing NetworkManager
//! connection settings dictionaries. The `ConnectionBuilder` handles the
//! common sections (connection metadata, IPv4/IPv6 configuration) and lets
//! type-specific builders add their own sections.
//!
//! # Example
//!
//! ```rust
//! use eapnm::builders::ConnectionBuilder;
//!
//! let settings = ConnectionBuilder::new("802-11-wireless", "eduroam (from eapnm)")
//!     .autoconnect_priority(1)
//!     .permissions(&["alice"])
//!     .ipv4_auto()
//!     .ipv6_auto()
//!     .build();
//! ```

use std::collections::HashMap;
use uuid::Uuid;
use zvariant::Value;

use crate::types::constants::section;

/// Settings dictionary as sent to NetworkManager.
pub type SettingsMap = HashMap<&'static str, HashMap<&'static str, Value<'static>>>;

/// Core connection settings builder.
///
/// # Sections Managed
///
/// - `connection`: Metadata (type, id, uuid, autoconnect, permissions)
/// - `ipv4`: IPv4 method
/// - `ipv6`: IPv6 method
pub struct ConnectionBuilder {
    settings: SettingsMap,
}

impl ConnectionBuilder {
    /// Creates a new connection builder with the specified type and ID.
    ///
    /// A random UUID is assigned; use [`uuid`](Self::uuid) to keep an
    /// existing one.
    pub fn new(connection_type: &str, id: impl Into<String>) -> Self {
        let mut settings = HashMap::new();
        let mut connection = HashMap::new();

        connection.insert("type", Value::from(connection_type.to_string()));
        connection.insert("id", Value::from(id.into()));
        connection.insert("uuid", Value::from(Uuid::new_v4().to_string()));

        settings.insert(section::CONNECTION, connection);

        Self { settings }
    }

    /// Sets a specific UUID for the connection.
    ///
    /// NetworkManager rejects updates that change a profile's UUID, so
    /// updates must carry the live one.
    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        if let Some(conn) = self.settings.get_mut(section::CONNECTION) {
            conn.insert("uuid", Value::from(uuid.into()));
        }
        self
    }

    /// Sets the autoconnect priority (higher values are preferred).
    ///
    /// NetworkManager's default is 0.
    pub fn autoconnect_priority(mut self, priority: i32) -> Self {
        if let Some(conn) = self.settings.get_mut(section::CONNECTION) {
            conn.insert("autoconnect-priority", Value::from(priority));
        }
        self
    }

    /// Restricts the connection to the given users.
    pub fn permissions<S: AsRef<str>>(mut self, users: &[S]) -> Self {
        let entries: Vec<String> = users
            .iter()
            .map(|u| format!("user:{}", u.as_ref()))
            .collect();
        self.permission_entries(entries)
    }

    /// Sets raw `connection.permissions` entries (`user:<name>[:<reserved>]`).
    pub fn permission_entries(mut self, entries: Vec<String>) -> Self {
        if let Some(conn) = self.settings.get_mut(section::CONNECTION) {
            conn.insert("permissions", Value::from(entries));
        }
        self
    }

    /// Configures IPv4 to use DHCP.
    pub fn ipv4_auto(self) -> Self {
        self.ipv4_method("auto")
    }

    /// Configures IPv6 to use SLAAC/DHCPv6.
    pub fn ipv6_auto(self) -> Self {
        self.ipv6_method("auto")
    }

    /// Sets `ipv4.method` verbatim.
    pub fn ipv4_method(mut self, method: impl Into<String>) -> Self {
        let mut ipv4 = HashMap::new();
        ipv4.insert("method", Value::from(method.into()));
        self.settings.insert(section::IPV4, ipv4);
        self
    }

    /// Sets `ipv6.method` verbatim.
    pub fn ipv6_method(mut self, method: impl Into<String>) -> Self {
        let mut ipv6 = HashMap::new();
        ipv6.insert("method", Value::from(method.into()));
        self.settings.insert(section::IPV6, ipv6);
        self
    }

    /// Adds or replaces a complete settings section.
    pub fn with_section(
        mut self,
        name: &'static str,
        section: HashMap<&'static str, Value<'static>>,
    ) -> Self {
        self.settings.insert(name, section);
        self
    }

    /// Builds and returns the final settings dictionary.
    pub fn build(self) -> SettingsMap {
        self.settings
    }
}
