//! Constants for EAP method codes and NetworkManager setting names.
//!
//! The numeric codes follow the IANA EAP method registry and the
//! non-EAP inner method numbering used by eap-config documents.

/// Outer EAP method type codes.
pub mod eap_type {
    pub const TLS: i32 = 13;
    pub const TTLS: i32 = 21;
    pub const PEAP: i32 = 25;
}

/// Inner authentication method codes.
///
/// Codes 1 to 3 are non-EAP (tunneled) methods. 25 and 26 are EAP-typed.
pub mod inner_type {
    pub const PAP: i32 = 1;
    pub const MSCHAP: i32 = 2;
    pub const MSCHAPV2: i32 = 3;
    /// Legacy alias some documents use for EAP-MSCHAPv2 inside PEAP.
    pub const EAP_PEAP_MSCHAPV2: i32 = 25;
    pub const EAP_MSCHAPV2: i32 = 26;
}

/// NetworkManager settings section names.
pub mod section {
    pub const CONNECTION: &str = "connection";
    pub const WIRELESS: &str = "802-11-wireless";
    pub const WIRELESS_SECURITY: &str = "802-11-wireless-security";
    pub const DOT1X: &str = "802-1x";
    pub const IPV4: &str = "ipv4";
    pub const IPV6: &str = "ipv6";
}

/// Profile defaults.
pub mod defaults {
    /// Name used for the profile id and the private material directory.
    pub const APP_NAME: &str = "eapnm";

    /// One above NetworkManager's default so our profile wins over a stale
    /// default-priority profile for the same SSID.
    pub const AUTOCONNECT_PRIORITY: i32 = 1;

    /// Name of the persisted state file inside the data directory.
    pub const STATE_FILE: &str = "state";
}

/// Cipher suites that never qualify an SSID entry.
pub mod cipher {
    pub const WEAK: &str = "TKIP";
}
