//! Outer and inner EAP methods and their compatibility rules.

use std::fmt;

use crate::types::constants::{eap_type, inner_type};

/// Outer EAP method of an authentication candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EapMethod {
    /// EAP-TLS, certificate only.
    Tls,
    /// EAP-TTLS, tunnels arbitrary inner methods.
    Ttls,
    /// PEAP, tunnels EAP-typed inner methods only.
    Peap,
}

impl EapMethod {
    /// Maps an EAP type code to a supported outer method.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            eap_type::TLS => Some(Self::Tls),
            eap_type::TTLS => Some(Self::Ttls),
            eap_type::PEAP => Some(Self::Peap),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Tls => eap_type::TLS,
            Self::Ttls => eap_type::TTLS,
            Self::Peap => eap_type::PEAP,
        }
    }

    /// Name NetworkManager expects in the `802-1x.eap` list.
    pub fn nm_name(self) -> &'static str {
        match self {
            Self::Tls => "tls",
            Self::Ttls => "ttls",
            Self::Peap => "peap",
        }
    }
}

impl fmt::Display for EapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nm_name())
    }
}

/// Inner (phase 2) authentication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InnerAuth {
    Pap,
    Mschap,
    Mschapv2,
    /// EAP-MSCHAPv2 advertised under the legacy PEAP code.
    EapPeapMschapv2,
    EapMschapv2,
}

impl InnerAuth {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            inner_type::PAP => Some(Self::Pap),
            inner_type::MSCHAP => Some(Self::Mschap),
            inner_type::MSCHAPV2 => Some(Self::Mschapv2),
            inner_type::EAP_PEAP_MSCHAPV2 => Some(Self::EapPeapMschapv2),
            inner_type::EAP_MSCHAPV2 => Some(Self::EapMschapv2),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Pap => inner_type::PAP,
            Self::Mschap => inner_type::MSCHAP,
            Self::Mschapv2 => inner_type::MSCHAPV2,
            Self::EapPeapMschapv2 => inner_type::EAP_PEAP_MSCHAPV2,
            Self::EapMschapv2 => inner_type::EAP_MSCHAPV2,
        }
    }

    /// Whether the method is carried as an EAP method inside the tunnel.
    pub fn is_eap_typed(self) -> bool {
        is_eap_code(self.code())
    }

    /// Value for `phase2-auth` / `phase2-autheap`.
    pub fn nm_name(self) -> &'static str {
        match self {
            Self::Pap => "pap",
            Self::Mschap => "mschap",
            Self::Mschapv2 | Self::EapPeapMschapv2 | Self::EapMschapv2 => "mschapv2",
        }
    }

    /// Settings key the method belongs under for the given outer method.
    ///
    /// Only TTLS distinguishes EAP-typed inner methods (`phase2-autheap`).
    pub fn phase2_key(self, outer: EapMethod) -> &'static str {
        if outer == EapMethod::Ttls && self.is_eap_typed() {
            "phase2-autheap"
        } else {
            "phase2-auth"
        }
    }
}

fn is_eap_code(code: i32) -> bool {
    matches!(
        code,
        inner_type::EAP_PEAP_MSCHAPV2 | inner_type::EAP_MSCHAPV2
    )
}

/// Checks an (outer, inner code, declared-as-EAP) triple against the
/// compatibility table.
///
/// The `eap_typed` flag is how the document declared the inner method
/// (`EAPMethod` vs `NonEAPAuthMethod`). A code declared in the wrong
/// family never matches.
pub fn inner_allowed(outer: EapMethod, code: i32, eap_typed: bool) -> bool {
    if outer == EapMethod::Tls {
        return true;
    }
    if is_eap_code(code) != eap_typed {
        return false;
    }
    match outer {
        EapMethod::Tls => true,
        EapMethod::Ttls => matches!(
            code,
            inner_type::PAP
                | inner_type::MSCHAP
                | inner_type::MSCHAPV2
                | inner_type::EAP_MSCHAPV2
        ),
        EapMethod::Peap => matches!(
            code,
            inner_type::EAP_PEAP_MSCHAPV2 | inner_type::EAP_MSCHAPV2
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_codes_round_trip_names() {
        assert_eq!(EapMethod::from_code(13), Some(EapMethod::Tls));
        assert_eq!(EapMethod::from_code(21), Some(EapMethod::Ttls));
        assert_eq!(EapMethod::from_code(25), Some(EapMethod::Peap));
        assert_eq!(EapMethod::from_code(43), None);
        assert_eq!(EapMethod::Peap.nm_name(), "peap");
    }

    #[test]
    fn tls_accepts_anything() {
        assert!(inner_allowed(EapMethod::Tls, 1, true));
        assert!(inner_allowed(EapMethod::Tls, 99, false));
    }

    #[test]
    fn ttls_table() {
        assert!(inner_allowed(EapMethod::Ttls, 1, false));
        assert!(inner_allowed(EapMethod::Ttls, 2, false));
        assert!(inner_allowed(EapMethod::Ttls, 3, false));
        assert!(inner_allowed(EapMethod::Ttls, 26, true));

        assert!(!inner_allowed(EapMethod::Ttls, 25, true));
        assert!(!inner_allowed(EapMethod::Ttls, 26, false));
        assert!(!inner_allowed(EapMethod::Ttls, 3, true));
        assert!(!inner_allowed(EapMethod::Ttls, 4, false));
    }

    #[test]
    fn peap_only_accepts_eap_mschapv2() {
        assert!(inner_allowed(EapMethod::Peap, 26, true));
        assert!(inner_allowed(EapMethod::Peap, 25, true));

        assert!(!inner_allowed(EapMethod::Peap, 1, false));
        assert!(!inner_allowed(EapMethod::Peap, 3, false));
        assert!(!inner_allowed(EapMethod::Peap, 26, false));
    }

    #[test]
    fn phase2_key_depends_on_outer() {
        assert_eq!(
            InnerAuth::EapMschapv2.phase2_key(EapMethod::Ttls),
            "phase2-autheap"
        );
        assert_eq!(
            InnerAuth::EapMschapv2.phase2_key(EapMethod::Peap),
            "phase2-auth"
        );
        assert_eq!(InnerAuth::Pap.phase2_key(EapMethod::Ttls), "phase2-auth");
        assert_eq!(InnerAuth::EapPeapMschapv2.nm_name(), "mschapv2");
    }
}
