//! EAP-config document parsing.
//!
//! Decodes the `EAPIdentityProviderList` XML into provider metadata, the
//! ordered authentication method candidates and the usable SSIDs. Only the
//! subset of the eap-metadata schema needed to configure a Wi-Fi profile is
//! read; unknown elements and attributes are ignored.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use serde::Deserialize;

use crate::api::models::{ConfigureError, Helpdesk, ProviderInfo, Ssid};
use crate::types::constants::cipher;
use crate::Result;

/// Options for localized value selection.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Locale such as `nl_NL.UTF-8` or `de`. Only the primary language
    /// subtag is compared. `None` takes the first non-empty value.
    pub locale: Option<String>,
}

impl ParseOptions {
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
        }
    }
}

/// Parsed content of an EAP-config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    pub provider: ProviderInfo,
    /// Candidates in document order.
    pub methods: Vec<AuthenticationMethod>,
    /// Usable SSIDs in document order, never empty.
    pub ssids: Vec<Ssid>,
}

/// An `AuthenticationMethod` candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthenticationMethod {
    #[serde(rename = "EAPMethod", default)]
    pub eap_method: Option<MethodType>,
    #[serde(rename = "ServerSideCredential", default)]
    pub server: Option<ServerCredential>,
    #[serde(rename = "ClientSideCredential", default)]
    pub client: ClientCredential,
    #[serde(rename = "InnerAuthenticationMethod", default)]
    pub inner: Vec<InnerMethod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MethodType {
    #[serde(rename = "Type")]
    pub code: i32,
}

/// An inner method, declared either as an EAP or a non-EAP type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InnerMethod {
    #[serde(rename = "EAPMethod", default)]
    pub eap: Option<MethodType>,
    #[serde(rename = "NonEAPAuthMethod", default)]
    pub non_eap: Option<MethodType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerCredential {
    #[serde(rename = "CA", default)]
    pub ca: Vec<CertData>,
    #[serde(rename = "ServerID", default)]
    pub server_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientCredential {
    #[serde(rename = "OuterIdentity", default)]
    pub outer_identity: String,
    #[serde(rename = "InnerIdentityPrefix", default)]
    pub inner_identity_prefix: String,
    #[serde(rename = "InnerIdentitySuffix", default)]
    pub inner_identity_suffix: String,
    #[serde(rename = "InnerIdentityHint", default)]
    pub inner_identity_hint: bool,
    #[serde(rename = "UserName", default)]
    pub username: String,
    #[serde(rename = "Password", default)]
    pub password: String,
    #[serde(rename = "ClientCertificate", default)]
    pub client_certificate: Option<CertData>,
    #[serde(rename = "Passphrase", default)]
    pub passphrase: String,
}

/// Embedded certificate material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CertData {
    #[serde(rename = "@format", default)]
    pub format: String,
    #[serde(rename = "@encoding", default)]
    pub encoding: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl CertData {
    /// Whether this is a base64 encoded X.509 certificate.
    pub fn is_valid(&self) -> bool {
        self.encoding == "base64" && self.format == "X.509"
    }

    /// DER bytes of a CA entry, or `None` if the entry is unusable.
    pub fn decode(&self) -> Option<Vec<u8>> {
        if !self.is_valid() {
            return None;
        }
        self.base64_bytes()
    }

    /// Bytes of a client certificate container (`PKCS12`).
    pub fn decode_container(&self) -> Option<Vec<u8>> {
        if self.encoding != "base64" || !matches!(self.format.as_str(), "PKCS12" | "X.509") {
            return None;
        }
        self.base64_bytes()
    }

    fn base64_bytes(&self) -> Option<Vec<u8>> {
        let compact: String = self.value.split_whitespace().collect();
        match STANDARD.decode(compact) {
            Ok(der) => Some(der),
            Err(e) => {
                debug!("Skipping certificate entry with bad base64: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawList {
    #[serde(rename = "EAPIdentityProvider", default)]
    provider: Option<RawProvider>,
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    #[serde(rename = "AuthenticationMethods", default)]
    methods: Option<RawMethods>,
    #[serde(rename = "CredentialApplicability", default)]
    applicability: Option<RawApplicability>,
    #[serde(rename = "ProviderInfo", default)]
    info: Option<RawProviderInfo>,
}

#[derive(Debug, Deserialize)]
struct RawMethods {
    #[serde(rename = "AuthenticationMethod", default)]
    list: Vec<AuthenticationMethod>,
}

#[derive(Debug, Deserialize)]
struct RawApplicability {
    #[serde(rename = "IEEE80211", default)]
    ieee80211: Vec<RawIeee80211>,
}

#[derive(Debug, Deserialize)]
struct RawIeee80211 {
    #[serde(rename = "SSID", default)]
    ssid: String,
    #[serde(rename = "MinRSNProto", default)]
    min_rsn_proto: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawProviderInfo {
    #[serde(rename = "DisplayName", default)]
    display_name: Vec<Localized>,
    #[serde(rename = "Description", default)]
    description: Vec<Localized>,
    #[serde(rename = "ProviderLogo", default)]
    logo: Option<RawLogo>,
    #[serde(rename = "TermsOfUse", default)]
    terms: Vec<Localized>,
    #[serde(rename = "Helpdesk", default)]
    helpdesk: Option<RawHelpdesk>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHelpdesk {
    #[serde(rename = "EmailAddress", default)]
    email: Vec<Localized>,
    #[serde(rename = "WebAddress", default)]
    web: Vec<Localized>,
    #[serde(rename = "Phone", default)]
    phone: Vec<Localized>,
}

#[derive(Debug, Deserialize)]
struct RawLogo {
    #[serde(rename = "@mime", default)]
    mime: String,
    #[serde(rename = "@encoding", default)]
    encoding: String,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct Localized {
    #[serde(rename = "@xml:lang", alias = "@lang", default)]
    lang: String,
    #[serde(rename = "$text", default)]
    value: String,
}

/// Parses a document taking the first non-empty localized values.
pub fn parse(bytes: &[u8]) -> Result<ConfigDocument> {
    parse_with(bytes, &ParseOptions::default())
}

/// Parses a document.
///
/// Fails with [`ConfigureError::Parse`] on malformed XML,
/// [`ConfigureError::NoAuthenticationMethods`] when no candidate is listed
/// and [`ConfigureError::NoViableSsid`] when no SSID entry is usable.
pub fn parse_with(bytes: &[u8], opts: &ParseOptions) -> Result<ConfigDocument> {
    let raw: RawList = quick_xml::de::from_reader(bytes)?;
    let provider = raw.provider.ok_or(ConfigureError::MissingProvider)?;

    let methods = provider.methods.map(|m| m.list).unwrap_or_default();
    if methods.is_empty() {
        return Err(ConfigureError::NoAuthenticationMethods);
    }

    let ssids = viable_ssids(
        provider
            .applicability
            .map(|a| a.ieee80211)
            .unwrap_or_default(),
    );
    if ssids.is_empty() {
        return Err(ConfigureError::NoViableSsid);
    }

    let locale = opts.locale.as_deref();
    let info = provider.info.unwrap_or_default();
    let helpdesk = info.helpdesk.unwrap_or_default();

    Ok(ConfigDocument {
        provider: ProviderInfo {
            display_name: localized(&info.display_name, locale),
            description: localized(&info.description, locale),
            logo: info.logo.as_ref().map(decode_logo).unwrap_or_default(),
            logo_mime: info.logo.map(|l| l.mime).unwrap_or_default(),
            terms: localized(&info.terms, locale),
            helpdesk: Helpdesk {
                email: localized(&helpdesk.email, locale),
                phone: localized(&helpdesk.phone, locale),
                web: localized(&helpdesk.web, locale),
            },
        },
        methods,
        ssids,
    })
}

fn viable_ssids(entries: Vec<RawIeee80211>) -> Vec<Ssid> {
    entries
        .into_iter()
        .filter_map(|e| {
            let value = e.ssid.trim();
            let min_rsn = e.min_rsn_proto.trim();
            if value.is_empty() || min_rsn.is_empty() {
                return None;
            }
            if min_rsn.eq_ignore_ascii_case(cipher::WEAK) {
                debug!("Dropping SSID {value} with weak cipher {min_rsn}");
                return None;
            }
            Some(Ssid::new(value, min_rsn))
        })
        .collect()
}

fn decode_logo(logo: &RawLogo) -> Vec<u8> {
    if logo.encoding != "base64" {
        return Vec::new();
    }
    let compact: String = logo.value.split_whitespace().collect();
    STANDARD.decode(compact).unwrap_or_default()
}

fn primary_subtag(tag: &str) -> Option<&str> {
    tag.split(['-', '_', '.', '@'])
        .next()
        .filter(|s| !s.is_empty())
}

fn localized(values: &[Localized], locale: Option<&str>) -> String {
    let mut non_empty = values.iter().filter(|v| !v.value.trim().is_empty());

    if let Some(wanted) = locale.and_then(primary_subtag) {
        let hit = values.iter().find(|v| {
            !v.value.trim().is_empty()
                && primary_subtag(&v.lang).is_some_and(|l| l.eq_ignore_ascii_case(wanted))
        });
        if let Some(v) = hit {
            return v.value.trim().to_string();
        }
    }

    non_empty
        .next()
        .map(|v| v.value.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EAPIdentityProviderList xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <EAPIdentityProvider ID="example.edu" namespace="urn:RFC4282:realm" lang="en" version="1">
    <AuthenticationMethods>
      <AuthenticationMethod>
        <EAPMethod><Type>25</Type></EAPMethod>
        <ServerSideCredential>
          <CA format="X.509" encoding="base64">AAAA</CA>
          <ServerID>radius.example.edu</ServerID>
        </ServerSideCredential>
        <ClientSideCredential>
          <OuterIdentity>anonymous@example.edu</OuterIdentity>
          <InnerIdentitySuffix>example.edu</InnerIdentitySuffix>
          <InnerIdentityHint>true</InnerIdentityHint>
        </ClientSideCredential>
        <InnerAuthenticationMethod>
          <EAPMethod><Type>26</Type></EAPMethod>
        </InnerAuthenticationMethod>
      </AuthenticationMethod>
      <AuthenticationMethod>
        <EAPMethod><Type>21</Type></EAPMethod>
        <InnerAuthenticationMethod>
          <NonEAPAuthMethod><Type>1</Type></NonEAPAuthMethod>
        </InnerAuthenticationMethod>
      </AuthenticationMethod>
    </AuthenticationMethods>
    <CredentialApplicability>
      <IEEE80211><SSID>eduroam</SSID><MinRSNProto>CCMP</MinRSNProto></IEEE80211>
      <IEEE80211><SSID>eduroam-legacy</SSID><MinRSNProto>TKIP</MinRSNProto></IEEE80211>
      <IEEE80211><ConsortiumOID>001bc50460</ConsortiumOID></IEEE80211>
    </CredentialApplicability>
    <ProviderInfo>
      <DisplayName lang="nl"></DisplayName>
      <DisplayName lang="en">Example University</DisplayName>
      <DisplayName lang="de">Beispiel Universität</DisplayName>
      <Description>Campus Wi-Fi</Description>
      <ProviderLogo mime="image/png" encoding="base64">iVBORw==</ProviderLogo>
      <TermsOfUse>Be nice.</TermsOfUse>
      <Helpdesk>
        <EmailAddress>help@example.edu</EmailAddress>
        <WebAddress>https://help.example.edu</WebAddress>
        <Phone>+31 000</Phone>
      </Helpdesk>
    </ProviderInfo>
  </EAPIdentityProvider>
</EAPIdentityProviderList>"#;

    #[test]
    fn parses_provider_info() {
        let doc = parse(DOC.as_bytes()).unwrap();
        let info = &doc.provider;
        assert_eq!(info.display_name, "Example University");
        assert_eq!(info.description, "Campus Wi-Fi");
        assert_eq!(info.terms, "Be nice.");
        assert_eq!(info.logo_mime, "image/png");
        assert_eq!(info.logo, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(info.helpdesk.email, "help@example.edu");
        assert_eq!(info.helpdesk.web, "https://help.example.edu");
        assert_eq!(info.helpdesk.phone, "+31 000");
    }

    #[test]
    fn locale_prefers_matching_language() {
        let doc = parse_with(DOC.as_bytes(), &ParseOptions::with_locale("de_DE.UTF-8")).unwrap();
        assert_eq!(doc.provider.display_name, "Beispiel Universität");

        // empty match falls back to first non-empty
        let doc = parse_with(DOC.as_bytes(), &ParseOptions::with_locale("nl")).unwrap();
        assert_eq!(doc.provider.display_name, "Example University");
    }

    #[test]
    fn parses_methods_in_order() {
        let doc = parse(DOC.as_bytes()).unwrap();
        assert_eq!(doc.methods.len(), 2);

        let first = &doc.methods[0];
        assert_eq!(first.eap_method, Some(MethodType { code: 25 }));
        let server = first.server.as_ref().unwrap();
        assert_eq!(server.server_ids, vec!["radius.example.edu".to_string()]);
        assert_eq!(server.ca.len(), 1);
        assert!(server.ca[0].is_valid());
        assert_eq!(first.client.outer_identity, "anonymous@example.edu");
        assert!(first.client.inner_identity_hint);
        assert_eq!(first.inner[0].eap, Some(MethodType { code: 26 }));

        let second = &doc.methods[1];
        assert!(second.server.is_none());
        assert_eq!(second.inner[0].non_eap, Some(MethodType { code: 1 }));
    }

    #[test]
    fn weak_and_incomplete_ssids_are_dropped() {
        let doc = parse(DOC.as_bytes()).unwrap();
        assert_eq!(doc.ssids, vec![Ssid::new("eduroam", "CCMP")]);
    }

    #[test]
    fn keeps_every_viable_ssid() {
        let xml = DOC.replace(
            "<SSID>eduroam-legacy</SSID><MinRSNProto>TKIP</MinRSNProto>",
            "<SSID>eduroam-visitor</SSID><MinRSNProto>CCMP</MinRSNProto>",
        );
        let doc = parse(xml.as_bytes()).unwrap();
        let names: Vec<&str> = doc.ssids.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(names, ["eduroam", "eduroam-visitor"]);
    }

    #[test]
    fn no_viable_ssid() {
        let xml = DOC.replace("<MinRSNProto>CCMP</MinRSNProto>", "<MinRSNProto>TKIP</MinRSNProto>");
        assert!(matches!(
            parse(xml.as_bytes()),
            Err(ConfigureError::NoViableSsid)
        ));
    }

    #[test]
    fn no_methods() {
        let xml = r#"<EAPIdentityProviderList><EAPIdentityProvider>
            <AuthenticationMethods></AuthenticationMethods>
            </EAPIdentityProvider></EAPIdentityProviderList>"#;
        assert!(matches!(
            parse(xml.as_bytes()),
            Err(ConfigureError::NoAuthenticationMethods)
        ));
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let xml = "<EAPIdentityProviderList><EAPIdentityProvider></Wrong></EAPIdentityProviderList>";
        assert!(matches!(
            parse(xml.as_bytes()),
            Err(ConfigureError::Parse(_))
        ));
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse(DOC.as_bytes()).unwrap(), parse(DOC.as_bytes()).unwrap());
    }

    #[test]
    fn cert_data_requires_base64() {
        let mut data = CertData {
            format: "X.509".into(),
            encoding: "base64".into(),
            value: "AAEC\n AwQ=".into(),
        };
        assert_eq!(data.decode(), Some(vec![0, 1, 2, 3, 4]));

        data.encoding = "hex".into();
        assert_eq!(data.decode(), None);

        data.encoding = "base64".into();
        data.format = "PEM".into();
        assert!(!data.is_valid());

        data.format = "PKCS12".into();
        assert_eq!(data.decode(), None);
        assert_eq!(data.decode_container(), Some(vec![0, 1, 2, 3, 4]));
    }
}
