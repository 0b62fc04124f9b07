#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509, X509Builder, X509NameBuilder};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use eapnm::builders::{EnterpriseWifiBuilder, SettingsMap};
use eapnm::{ConfigureError, RemoteSettings, SettingsService};

/// In-memory stand-in for NetworkManager's settings service.
#[derive(Default)]
pub struct FakeSettings {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    profiles: BTreeMap<String, RemoteSettings>,
    next_id: u32,
    adds: usize,
    updates: usize,
    deletes: usize,
    failing_ssids: HashSet<String>,
    fail_deletes: bool,
    fail_get_settings: bool,
}

fn failure(msg: &str) -> ConfigureError {
    ConfigureError::Dbus(zbus::Error::Failure(msg.to_string()))
}

fn to_remote(settings: SettingsMap) -> RemoteSettings {
    settings
        .into_iter()
        .map(|(section, values)| {
            let values = values
                .into_iter()
                .map(|(k, v)| (k.to_string(), OwnedValue::try_from(v).unwrap()))
                .collect();
            (section.to_string(), values)
        })
        .collect()
}

fn payload_ssid(settings: &SettingsMap) -> String {
    match settings.get("802-11-wireless").and_then(|w| w.get("ssid")) {
        Some(Value::Array(arr)) => {
            let bytes: Vec<u8> = arr
                .iter()
                .filter_map(|b| match b {
                    Value::U8(b) => Some(*b),
                    _ => None,
                })
                .collect();
            String::from_utf8(bytes).unwrap()
        }
        _ => String::new(),
    }
}

/// A `file://` path field, with the trailing NUL stripped.
pub fn path_field(settings: &RemoteSettings, section: &str, key: &str) -> Option<PathBuf> {
    let bytes = match settings.get(section).and_then(|s| s.get(key)).map(|v| &**v) {
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|b| match b {
                Value::U8(b) => Some(*b),
                _ => None,
            })
            .collect::<Vec<u8>>(),
        _ => return None,
    };
    let uri = String::from_utf8(bytes).ok()?;
    uri.trim_end_matches('\0')
        .strip_prefix("file://")
        .map(PathBuf::from)
}

pub fn string_field(settings: &RemoteSettings, section: &str, key: &str) -> Option<String> {
    match settings.get(section).and_then(|s| s.get(key)).map(|v| &**v) {
        Some(Value::Str(s)) => Some(s.as_str().to_string()),
        _ => None,
    }
}

impl FakeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes add and update calls for `ssid` fail.
    pub fn fail_ssid(&self, ssid: &str) {
        self.inner.lock().unwrap().failing_ssids.insert(ssid.to_string());
    }

    pub fn fail_deletes(&self) {
        self.inner.lock().unwrap().fail_deletes = true;
    }

    /// Makes every `GetSettings` call fail.
    pub fn fail_get_settings(&self) {
        self.inner.lock().unwrap().fail_get_settings = true;
    }

    pub fn adds(&self) -> usize {
        self.inner.lock().unwrap().adds
    }

    pub fn updates(&self) -> usize {
        self.inner.lock().unwrap().updates
    }

    pub fn deletes(&self) -> usize {
        self.inner.lock().unwrap().deletes
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().profiles.len()
    }

    /// Settings of the profile with `uuid`, if present.
    pub fn settings_for(&self, uuid: &str) -> Option<RemoteSettings> {
        self.inner
            .lock()
            .unwrap()
            .profiles
            .values()
            .find(|s| string_field(s, "connection", "uuid").as_deref() == Some(uuid))
            .cloned()
    }

    /// Removes a profile behind our back, as a user would in nm-applet.
    pub fn remove_externally(&self, uuid: &str) {
        self.inner
            .lock()
            .unwrap()
            .profiles
            .retain(|_, s| string_field(s, "connection", "uuid").as_deref() != Some(uuid));
    }

    /// Saves an unrelated-looking profile for `ssid` and returns its UUID.
    pub fn seed(&self, ssid: &str) -> String {
        let settings = EnterpriseWifiBuilder::new(format!("{ssid} (seeded)"), ssid, "CCMP")
            .ipv4_auto()
            .ipv6_method("ignore")
            .build();
        let remote = to_remote(settings);
        let uuid = string_field(&remote, "connection", "uuid").unwrap();
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let path = format!("/org/freedesktop/NetworkManager/Settings/{}", inner.next_id);
        inner.profiles.insert(path, remote);
        uuid
    }
}

#[async_trait]
impl SettingsService for FakeSettings {
    async fn find_by_uuid(&self, uuid: &str) -> eapnm::Result<OwnedObjectPath> {
        let inner = self.inner.lock().unwrap();
        let path = inner
            .profiles
            .iter()
            .find(|(_, s)| string_field(s, "connection", "uuid").as_deref() == Some(uuid))
            .map(|(p, _)| p.clone())
            .ok_or_else(|| failure("no connection with the uuid"))?;
        Ok(OwnedObjectPath::try_from(path)?)
    }

    async fn get_settings(&self, path: &OwnedObjectPath) -> eapnm::Result<RemoteSettings> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_get_settings {
            return Err(failure("settings unavailable"));
        }
        inner
            .profiles
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| failure("object does not exist"))
    }

    async fn add_connection(&self, settings: SettingsMap) -> eapnm::Result<OwnedObjectPath> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_ssids.contains(&payload_ssid(&settings)) {
            return Err(failure("add rejected"));
        }
        inner.adds += 1;
        inner.next_id += 1;
        let path = format!("/org/freedesktop/NetworkManager/Settings/{}", inner.next_id);
        inner.profiles.insert(path.clone(), to_remote(settings));
        Ok(OwnedObjectPath::try_from(path)?)
    }

    async fn update(&self, path: &OwnedObjectPath, settings: SettingsMap) -> eapnm::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_ssids.contains(&payload_ssid(&settings)) {
            return Err(failure("update rejected"));
        }
        if !inner.profiles.contains_key(path.as_str()) {
            return Err(failure("object does not exist"));
        }
        inner.updates += 1;
        inner
            .profiles
            .insert(path.as_str().to_string(), to_remote(settings));
        Ok(())
    }

    async fn delete(&self, path: &OwnedObjectPath) -> eapnm::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes {
            return Err(failure("delete rejected"));
        }
        inner
            .profiles
            .remove(path.as_str())
            .ok_or_else(|| failure("object does not exist"))?;
        inner.deletes += 1;
        Ok(())
    }
}

fn key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn certificate(cn: &str, key: &PKey<Private>, issuer: Option<(&X509, &PKey<Private>)>, ca: bool) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    let name = name.build();

    let mut b = X509Builder::new().unwrap();
    b.set_version(2).unwrap();
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    b.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();
    b.set_subject_name(&name).unwrap();
    match issuer {
        Some((cert, _)) => b.set_issuer_name(cert.subject_name()).unwrap(),
        None => b.set_issuer_name(&name).unwrap(),
    }
    b.set_pubkey(key).unwrap();
    b.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    b.set_not_after(&Asn1Time::days_from_now(90).unwrap()).unwrap();
    if ca {
        b.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
    }
    let signer = issuer.map(|(_, k)| k).unwrap_or(key);
    b.sign(signer, MessageDigest::sha256()).unwrap();
    b.build()
}

/// Base64 DER of a self-signed root CA.
pub fn root_ca_base64() -> String {
    let key = key();
    STANDARD.encode(certificate("Example Root CA", &key, None, true).to_der().unwrap())
}

/// Base64 PKCS#12 container with a 90 day client certificate.
pub fn client_container_base64(passphrase: &str) -> String {
    let ca_key = key();
    let ca = certificate("Example Client CA", &ca_key, None, true);
    let leaf_key = key();
    let leaf = certificate("alice@example.edu", &leaf_key, Some((&ca, &ca_key)), false);
    let p12 = Pkcs12::builder()
        .name("client")
        .pkey(&leaf_key)
        .cert(&leaf)
        .build2(passphrase)
        .unwrap();
    STANDARD.encode(p12.to_der().unwrap())
}

fn applicability(ssids: &[&str]) -> String {
    ssids
        .iter()
        .map(|s| format!("<IEEE80211><SSID>{s}</SSID><MinRSNProto>CCMP</MinRSNProto></IEEE80211>"))
        .collect()
}

/// A PEAP/MSCHAPv2 document, with credentials when `username` is non-empty.
pub fn password_document(ssids: &[&str], username: &str, password: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<EAPIdentityProviderList>
  <EAPIdentityProvider ID="example.edu" namespace="urn:RFC4282:realm" version="1">
    <AuthenticationMethods>
      <AuthenticationMethod>
        <EAPMethod><Type>25</Type></EAPMethod>
        <ServerSideCredential>
          <CA format="X.509" encoding="base64">{ca}</CA>
          <ServerID>radius.example.edu</ServerID>
        </ServerSideCredential>
        <ClientSideCredential>
          <OuterIdentity>anonymous@example.edu</OuterIdentity>
          <InnerIdentitySuffix>example.edu</InnerIdentitySuffix>
          <InnerIdentityHint>true</InnerIdentityHint>
          <UserName>{username}</UserName>
          <Password>{password}</Password>
        </ClientSideCredential>
        <InnerAuthenticationMethod>
          <EAPMethod><Type>26</Type></EAPMethod>
        </InnerAuthenticationMethod>
      </AuthenticationMethod>
    </AuthenticationMethods>
    <CredentialApplicability>{apps}</CredentialApplicability>
    <ProviderInfo><DisplayName>Example University</DisplayName></ProviderInfo>
  </EAPIdentityProvider>
</EAPIdentityProviderList>"#,
        ca = root_ca_base64(),
        apps = applicability(ssids),
    )
    .into_bytes()
}

/// An EAP-TLS document carrying `container`, which may be empty.
pub fn tls_document(ssids: &[&str], container: &str, passphrase: &str) -> Vec<u8> {
    let client_cert = if container.is_empty() {
        String::new()
    } else {
        format!(r#"<ClientCertificate format="PKCS12" encoding="base64">{container}</ClientCertificate>"#)
    };
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<EAPIdentityProviderList>
  <EAPIdentityProvider ID="example.edu" namespace="urn:RFC4282:realm" version="1">
    <AuthenticationMethods>
      <AuthenticationMethod>
        <EAPMethod><Type>13</Type></EAPMethod>
        <ServerSideCredential>
          <CA format="X.509" encoding="base64">{ca}</CA>
          <ServerID>radius.example.edu</ServerID>
        </ServerSideCredential>
        <ClientSideCredential>
          <OuterIdentity>anonymous@example.edu</OuterIdentity>
          {client_cert}
          <Passphrase>{passphrase}</Passphrase>
        </ClientSideCredential>
      </AuthenticationMethod>
    </AuthenticationMethods>
    <CredentialApplicability>{apps}</CredentialApplicability>
    <ProviderInfo><DisplayName>Example University</DisplayName></ProviderInfo>
  </EAPIdentityProvider>
</EAPIdentityProviderList>"#,
        ca = root_ca_base64(),
        apps = applicability(ssids),
    )
    .into_bytes()
}
