//! Per-SSID profile payloads and the files they reference.

use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use uuid::Uuid;
use zvariant::Value;

use crate::api::builders::{EnterpriseWifiBuilder, SettingsMap};
use crate::api::models::{CaTrust, ConfigureError, NetworkModel, ProfileOptions, Ssid};
use crate::cert::ClientCert;
use crate::dbus::RemoteSettings;
use crate::types::constants::section;
use crate::util::files::MaterialStore;
use crate::util::utils::decode_ssid_or_empty;
use crate::Result;

const CA_DIR: &str = "ca";
const CA_FILE: &str = "ca.pem";
const CLIENT_CERT_FILE: &str = "client.pem";
const PRIVATE_KEY_FILE: &str = "private-key.pem";
const GENERATION_PREFIX: &str = "material-";

/// Where the CA trust material was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaLocation {
    Directory(PathBuf),
    File(PathBuf),
}

/// Client certificate files of a certificate network.
#[derive(Debug, Clone)]
pub struct ClientFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub key_password: String,
}

/// Files written for one Configure-call, shared by every SSID.
///
/// Each call writes into its own `material-<id>` directory. Earlier
/// directories stay until [`Material::prune_others`] removes them.
#[derive(Debug, Clone)]
pub struct Material {
    pub dir: PathBuf,
    pub ca: CaLocation,
    pub client: Option<ClientFiles>,
}

impl Material {
    /// Removes this call's files after the call failed outright.
    pub fn discard(&self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!("Failed to remove {}: {e}", self.dir.display());
        }
    }

    /// Removes every other call's files once no profile references them.
    pub fn prune_others(&self, store: &MaterialStore) -> Result<()> {
        for entry in fs::read_dir(store.root())? {
            let path = entry?.path();
            let generation = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(GENERATION_PREFIX));
            if !generation || path == self.dir {
                continue;
            }
            debug!("Removing old material {}", path.display());
            fs::remove_dir_all(&path)?;
        }
        Ok(())
    }
}

/// Writes the CA chain and, for certificate networks, the client
/// certificate and a freshly encrypted key into a new directory in `store`.
///
/// Fails with [`ConfigureError::ClientCertificateRequired`] before writing
/// anything if a certificate network has no decoded certificate.
pub fn write_material(
    model: &NetworkModel,
    store: &MaterialStore,
    ca_trust: CaTrust,
) -> Result<Material> {
    let client_cert = match model {
        NetworkModel::Certificate(net) => Some(
            net.client_cert()
                .ok_or(ConfigureError::ClientCertificateRequired)?,
        ),
        NetworkModel::Password(_) => None,
    };

    let name = format!("{GENERATION_PREFIX}{}", Uuid::new_v4().simple());
    let generation = MaterialStore::new(store.fresh_dir(&name)?);
    let written = write_generation(model, client_cert, &generation, ca_trust);
    if written.is_err() {
        let _ = fs::remove_dir_all(generation.root());
    }
    written
}

fn write_generation(
    model: &NetworkModel,
    client_cert: Option<&ClientCert>,
    generation: &MaterialStore,
    ca_trust: CaTrust,
) -> Result<Material> {
    let chain = &model.base().cert_chain;
    let ca = match ca_trust {
        CaTrust::Directory => {
            let dir = generation.fresh_dir(CA_DIR)?;
            chain.write_hashed_dir(&dir)?;
            CaLocation::Directory(dir)
        }
        CaTrust::File => CaLocation::File(generation.write(CA_FILE, &chain.to_pem()?)?),
    };
    debug!("Wrote CA material to {ca:?}");

    let client = match client_cert {
        Some(cert) => {
            let cert_path = generation.write(CLIENT_CERT_FILE, &cert.certificate_pem()?)?;
            let (key_pem, key_password) = cert.encrypted_key_pem()?;
            let key_path = generation.write(PRIVATE_KEY_FILE, &key_pem)?;
            Some(ClientFiles {
                cert: cert_path,
                key: key_path,
                key_password,
            })
        }
        None => None,
    };

    Ok(Material {
        dir: generation.root().to_path_buf(),
        ca,
        client,
    })
}

/// `connection.uuid` of a payload.
pub fn payload_uuid(settings: &SettingsMap) -> Option<String> {
    match settings.get(section::CONNECTION).and_then(|c| c.get("uuid")) {
        Some(Value::Str(s)) => Some(s.as_str().to_string()),
        _ => None,
    }
}

/// Fields of a saved profile that survive an in-place update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveProfile {
    pub uuid: Option<String>,
    pub ssid: String,
    pub permissions: Option<Vec<String>>,
    pub ipv4_method: Option<String>,
    pub ipv6_method: Option<String>,
}

impl LiveProfile {
    pub fn from_settings(settings: &RemoteSettings) -> Self {
        let ssid = settings
            .get(section::WIRELESS)
            .and_then(|s| s.get("ssid"))
            .map(|v| match &**v {
                Value::Array(arr) => {
                    let raw: Vec<u8> = arr
                        .iter()
                        .filter_map(|b| match b {
                            Value::U8(b) => Some(*b),
                            _ => None,
                        })
                        .collect();
                    decode_ssid_or_empty(&raw).into_owned()
                }
                _ => String::new(),
            })
            .unwrap_or_default();

        Self {
            uuid: string_field(settings, section::CONNECTION, "uuid"),
            ssid,
            permissions: settings
                .get(section::CONNECTION)
                .and_then(|s| s.get("permissions"))
                .and_then(|v| match &**v {
                    Value::Array(arr) => Some(
                        arr.iter()
                            .filter_map(|p| match p {
                                Value::Str(s) => Some(s.as_str().to_string()),
                                _ => None,
                            })
                            .collect(),
                    ),
                    _ => None,
                }),
            ipv4_method: string_field(settings, section::IPV4, "method"),
            ipv6_method: string_field(settings, section::IPV6, "method"),
        }
    }
}

fn string_field(settings: &RemoteSettings, section: &str, key: &str) -> Option<String> {
    match settings.get(section).and_then(|s| s.get(key)).map(|v| &**v) {
        Some(Value::Str(s)) => Some(s.as_str().to_string()),
        _ => None,
    }
}

/// Builds the settings payload for one SSID.
///
/// With `live` set, the result updates that profile in place: its UUID,
/// permissions and IP methods are carried over.
pub fn profile_settings(
    model: &NetworkModel,
    ssid: &Ssid,
    material: &Material,
    opts: &ProfileOptions,
    live: Option<&LiveProfile>,
) -> Result<SettingsMap> {
    let base = model.base();
    let id = format!("{} (from {})", ssid.value, opts.app_name);

    let mut builder = EnterpriseWifiBuilder::new(id, ssid.value.as_str(), &ssid.min_rsn)
        .autoconnect_priority(opts.autoconnect_priority)
        .server_names(base.server_ids.as_slice());

    builder = match &material.ca {
        CaLocation::Directory(dir) => builder.ca_directory(dir),
        CaLocation::File(file) => builder.ca_file(file),
    };

    builder = match model {
        NetworkModel::Password(net) => builder.password_auth(
            net.outer,
            net.inner,
            net.credentials.username.as_str(),
            net.credentials.password.as_str(),
            base.anon_identity.as_str(),
        ),
        NetworkModel::Certificate(_) => {
            let files = material
                .client
                .as_ref()
                .ok_or(ConfigureError::ClientCertificateRequired)?;
            builder.tls_auth(
                base.anon_identity.as_str(),
                &files.cert,
                &files.key,
                files.key_password.as_str(),
            )
        }
    };

    let live = live.cloned().unwrap_or_default();
    if let Some(uuid) = live.uuid {
        builder = builder.uuid(uuid);
    }
    builder = match (live.permissions, &opts.user) {
        (Some(entries), _) => builder.permission_entries(entries),
        (None, Some(user)) => builder.permissions(&[user]),
        (None, None) => builder,
    };

    Ok(builder
        .ipv4_method(live.ipv4_method.unwrap_or_else(|| "auto".into()))
        .ipv6_method(live.ipv6_method.unwrap_or_else(|| "auto".into()))
        .build())
}
