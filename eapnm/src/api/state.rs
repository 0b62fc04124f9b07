//! Persisted connection record.
//!
//! The only state that outlives a Configure-call: which profiles we own
//! and when the client certificate behind them expires. Stored as a
//! versioned JSON envelope; the legacy single-UUID form is upgraded on read.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::types::constants::defaults;
use crate::util::files::{MaterialStore, create_private_dir, write_private_file};
use crate::Result;

/// Profiles owned by us plus the optional certificate expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub uuids: Vec<String>,
    #[serde(default)]
    pub validity: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LegacyRecord {
    #[serde(default)]
    uuid: String,
}

#[derive(Debug, Serialize, Deserialize)]
enum Envelope {
    #[serde(rename = "v1")]
    V1(LegacyRecord),
    #[serde(rename = "v2")]
    V2(ConnectionRecord),
}

impl From<Envelope> for ConnectionRecord {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::V1(legacy) => {
                debug!("Upgrading v1 state record");
                Self {
                    uuids: Some(legacy.uuid)
                        .filter(|u| !u.is_empty())
                        .into_iter()
                        .collect(),
                    validity: None,
                }
            }
            Envelope::V2(record) => record,
        }
    }
}

impl ConnectionRecord {
    /// Decodes any supported envelope version.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        Ok(envelope.into())
    }

    /// Encodes as the current envelope version.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&Envelope::V2(self.clone()))?)
    }
}

/// Read/write access to the persisted record.
///
/// Assumes a single writer for the duration of a Configure-call.
pub trait StateStore: Send + Sync {
    /// Returns an empty record when nothing was stored yet.
    fn load(&self) -> Result<ConnectionRecord>;

    fn save(&self, record: &ConnectionRecord) -> Result<()>;
}

/// JSON file backed [`StateStore`].
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The `state` file next to the certificate material.
    pub fn in_store(store: &MaterialStore) -> Self {
        Self::new(store.root().join(defaults::STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for StateFile {
    fn load(&self) -> Result<ConnectionRecord> {
        match fs::read(&self.path) {
            Ok(bytes) => ConnectionRecord::from_json(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ConnectionRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, record: &ConnectionRecord) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            create_private_dir(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        write_private_file(&tmp, &record.to_json()?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
