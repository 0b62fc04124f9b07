//! Private on-disk storage for certificate and key material.
//!
//! NetworkManager references certificates by path, so everything the
//! profiles point at lives in a per-user directory only its owner can read.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use log::debug;

use crate::Result;

const DIR_MODE: u32 = 0o700;
const FILE_MODE: u32 = 0o600;

/// Owner-only directory holding CA, client certificate and key files.
#[derive(Debug, Clone)]
pub struct MaterialStore {
    root: PathBuf,
}

impl MaterialStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$XDG_DATA_HOME/<app_name>`, falling back to `~/.local/share/<app_name>`.
    pub fn default_location(app_name: &str) -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
        Self::new(base.join(app_name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory and tightens its mode.
    pub fn ensure(&self) -> Result<()> {
        create_private_dir(&self.root)
    }

    /// Writes `name` under the root with owner-only permissions.
    pub fn write(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.root.join(name);
        write_private_file(&path, contents)?;
        Ok(path)
    }

    /// Replaces the subdirectory `name` with an empty private directory.
    pub fn fresh_dir(&self, name: &str) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.root.join(name);
        if path.exists() {
            debug!("Clearing {}", path.display());
            fs::remove_dir_all(&path)?;
        }
        create_private_dir(&path)?;
        Ok(path)
    }
}

pub(crate) fn create_private_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    fs::set_permissions(path, fs::Permissions::from_mode(DIR_MODE))?;
    Ok(())
}

/// Writes a file readable by its owner only, replacing any previous content.
pub(crate) fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(FILE_MODE)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(FILE_MODE))?;
    file.write_all(contents)?;
    Ok(())
}
