//! Settings service seam over NetworkManager's D-Bus API.
//!
//! The reconciler only talks to [`SettingsService`], so it can be driven by
//! the real daemon ([`NmSettings`]) or by an in-memory double in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use zbus::Connection;
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::api::builders::SettingsMap;
use crate::proxies::{NMSettingsConnectionProxy, NMSettingsProxy};
use crate::Result;

/// Settings of a saved profile as returned by `GetSettings`.
pub type RemoteSettings = HashMap<String, HashMap<String, OwnedValue>>;

/// The subset of `org.freedesktop.NetworkManager.Settings` the reconciler uses.
///
/// Calls are made one at a time with no timeout or retry.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Resolves a connection UUID to its object path.
    async fn find_by_uuid(&self, uuid: &str) -> Result<OwnedObjectPath>;

    /// Fetches the settings of a saved profile.
    async fn get_settings(&self, path: &OwnedObjectPath) -> Result<RemoteSettings>;

    /// Adds a persistent profile and returns its path.
    async fn add_connection(&self, settings: SettingsMap) -> Result<OwnedObjectPath>;

    /// Replaces the settings of a saved profile.
    async fn update(&self, path: &OwnedObjectPath, settings: SettingsMap) -> Result<()>;

    /// Deletes a saved profile.
    async fn delete(&self, path: &OwnedObjectPath) -> Result<()>;
}

/// [`SettingsService`] backed by NetworkManager on the system bus.
#[derive(Debug, Clone)]
pub struct NmSettings {
    conn: Connection,
}

impl NmSettings {
    /// Connects to the system bus.
    pub async fn system() -> Result<Self> {
        Ok(Self {
            conn: Connection::system().await?,
        })
    }

    /// Uses an existing bus connection.
    pub fn with_connection(conn: Connection) -> Self {
        Self { conn }
    }

    async fn connection_proxy(
        &self,
        path: &OwnedObjectPath,
    ) -> Result<NMSettingsConnectionProxy<'_>> {
        Ok(NMSettingsConnectionProxy::builder(&self.conn)
            .path(path.clone())?
            .build()
            .await?)
    }
}

#[async_trait]
impl SettingsService for NmSettings {
    async fn find_by_uuid(&self, uuid: &str) -> Result<OwnedObjectPath> {
        let settings = NMSettingsProxy::new(&self.conn).await?;
        Ok(settings.get_connection_by_uuid(uuid).await?)
    }

    async fn get_settings(&self, path: &OwnedObjectPath) -> Result<RemoteSettings> {
        let proxy = self.connection_proxy(path).await?;
        Ok(proxy.get_settings().await?)
    }

    async fn add_connection(&self, settings: SettingsMap) -> Result<OwnedObjectPath> {
        let proxy = NMSettingsProxy::new(&self.conn).await?;
        let path = proxy.add_connection(settings).await?;
        debug!("Added connection: {}", path.as_str());
        Ok(path)
    }

    async fn update(&self, path: &OwnedObjectPath, settings: SettingsMap) -> Result<()> {
        let proxy = self.connection_proxy(path).await?;
        proxy.update(settings).await?;
        debug!("Updated connection: {}", path.as_str());
        Ok(())
    }

    async fn delete(&self, path: &OwnedObjectPath) -> Result<()> {
        let proxy = self.connection_proxy(path).await?;
        proxy.delete().await?;
        debug!("Deleted connection: {}", path.as_str());
        Ok(())
    }
}
