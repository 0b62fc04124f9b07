//! Connection profile reconciliation.
//!
//! Makes the saved NetworkManager profiles match the SSIDs of a resolved
//! network model. Profiles recorded by a previous run are updated in place
//! when they still serve a required SSID and deleted otherwise.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use zvariant::OwnedObjectPath;

use super::profile::{LiveProfile, Material, payload_uuid, profile_settings};
use crate::api::models::{ConfigureError, NetworkModel, ProfileOptions, Ssid};
use crate::dbus::SettingsService;
use crate::Result;

/// Result of a reconciliation pass.
#[derive(Debug)]
pub struct Reconciled {
    /// UUIDs now in use, to be persisted by the caller.
    pub uuids: Vec<String>,
    /// Failure of a later SSID after an earlier one succeeded.
    pub partial_failure: Option<ConfigureError>,
}

/// A previously recorded profile that is still present.
struct Previous {
    uuid: String,
    path: OwnedObjectPath,
    live: LiveProfile,
}

/// Drives create/update/delete calls against a [`SettingsService`].
pub struct Reconciler<'a, S: SettingsService + ?Sized> {
    service: &'a S,
    opts: &'a ProfileOptions,
}

impl<'a, S: SettingsService + ?Sized> Reconciler<'a, S> {
    pub fn new(service: &'a S, opts: &'a ProfileOptions) -> Self {
        Self { service, opts }
    }

    /// Reconciles `model` against the profiles recorded in `previous`.
    ///
    /// A failure on the first SSID is returned as an error and nothing is
    /// deleted. A failure on a later SSID stops processing and is reported
    /// through [`Reconciled::partial_failure`]; profiles of SSIDs not reached
    /// are kept and stay in the returned set.
    pub async fn reconcile(
        &self,
        model: &NetworkModel,
        material: &Material,
        previous: &[String],
    ) -> Result<Reconciled> {
        let (mut by_ssid, duplicates) = self.previous_by_ssid(previous).await;

        let mut seen = HashSet::new();
        let ssids: Vec<_> = model
            .base()
            .ssids
            .iter()
            .filter(|s| seen.insert(s.value.as_str()))
            .collect();

        let mut uuids = Vec::with_capacity(ssids.len());
        let mut partial_failure = None;
        let mut unreached = Vec::new();

        for (i, ssid) in ssids.iter().enumerate() {
            let prev = by_ssid.remove(ssid.value.as_str());
            match self.install(model, ssid, material, prev.as_ref()).await {
                Ok(uuid) => uuids.push(uuid),
                Err(e) if uuids.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        "Installed {} of {} SSIDs, {} failed: {e}",
                        uuids.len(),
                        ssids.len(),
                        ssid.value
                    );
                    unreached.extend(prev);
                    unreached.extend(
                        ssids[i + 1..]
                            .iter()
                            .filter_map(|s| by_ssid.remove(s.value.as_str())),
                    );
                    partial_failure = Some(e);
                    break;
                }
            }
        }

        for stale in by_ssid.into_values().chain(duplicates) {
            debug!(
                "Removing stale connection {} for SSID {}",
                stale.uuid, stale.live.ssid
            );
            match self.service.delete(&stale.path).await {
                Ok(()) => info!("Deleted stale connection {}", stale.uuid),
                Err(e) => warn!("Failed to delete stale connection {}: {e}", stale.uuid),
            }
        }

        uuids.extend(unreached.into_iter().map(|p| p.uuid));
        Ok(Reconciled {
            uuids,
            partial_failure,
        })
    }

    /// Maps the SSID of every reachable previous profile to that profile.
    ///
    /// Unreachable identifiers are treated as already gone. Further profiles
    /// for an already mapped SSID are returned separately for deletion.
    async fn previous_by_ssid(
        &self,
        previous: &[String],
    ) -> (HashMap<String, Previous>, Vec<Previous>) {
        let mut by_ssid = HashMap::new();
        let mut duplicates = Vec::new();
        for uuid in previous {
            let path = match self.service.find_by_uuid(uuid).await {
                Ok(path) => path,
                Err(e) => {
                    debug!("Previous connection {uuid} is gone: {e}");
                    continue;
                }
            };
            let live = match self.service.get_settings(&path).await {
                Ok(settings) => LiveProfile::from_settings(&settings),
                Err(e) => {
                    debug!("Failed getting settings of previous connection {uuid}: {e}");
                    continue;
                }
            };
            if live.ssid.is_empty() {
                debug!("Previous connection {uuid} has no SSID");
                continue;
            }
            let prev = Previous {
                uuid: uuid.clone(),
                path,
                live,
            };
            if by_ssid.contains_key(&prev.live.ssid) {
                debug!("Duplicate previous connection {uuid} for {}", prev.live.ssid);
                duplicates.push(prev);
                continue;
            }
            by_ssid.insert(prev.live.ssid.clone(), prev);
        }
        (by_ssid, duplicates)
    }

    /// Creates or updates the profile for one SSID and returns its UUID.
    async fn install(
        &self,
        model: &NetworkModel,
        ssid: &Ssid,
        material: &Material,
        prev: Option<&Previous>,
    ) -> Result<String> {
        match prev {
            Some(prev) => {
                let settings = profile_settings(model, ssid, material, self.opts, Some(&prev.live))?;
                self.service.update(&prev.path, settings).await?;
                info!("Updated connection {} for {}", prev.uuid, ssid.value);
                Ok(prev.uuid.clone())
            }
            None => {
                let settings = profile_settings(model, ssid, material, self.opts, None)?;
                let uuid = payload_uuid(&settings).ok_or_else(|| {
                    ConfigureError::InvalidSettings(format!(
                        "payload for {} has no uuid",
                        ssid.value
                    ))
                })?;
                let path = self.service.add_connection(settings).await?;
                info!("Created connection {uuid} at {} for {}", path.as_str(), ssid.value);
                Ok(uuid)
            }
        }
    }
}
