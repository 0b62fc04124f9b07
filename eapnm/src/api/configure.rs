//! Configure-call orchestration.
//!
//! Ties the pipeline together: parse the document, resolve it into a
//! [`NetworkModel`], complete missing credentials through the prompt
//! collaborators, write the certificate material, reconcile the saved
//! profiles and persist the resulting record.

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::api::models::{
    ClientMaterial, ConfigureError, ConfigureOutcome, NetworkModel, ProfileOptions, ProviderInfo,
};
use crate::api::state::{ConnectionRecord, StateStore};
use crate::cert::ClientCert;
use crate::core::profile::write_material;
use crate::core::reconcile::Reconciler;
use crate::dbus::SettingsService;
use crate::eap::{ParseOptions, parse_with, resolve};
use crate::util::files::MaterialStore;
use crate::Result;

/// Asks the user for a username and password.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Returns `(username, password)`.
    ///
    /// `prefix` and `suffix` are the constraints the username must meet;
    /// either may be empty.
    async fn credentials(
        &self,
        prefix: &str,
        suffix: &str,
        provider: &ProviderInfo,
    ) -> Result<(String, String)>;
}

/// Asks the user for a client certificate container and its passphrase.
#[async_trait]
pub trait CertificatePrompt: Send + Sync {
    /// Returns `(container, passphrase)`.
    ///
    /// `container` and `passphrase` are what the document shipped, either
    /// of which may be empty. Returning them unchanged with a new
    /// passphrase is the common case.
    async fn certificate(
        &self,
        container: &[u8],
        passphrase: &str,
        provider: &ProviderInfo,
    ) -> Result<(Vec<u8>, String)>;
}

/// What [`Configurator::status`] found.
#[derive(Debug, Clone, Default)]
pub struct Status {
    pub record: ConnectionRecord,
    /// Recorded UUIDs that NetworkManager still knows about.
    pub live: Vec<String>,
}

/// Installs EAP-config documents as NetworkManager profiles.
///
/// # Example
///
/// ```no_run
/// use eapnm::{Configurator, MaterialStore, NmSettings, StateFile};
///
/// # async fn example() -> eapnm::Result<()> {
/// let service = NmSettings::system().await?;
/// let store = MaterialStore::default_location("eapnm");
/// let state = StateFile::in_store(&store);
///
/// let document = std::fs::read("eduroam.eap-config")?;
/// let outcome = Configurator::new(&service, &state, store)
///     .configure(&document)
///     .await?;
/// println!("installed {} profiles", outcome.uuids.len());
/// # Ok(())
/// # }
/// ```
///
/// Calls that share a [`StateStore`] must not run concurrently.
pub struct Configurator<'a> {
    service: &'a dyn SettingsService,
    state: &'a dyn StateStore,
    store: MaterialStore,
    profile: ProfileOptions,
    parse: ParseOptions,
    credentials: Option<&'a dyn CredentialPrompt>,
    certificates: Option<&'a dyn CertificatePrompt>,
}

impl<'a> Configurator<'a> {
    pub fn new(
        service: &'a dyn SettingsService,
        state: &'a dyn StateStore,
        store: MaterialStore,
    ) -> Self {
        Self {
            service,
            state,
            store,
            profile: ProfileOptions::default(),
            parse: ParseOptions::default(),
            credentials: None,
            certificates: None,
        }
    }

    pub fn profile_options(mut self, opts: ProfileOptions) -> Self {
        self.profile = opts;
        self
    }

    pub fn parse_options(mut self, opts: ParseOptions) -> Self {
        self.parse = opts;
        self
    }

    pub fn credential_prompt(mut self, prompt: &'a dyn CredentialPrompt) -> Self {
        self.credentials = Some(prompt);
        self
    }

    pub fn certificate_prompt(mut self, prompt: &'a dyn CertificatePrompt) -> Self {
        self.certificates = Some(prompt);
        self
    }

    /// Runs a full Configure-call for `document`.
    ///
    /// Nothing is persisted when the first SSID fails, and the material of
    /// earlier calls is left in place. When a later SSID fails, the
    /// installed part is persisted and the error is returned in
    /// [`ConfigureOutcome::warning`]. Earlier material is removed only
    /// after every SSID was installed.
    pub async fn configure(&self, document: &[u8]) -> Result<ConfigureOutcome> {
        let doc = parse_with(document, &self.parse)?;
        let model = resolve(doc)?;
        debug!(
            "Resolved {} network for {}",
            model.outer_method(),
            model.provider().display_name
        );

        let model = self.complete(model).await?;

        let previous = match self.state.load() {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring unreadable state record: {e}");
                ConnectionRecord::default()
            }
        };

        let material = write_material(&model, &self.store, self.profile.ca_trust)?;
        let reconciled = match Reconciler::new(self.service, &self.profile)
            .reconcile(&model, &material, &previous.uuids)
            .await
        {
            Ok(reconciled) => reconciled,
            Err(e) => {
                material.discard();
                return Err(e);
            }
        };

        let validity = match &model {
            NetworkModel::Certificate(net) => net.client_cert().map(ClientCert::not_after),
            NetworkModel::Password(_) => None,
        };
        let record = ConnectionRecord {
            uuids: reconciled.uuids,
            validity,
        };
        self.state.save(&record)?;

        match &reconciled.partial_failure {
            // Unreached profiles still point at earlier material.
            Some(e) => warn!("Configured {} profiles with errors: {e}", record.uuids.len()),
            None => {
                info!("Configured {} profiles", record.uuids.len());
                if let Err(e) = material.prune_others(&self.store) {
                    warn!("Failed to remove old certificate material: {e}");
                }
            }
        }

        Ok(ConfigureOutcome {
            uuids: record.uuids,
            validity: record.validity,
            warning: reconciled.partial_failure,
        })
    }

    /// Loads the record and checks which of its profiles are still present.
    pub async fn status(&self) -> Result<Status> {
        let record = self.state.load()?;
        let mut live = Vec::with_capacity(record.uuids.len());
        for uuid in &record.uuids {
            match self.service.find_by_uuid(uuid).await {
                Ok(_) => live.push(uuid.clone()),
                Err(e) => debug!("Recorded connection {uuid} is gone: {e}"),
            }
        }
        Ok(Status { record, live })
    }

    /// Fills in credentials and opens the client certificate.
    async fn complete(&self, model: NetworkModel) -> Result<NetworkModel> {
        match model {
            NetworkModel::Password(mut net) => {
                if net.credentials.is_complete() {
                    return Ok(NetworkModel::Password(net));
                }
                let prompt = self.credentials.ok_or_else(|| {
                    ConfigureError::Prompt("credentials required but no prompt available".into())
                })?;
                let (username, password) = prompt
                    .credentials(
                        &net.credentials.prefix,
                        &net.credentials.suffix,
                        &net.base.provider,
                    )
                    .await?;
                if !net.credentials.accepts_username(&username) {
                    return Err(ConfigureError::InvalidUsername {
                        prefix: net.credentials.prefix,
                        suffix: net.credentials.suffix,
                    });
                }
                net.credentials.username = username;
                net.credentials.password = password;
                Ok(NetworkModel::Password(net))
            }
            NetworkModel::Certificate(mut net) => {
                if let ClientMaterial::Container { data, passphrase } = &net.client {
                    let cert = self.open_certificate(data, passphrase, &net.base.provider).await?;
                    net.client = ClientMaterial::Decoded(cert);
                }
                Ok(NetworkModel::Certificate(net))
            }
        }
    }

    async fn open_certificate(
        &self,
        data: &[u8],
        passphrase: &str,
        provider: &ProviderInfo,
    ) -> Result<ClientCert> {
        if let Some(cert) = ClientCert::decode(data, passphrase)? {
            return Ok(cert);
        }
        let Some(prompt) = self.certificates else {
            return Err(ConfigureError::ClientCertificateRequired);
        };
        let (data, passphrase) = prompt.certificate(data, passphrase, provider).await?;
        ClientCert::decode(&data, &passphrase)?.ok_or(ConfigureError::ClientCertificateRequired)
    }
}
