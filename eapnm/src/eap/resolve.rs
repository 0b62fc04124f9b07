//! Authentication method resolution.
//!
//! Walks the candidates of a parsed document in order and turns the first
//! workable one into a [`NetworkModel`].

use log::debug;

use super::document::{AuthenticationMethod, ConfigDocument};
use super::methods::{EapMethod, InnerAuth, inner_allowed};
use crate::api::models::{
    Base, CertificateNetwork, ClientMaterial, ConfigureError, Credentials, NetworkModel,
    PasswordNetwork, ProviderInfo, Ssid,
};
use crate::cert::CertChain;
use crate::Result;

/// Resolves a parsed document into its network model.
///
/// Candidates that fail are skipped. If all fail, the error of the last
/// one is returned wrapped in [`ConfigureError::NoViableNetwork`].
pub fn resolve(doc: ConfigDocument) -> Result<NetworkModel> {
    let ConfigDocument {
        provider,
        methods,
        ssids,
    } = doc;

    let mut last = ConfigureError::NoAuthenticationMethods;
    for (i, method) in methods.iter().enumerate() {
        match candidate(method, &provider, &ssids) {
            Ok(model) => {
                debug!("Using authentication method #{i} ({})", model.outer_method());
                return Ok(model);
            }
            Err(e) => {
                debug!("Skipping authentication method #{i}: {e}");
                last = e;
            }
        }
    }
    Err(ConfigureError::NoViableNetwork(Box::new(last)))
}

fn candidate(
    method: &AuthenticationMethod,
    provider: &ProviderInfo,
    ssids: &[Ssid],
) -> Result<NetworkModel> {
    let code = method.eap_method.map(|m| m.code).unwrap_or_default();
    let outer = EapMethod::from_code(code).ok_or(ConfigureError::UnsupportedMethod(code))?;

    let server = method
        .server
        .as_ref()
        .ok_or(ConfigureError::MissingServerCredentials)?;
    let cert_chain = CertChain::new(server.ca.iter().filter_map(|ca| ca.decode()))?;

    let client = &method.client;
    let base = Base {
        cert_chain,
        provider: provider.clone(),
        ssids: ssids.to_vec(),
        server_ids: server.server_ids.clone(),
        anon_identity: client.outer_identity.clone(),
    };

    if outer == EapMethod::Tls {
        let data = client
            .client_certificate
            .as_ref()
            .and_then(|c| c.decode_container())
            .unwrap_or_default();
        return Ok(NetworkModel::Certificate(CertificateNetwork {
            base,
            client: ClientMaterial::Container {
                data,
                passphrase: client.passphrase.clone(),
            },
        }));
    }

    let inner = preferred_inner(outer, method)?;

    let (prefix, suffix) = if client.inner_identity_hint {
        (
            client.inner_identity_prefix.clone(),
            at_suffix(&client.inner_identity_suffix),
        )
    } else {
        (String::new(), String::new())
    };

    Ok(NetworkModel::Password(PasswordNetwork {
        base,
        credentials: Credentials {
            username: client.username.clone(),
            prefix,
            suffix,
            password: client.password.clone(),
        },
        outer,
        inner,
    }))
}

/// First inner method that fits `outer`, in document order.
fn preferred_inner(outer: EapMethod, method: &AuthenticationMethod) -> Result<InnerAuth> {
    for inner in &method.inner {
        let declared = [(inner.eap, true), (inner.non_eap, false)];
        for (ty, eap_typed) in declared {
            let Some(ty) = ty else { continue };
            if !inner_allowed(outer, ty.code, eap_typed) {
                continue;
            }
            if let Some(auth) = InnerAuth::from_code(ty.code) {
                return Ok(auth);
            }
        }
    }
    Err(ConfigureError::NoViableInnerAuth)
}

fn at_suffix(suffix: &str) -> String {
    match suffix {
        "" => String::new(),
        s if s.starts_with('@') => s.to_string(),
        s => format!("@{s}"),
    }
}
