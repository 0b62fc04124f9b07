//! CA certificate decoding and trust chain grouping.
//!
//! Certificates are grouped into chains keyed by issuer. Only self-signed
//! CA certificates start a chain; intermediates join the chain of the root
//! that issued them and are dropped otherwise.

use std::collections::{BTreeMap, HashMap};
use std::os::unix::fs::symlink;
use std::path::Path;

use const_oid::db::rfc5280::ID_CE_BASIC_CONSTRAINTS;
use der::{Decode, Encode};
use log::debug;
use openssl::x509::X509;
use x509_cert::Certificate;
use x509_cert::ext::pkix::BasicConstraints;

use crate::api::models::ConfigureError;
use crate::util::files::write_private_file;
use crate::Result;

/// A decoded CA certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaCertificate {
    der: Vec<u8>,
    issuer: String,
    root: bool,
}

impl CaCertificate {
    /// Decodes a DER certificate and classifies it.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let cert = Certificate::from_der(der)
            .map_err(|e| ConfigureError::InvalidSettings(format!("invalid CA certificate: {e}")))?;
        let tbs = &cert.tbs_certificate;
        let issuer_der = tbs.issuer.to_der().ok();
        let self_signed = issuer_der.is_some() && issuer_der == tbs.subject.to_der().ok();

        Ok(Self {
            der: der.to_vec(),
            issuer: tbs.issuer.to_string(),
            root: self_signed && is_ca(&cert),
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// RFC 4514 rendering of the issuer name.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Self-signed and flagged as a CA.
    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn to_pem(&self) -> Result<Vec<u8>> {
        Ok(X509::from_der(&self.der)?.to_pem()?)
    }

    fn subject_hash(&self) -> Result<u32> {
        Ok(X509::from_der(&self.der)?.subject_name_hash())
    }
}

fn is_ca(cert: &Certificate) -> bool {
    let Some(extensions) = &cert.tbs_certificate.extensions else {
        return false;
    };
    extensions
        .iter()
        .filter(|ext| ext.extn_id == ID_CE_BASIC_CONSTRAINTS)
        .filter_map(|ext| BasicConstraints::from_der(ext.extn_value.as_bytes()).ok())
        .any(|bc| bc.ca)
}

/// One root issuer with the intermediates it signed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    pub roots: Vec<CaCertificate>,
    pub intermediates: Vec<CaCertificate>,
}

/// Trust chains keyed by issuer.
///
/// Keys are kept sorted so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertChain {
    chains: BTreeMap<String, Chain>,
}

impl CertChain {
    /// Builds chains from DER certificates.
    ///
    /// Entries that fail to decode are skipped. Fails with
    /// [`ConfigureError::NoRootFound`] if no root is present.
    pub fn new<I, B>(ders: I) -> Result<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let certs: Vec<CaCertificate> = ders
            .into_iter()
            .filter_map(|der| match CaCertificate::from_der(der.as_ref()) {
                Ok(cert) => Some(cert),
                Err(e) => {
                    debug!("Skipping CA entry: {e}");
                    None
                }
            })
            .collect();

        let mut chains: BTreeMap<String, Chain> = BTreeMap::new();
        for cert in certs.iter().filter(|c| c.is_root()) {
            chains
                .entry(cert.issuer.clone())
                .or_default()
                .roots
                .push(cert.clone());
        }
        if chains.is_empty() {
            return Err(ConfigureError::NoRootFound);
        }

        for cert in certs.into_iter().filter(|c| !c.is_root()) {
            match chains.get_mut(&cert.issuer) {
                Some(chain) => chain.intermediates.push(cert),
                None => debug!("Dropping intermediate without root: {}", cert.issuer),
            }
        }

        Ok(Self { chains })
    }

    /// Chains in issuer order.
    pub fn chains(&self) -> impl Iterator<Item = (&str, &Chain)> {
        self.chains.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// All certificates, intermediates before roots within each chain.
    pub fn certificates(&self) -> impl Iterator<Item = &CaCertificate> {
        self.chains
            .values()
            .flat_map(|c| c.intermediates.iter().chain(c.roots.iter()))
    }

    /// Concatenated PEM bundle.
    pub fn to_pem(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for cert in self.certificates() {
            out.extend(cert.to_pem()?);
        }
        Ok(out)
    }

    /// Writes one PEM file per certificate into `dir` plus OpenSSL style
    /// `<subject hash>.<n>` symlinks pointing at them.
    ///
    /// `dir` is expected to exist and be empty.
    pub fn write_hashed_dir(&self, dir: &Path) -> Result<()> {
        let mut seen: HashMap<u32, usize> = HashMap::new();
        for (i, cert) in self.certificates().enumerate() {
            let name = format!("ca-{i}.pem");
            write_private_file(&dir.join(&name), &cert.to_pem()?)?;

            let hash = cert.subject_hash()?;
            let n = seen.entry(hash).or_insert(0);
            symlink(&name, dir.join(format!("{hash:08x}.{n}")))?;
            *n += 1;
        }
        Ok(())
    }
}
