//! Client certificate extraction from PKCS#12 containers.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use der::Decode;
use log::debug;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rand::rand_bytes;
use openssl::symm::Cipher;
use openssl::x509::X509;

use crate::api::models::ConfigureError;
use crate::Result;

const KEY_PASSWORD_BYTES: usize = 32;

/// Leaf certificate and private key opened from a container.
pub struct ClientCert {
    cert: X509,
    key: PKey<Private>,
    not_after: DateTime<Utc>,
}

impl fmt::Debug for ClientCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCert")
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

impl ClientCert {
    /// Opens a DER-encoded PKCS#12 container.
    ///
    /// Returns `Ok(None)` when there is nothing to open yet: an empty
    /// container, or a container without a passphrase. A single attempt is
    /// made; asking again is up to the caller.
    pub fn decode(container: &[u8], passphrase: &str) -> Result<Option<Self>> {
        if container.is_empty() || passphrase.is_empty() {
            debug!("Client certificate not yet available");
            return Ok(None);
        }

        let parsed = Pkcs12::from_der(container)
            .and_then(|p12| p12.parse2(passphrase))
            .map_err(|e| ConfigureError::CertificateDecrypt(e.to_string()))?;

        let cert = parsed.cert.ok_or_else(|| {
            ConfigureError::CertificateDecrypt("container holds no certificate".into())
        })?;
        let key = parsed.pkey.ok_or_else(|| {
            ConfigureError::CertificateDecrypt("container holds no private key".into())
        })?;

        let not_after = not_after(&cert)?;
        Ok(Some(Self {
            cert,
            key,
            not_after,
        }))
    }

    /// Expiry of the leaf certificate.
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn certificate(&self) -> &X509 {
        &self.cert
    }

    pub fn certificate_pem(&self) -> Result<Vec<u8>> {
        Ok(self.cert.to_pem()?)
    }

    /// PKCS#8 `ENCRYPTED PRIVATE KEY` PEM and the random password it is
    /// encrypted with.
    ///
    /// The password goes into the profile, never to the user.
    pub fn encrypted_key_pem(&self) -> Result<(Vec<u8>, String)> {
        let mut raw = [0u8; KEY_PASSWORD_BYTES];
        rand_bytes(&mut raw)?;
        let password = STANDARD.encode(raw);
        let pem = self
            .key
            .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), password.as_bytes())?;
        Ok((pem, password))
    }
}

fn not_after(cert: &X509) -> Result<DateTime<Utc>> {
    let parsed = x509_cert::Certificate::from_der(&cert.to_der()?)
        .map_err(|e| ConfigureError::CertificateDecrypt(e.to_string()))?;
    let secs = parsed
        .tbs_certificate
        .validity
        .not_after
        .to_unix_duration()
        .as_secs();
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .ok_or_else(|| ConfigureError::CertificateDecrypt("certificate expiry out of range".into()))
}
