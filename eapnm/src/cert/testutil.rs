//! Certificate fixtures generated at test time.

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509, X509Builder, X509Name, X509NameBuilder, X509Ref};

pub(crate) fn key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(cn: &str) -> X509Name {
    let mut b = X509NameBuilder::new().unwrap();
    b.append_entry_by_text("CN", cn).unwrap();
    b.build()
}

fn build(
    subject: &str,
    pubkey: &PKey<Private>,
    issuer: Option<(&X509Ref, &PKey<Private>)>,
    ca: bool,
    days: u32,
) -> X509 {
    let mut b = X509Builder::new().unwrap();
    b.set_version(2).unwrap();
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    b.set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    b.set_subject_name(&name(subject)).unwrap();
    match issuer {
        Some((cert, _)) => b.set_issuer_name(cert.subject_name()).unwrap(),
        None => b.set_issuer_name(&name(subject)).unwrap(),
    }
    b.set_pubkey(pubkey).unwrap();
    b.set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    b.set_not_after(&Asn1Time::days_from_now(days).unwrap())
        .unwrap();
    if ca {
        b.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
    }
    let signer = issuer.map(|(_, k)| k).unwrap_or(pubkey);
    b.sign(signer, MessageDigest::sha256()).unwrap();
    b.build()
}

/// Self-signed CA certificate.
pub(crate) fn ca_cert(cn: &str) -> (X509, PKey<Private>) {
    let key = key();
    (build(cn, &key, None, true, 365), key)
}

/// Intermediate CA signed by `issuer`.
pub(crate) fn issued_cert(cn: &str, issuer: &X509, issuer_key: &PKey<Private>) -> X509 {
    build(cn, &key(), Some((issuer, issuer_key)), true, 365)
}

/// End-entity certificate, self-signed when `issuer` is `None`.
pub(crate) fn leaf_cert(
    cn: &str,
    issuer: Option<(&X509, &PKey<Private>)>,
) -> (X509, PKey<Private>) {
    let key = key();
    let cert = build(cn, &key, issuer.map(|(c, k)| (c.as_ref(), k)), false, 30);
    (cert, key)
}

/// PKCS#12 container holding a fresh client certificate.
pub(crate) fn client_pkcs12(passphrase: &str) -> (Vec<u8>, X509) {
    let (ca, ca_key) = ca_cert("Client Issuing CA");
    let (cert, key) = leaf_cert("alice@example.edu", Some((&ca, &ca_key)));
    let p12 = Pkcs12::builder()
        .name("client")
        .pkey(&key)
        .cert(&cert)
        .build2(passphrase)
        .unwrap();
    (p12.to_der().unwrap(), cert)
}
