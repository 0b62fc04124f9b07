//! Utility functions for path encoding, SSID decoding and expiry math.

use std::borrow::Cow;
use std::path::Path;
use std::str;

use chrono::{DateTime, Utc};
use log::warn;

/// Encodes a file path the way NetworkManager expects certificate
/// references: `file://<absolute path>` followed by a NUL byte.
pub(crate) fn encode_path(path: &Path) -> Vec<u8> {
    let mut out = b"file://".to_vec();
    out.extend_from_slice(path.as_os_str().as_encoded_bytes());
    out.push(0);
    out
}

/// Decode SSID bytes for comparison purposes, defaulting to empty string if invalid.
pub(crate) fn decode_ssid_or_empty(bytes: &[u8]) -> Cow<'static, str> {
    if bytes.is_empty() {
        return Cow::Borrowed("");
    }

    match str::from_utf8(bytes) {
        Ok(s) => Cow::Owned(s.to_owned()),
        Err(e) => {
            warn!("Invalid UTF-8 in SSID during comparison: {e}");
            Cow::Borrowed("")
        }
    }
}

/// Whole days until `until`, rounded up. Zero once expired.
pub fn validity_days(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (until - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + 86_399) / 86_400
}
