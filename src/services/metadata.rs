//! Out-of-band object metadata kept in extended attributes.
//!
//! Attributes travel with the inode, so removing or replacing the file drops
//! them too. All functions here block and are meant for `spawn_blocking`.

use crate::models::identifier::DeletionToken;
use chrono::{DateTime, Utc};
use std::{
    io::{self, ErrorKind},
    path::Path,
};

pub const TOKEN_ATTR: &str = "user.imgdrop.token";
pub const EXPIRES_ATTR: &str = "user.imgdrop.expires";

const EXPIRES_LEN: usize = 12;

pub fn write_token(path: &Path, token: &DeletionToken) -> io::Result<()> {
    xattr::set(path, TOKEN_ATTR, token.as_bytes())
}

/// `Ok(None)` when the file exists but carries no (well-formed) token.
pub fn read_token(path: &Path) -> io::Result<Option<DeletionToken>> {
    let raw = xattr::get(path, TOKEN_ATTR)?;
    Ok(raw
        .and_then(|bytes| <[u8; 16]>::try_from(bytes.as_slice()).ok())
        .map(DeletionToken::from_bytes))
}

pub fn write_expiry(path: &Path, expires_at: DateTime<Utc>) -> io::Result<()> {
    xattr::set(path, EXPIRES_ATTR, &encode_expiry(expires_at))
}

pub fn read_expiry(path: &Path) -> io::Result<Option<DateTime<Utc>>> {
    match xattr::get(path, EXPIRES_ATTR)? {
        Some(raw) => decode_expiry(&raw)
            .map(Some)
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "malformed expiry attribute")),
        None => Ok(None),
    }
}

/// Remove the expiry attribute if the file carries one.
pub fn clear_expiry(path: &Path) -> io::Result<()> {
    if xattr::get(path, EXPIRES_ATTR)?.is_some() {
        xattr::remove(path, EXPIRES_ATTR)?;
    }
    Ok(())
}

/// Big-endian Unix seconds followed by big-endian nanoseconds.
pub fn encode_expiry(at: DateTime<Utc>) -> [u8; EXPIRES_LEN] {
    let mut buf = [0u8; EXPIRES_LEN];
    buf[..8].copy_from_slice(&at.timestamp().to_be_bytes());
    buf[8..].copy_from_slice(&at.timestamp_subsec_nanos().to_be_bytes());
    buf
}

pub fn decode_expiry(raw: &[u8]) -> Option<DateTime<Utc>> {
    if raw.len() != EXPIRES_LEN {
        return None;
    }
    let secs = i64::from_be_bytes(raw[..8].try_into().ok()?);
    let nanos = u32::from_be_bytes(raw[8..].try_into().ok()?);
    DateTime::from_timestamp(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn expiry_encoding_keeps_nanoseconds() {
        let at = Utc.with_ymd_and_hms(2031, 4, 2, 13, 37, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let raw = encode_expiry(at);
        assert_eq!(decode_expiry(&raw), Some(at));
    }

    #[test]
    fn malformed_expiry_is_rejected() {
        assert_eq!(decode_expiry(&[]), None);
        assert_eq!(decode_expiry(&[0u8; 11]), None);
        let mut raw = [0u8; 12];
        raw[8..].copy_from_slice(&2_000_000_000u32.to_be_bytes());
        assert_eq!(decode_expiry(&raw), None);
    }
}
