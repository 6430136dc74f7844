//! Public object identifiers and deletion tokens.
//!
//! An identifier is `<16 lowercase hex>.<1-5 lowercase letters>`. Anything
//! else is rejected before it gets anywhere near the filesystem, which also
//! keeps `.tmp-*` staging files unreachable from the outside.

use rand::random;
use std::{fmt, path::Path};

/// Hex digits in the content-hash part of an identifier.
pub const HASH_HEX_LEN: usize = 16;
/// Hex digits in a rendered deletion token.
pub const TOKEN_HEX_LEN: usize = 32;
pub const MAX_EXTENSION_LEN: usize = 5;
pub const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validate an untrusted candidate (typically a URL path segment).
    pub fn parse(candidate: &str) -> Option<Self> {
        let (hash, ext) = candidate.split_once('.')?;
        if hash.len() != HASH_HEX_LEN || !hash.bytes().all(is_lower_hex) {
            return None;
        }
        if !is_extension(ext) {
            return None;
        }
        Some(Self(candidate.to_string()))
    }

    /// Build the identifier for content hashing to `hash`, uploaded as `original_filename`.
    pub fn from_content_hash(hash: u64, original_filename: &str) -> Self {
        Self(format!(
            "{:016x}.{}",
            hash,
            normalize_extension(original_filename)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> &str {
        self.0.split_once('.').map(|(_, ext)| ext).unwrap_or_default()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extension used for a stored object, lowercased.
/// Falls back to `jpg` when the filename has none or one we would not accept back.
pub fn normalize_extension(original_filename: &str) -> String {
    Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| is_extension(ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn is_extension(ext: &str) -> bool {
    (1..=MAX_EXTENSION_LEN).contains(&ext.len()) && ext.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

/// Secret required to delete an object. Never derived from content.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DeletionToken([u8; 16]);

impl DeletionToken {
    pub fn generate() -> Self {
        Self(random())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Accepts exactly 32 lowercase hex digits.
    pub fn parse_hex(candidate: &str) -> Option<Self> {
        if candidate.len() != TOKEN_HEX_LEN || !candidate.bytes().all(is_lower_hex) {
            return None;
        }
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(candidate, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

// Keep tokens out of logs.
impl fmt::Debug for DeletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeletionToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_identifiers() {
        for name in ["3677e35be4b1ad2d.png", "0000000000000000.j", "ffffffffffffffff.webpx"] {
            assert!(Identifier::parse(name).is_some(), "{name}");
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for name in [
            "",
            "3677e35be4b1ad2d",
            "3677e35be4b1ad2d.",
            "3677e35be4b1ad2.png",
            "3677e35be4b1ad2d0.png",
            "3677E35BE4B1AD2D.png",
            "3677e35be4b1ad2d.PNG",
            "3677e35be4b1ad2d.jpeg2",
            "3677e35be4b1ad2d.toolong",
            "3677e35be4b1ad2d.png.png",
            "../../etc/passwd",
            "..%2f3677e35be4b1ad2d.png",
            ".tmp-0123456789abcdef0123456789abcdef",
        ] {
            assert!(Identifier::parse(name).is_none(), "{name}");
        }
    }

    #[test]
    fn identifier_from_hash_uses_filename_extension() {
        let id = Identifier::from_content_hash(0x3677e35be4b1ad2d, "joconde.png");
        assert_eq!(id.as_str(), "3677e35be4b1ad2d.png");
        assert_eq!(id.extension(), "png");
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(normalize_extension("noext"), "jpg");
        assert_eq!(normalize_extension(""), "jpg");
        assert_eq!(normalize_extension("weird.p_g"), "jpg");
        assert_eq!(normalize_extension("archive.verylong"), "jpg");
        assert_eq!(normalize_extension("SHOUT.GIF"), "gif");
        let id = Identifier::from_content_hash(1, "blob");
        assert_eq!(id.as_str(), "0000000000000001.jpg");
    }

    #[test]
    fn token_hex_round_trips_and_rejects_bad_shapes() {
        let token = DeletionToken::generate();
        let hex = token.to_hex();
        assert_eq!(hex.len(), TOKEN_HEX_LEN);
        assert_eq!(DeletionToken::parse_hex(&hex), Some(token));

        assert!(DeletionToken::parse_hex("bad").is_none());
        assert!(DeletionToken::parse_hex(&hex.to_uppercase()).is_none());
        assert!(DeletionToken::parse_hex(&format!("{hex}00")).is_none());
    }
}
