//! Result of committing an upload to the content store.

use super::identifier::{DeletionToken, Identifier};
use chrono::{DateTime, Utc};

/// A freshly stored object as seen by the uploader.
///
/// This is the only place the deletion token is ever handed out; afterwards
/// it lives solely in the object's extended attributes.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub identifier: Identifier,
    pub deletion_token: DeletionToken,
    /// `None` means the object never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Lifetime actually applied after clamping (0 = infinite).
    pub lifetime_days: u32,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}
