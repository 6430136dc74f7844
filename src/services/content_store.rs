//! ContentStore — content-addressed image storage in a flat directory.
//!
//! Objects live at `base_path/{identifier}`. Uploads are staged in
//! `base_path/.tmp-{token}` while the digest is computed, then renamed into
//! place and tagged with their deletion token (and expiry, if any) through
//! extended attributes. A file without a token is never served or deleted
//! through the public API.

use crate::{
    config::clamp_lifetime,
    models::{
        identifier::{DeletionToken, Identifier},
        stored_object::StoredObject,
    },
    services::metadata,
};
use bytes::Bytes;
use chrono::{TimeDelta, Utc};
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, info};
use xxhash_rust::xxh64::Xxh64;

/// Prefix of staging files. Never matches the identifier shape.
pub const TEMP_PREFIX: &str = ".tmp-";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid identifier")]
    InvalidIdentifier,
    /// Missing object and wrong token are deliberately the same error.
    #[error("no such file or invalid token")]
    NotFound,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// ContentStore provides the image host's storage operations:
/// - Stage and commit an upload (temp file, digest, rename, tag)
/// - Check that an identifier maps to a committed object
/// - Delete an object after verifying its deletion token
///
/// Cloning is cheap; all clones share the same directory.
#[derive(Clone, Debug)]
pub struct ContentStore {
    /// Directory holding objects and staging files.
    base_path: PathBuf,

    /// Upper bound applied to every lifetime (0 = unlimited).
    max_lifetime_days: u32,
}

/// An upload being written to its staging file.
///
/// Dropping it before [`ContentStore::commit`] (client abort, multipart
/// error, cancelled request) removes the staging file.
pub struct PendingUpload {
    file: Option<File>,
    temp_path: PathBuf,
    token: DeletionToken,
    digest: Xxh64,
    size_bytes: u64,
}

impl PendingUpload {
    /// Append a chunk to the staging file and feed it to the digest.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> StoreResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("upload already committed"))?;
        file.write_all(chunk).await?;
        self.digest.update(chunk);
        self.size_bytes += chunk.len() as u64;
        Ok(())
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        // After a successful commit the file has been renamed away already.
        // A single unlink; blocking the worker for it is fine.
        let _ = std::fs::remove_file(&self.temp_path);
    }
}

impl ContentStore {
    /// Create a store rooted at `base_path`. The directory must exist.
    pub fn new(base_path: impl Into<PathBuf>, max_lifetime_days: u32) -> Self {
        Self {
            base_path: base_path.into(),
            max_lifetime_days,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// On-disk location of an object. Only validated identifiers get here.
    pub fn object_path(&self, identifier: &Identifier) -> PathBuf {
        self.base_path.join(identifier.as_str())
    }

    /// Open a fresh staging file named after a newly drawn deletion token.
    pub async fn begin_upload(&self) -> StoreResult<PendingUpload> {
        let token = DeletionToken::generate();
        let temp_path = self
            .base_path
            .join(format!("{}{}", TEMP_PREFIX, token.to_hex()));
        let file = File::create_new(&temp_path).await?;

        Ok(PendingUpload {
            file: Some(file),
            temp_path,
            token,
            digest: Xxh64::new(0),
            size_bytes: 0,
        })
    }

    /// Turn a staged upload into a stored object.
    ///
    /// - Syncs the staging file and derives the identifier from its digest.
    /// - Renames it into place; identical content simply replaces the old file.
    /// - Tags the deletion token, then the expiry (or clears it).
    ///
    /// If tagging fails the renamed file is removed again, so no identifier
    /// ever resolves to an untagged object for longer than this call.
    pub async fn commit(
        &self,
        mut upload: PendingUpload,
        original_filename: &str,
        lifetime_days: u32,
    ) -> StoreResult<StoredObject> {
        let mut file = upload
            .file
            .take()
            .ok_or_else(|| io::Error::other("upload already committed"))?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let identifier = Identifier::from_content_hash(upload.digest.digest(), original_filename);
        let path = self.object_path(&identifier);
        fs::rename(&upload.temp_path, &path).await?;

        let lifetime_days = clamp_lifetime(lifetime_days, self.max_lifetime_days);
        let created_at = Utc::now();
        // Lifetimes past chrono's range are as good as infinite.
        let expires_at = (lifetime_days > 0)
            .then(|| created_at.checked_add_signed(TimeDelta::days(i64::from(lifetime_days))))
            .flatten();

        let token = upload.token;
        let tag_path = path.clone();
        let tagged = blocking(move || {
            metadata::write_token(&tag_path, &token)?;
            match expires_at {
                Some(at) => metadata::write_expiry(&tag_path, at),
                None => metadata::clear_expiry(&tag_path),
            }
        })
        .await;

        if let Err(err) = tagged {
            let _ = fs::remove_file(&path).await;
            return Err(StoreError::Io(err));
        }

        info!(
            path = %path.display(),
            lifetime_days,
            size_bytes = upload.size_bytes,
            expires_at = ?expires_at,
            "stored object"
        );

        Ok(StoredObject {
            identifier,
            deletion_token: token,
            expires_at,
            lifetime_days,
            created_at,
            size_bytes: upload.size_bytes,
        })
    }

    /// Stream-upload an object in one go: stage, drain `stream`, commit.
    pub async fn put<S>(
        &self,
        stream: S,
        original_filename: &str,
        lifetime_days: u32,
    ) -> StoreResult<StoredObject>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let mut upload = self.begin_upload().await?;
        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            upload.write_chunk(&chunk?).await?;
        }
        self.commit(upload, original_filename, lifetime_days).await
    }

    /// True when `identifier` names a fully committed (token-tagged) object.
    pub async fn is_committed(&self, identifier: &Identifier) -> StoreResult<bool> {
        let path = self.object_path(identifier);
        match blocking(move || metadata::read_token(&path)).await {
            Ok(token) => Ok(token.is_some()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    /// Delete an object if `presented_token` matches the one it was stored with.
    ///
    /// Missing object, missing token attribute and token mismatch all yield
    /// `NotFound`; nothing is removed in those cases.
    pub async fn delete(&self, identifier: &Identifier, presented_token: &str) -> StoreResult<()> {
        let presented = DeletionToken::parse_hex(presented_token).ok_or(StoreError::NotFound)?;
        let path = self.object_path(identifier);

        let read_path = path.clone();
        match blocking(move || metadata::read_token(&read_path)).await {
            Ok(Some(stored)) if stored == presented => {}
            Ok(_) => return Err(StoreError::NotFound),
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(err) => return Err(StoreError::Io(err)),
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "deleted object");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "object vanished before removal");
                Err(StoreError::NotFound)
            }
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

/// Run blocking filesystem work (xattr syscalls) off the async workers.
pub(crate) async fn blocking<F, T>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}
