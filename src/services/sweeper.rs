//! Background purge of expired objects.

use crate::services::{
    content_store::{ContentStore, blocking},
    metadata,
};
use chrono::{DateTime, Utc};
use std::{fs, io, path::Path, time::Duration};
use tokio::{task::JoinHandle, time::interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Outcome of one pass over the storage directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
}

#[derive(Clone)]
pub struct Sweeper {
    store: ContentStore,
    every: Duration,
}

impl Sweeper {
    pub fn new(store: ContentStore, every: Duration) -> Self {
        Self { store, every }
    }

    /// Start the sweep loop. The first pass runs immediately.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.every);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.sweep_at(Utc::now()).await {
                        Ok(report) => info!(
                            scanned = report.scanned,
                            removed = report.removed,
                            "expiration sweep completed"
                        ),
                        Err(e) => error!(error = %e, "expiration sweep failed"),
                    }
                }
            }
        }
    }

    /// Remove every object whose expiry is strictly before `now`.
    ///
    /// Entries without an expiry, or whose metadata cannot be read (staging
    /// files, objects mid-commit, files deleted under our feet), are skipped.
    /// Only failing to list the directory itself is an error.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> io::Result<SweepReport> {
        let root = self.store.base_path().to_path_buf();
        blocking(move || sweep_dir(&root, now)).await
    }
}

fn sweep_dir(root: &Path, now: DateTime<Utc>) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();

    for entry in fs::read_dir(root)? {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        report.scanned += 1;

        let path = entry.path();
        let expires_at = match metadata::read_expiry(&path) {
            Ok(Some(at)) => at,
            Ok(None) => continue,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if expires_at >= now {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                report.removed += 1;
                info!(
                    path = %path.display(),
                    expired_at = %expires_at,
                    overdue = %(now - expires_at),
                    "removed expired object"
                );
            }
            Err(e) => debug!(path = %path.display(), error = %e, "expired object already gone"),
        }
    }

    Ok(report)
}
