//! Watching a tag image for presented tags.
//!
//! A tag counts as presented when its image file appears or its content
//! changes. Removing the file takes the tag away, so putting the same
//! content back presents it again.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, trace, warn};

use crate::error::Result;

/// A tag presentation seen by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPresentation {
    /// Path of the tag image.
    pub path: PathBuf,
    /// BLAKE3 hash of the image content.
    pub content_hash: String,
    /// When the presentation was detected.
    pub timestamp: DateTime<Utc>,
}

/// Polls a tag image file for presentations.
#[derive(Debug)]
pub struct TagWatcher {
    path: PathBuf,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    last_hash: Option<String>,
}

impl TagWatcher {
    /// Create a watcher for the tag image at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            last_hash: None,
        }
    }

    /// The watched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the watcher is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Check the tag image once.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn check_for_changes(&mut self) -> Result<Option<TagPresentation>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.last_hash.take().is_some() {
                    debug!(path = %self.path.display(), "Tag removed");
                }
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let hash = blake3::hash(&content).to_hex().to_string();
        if self.last_hash.as_ref() == Some(&hash) {
            trace!("Tag image unchanged");
            return Ok(None);
        }

        debug!(hash = %hash, len = content.len(), "Tag presented");
        self.last_hash = Some(hash.clone());
        Ok(Some(TagPresentation {
            path: self.path.clone(),
            content_hash: hash,
            timestamp: Utc::now(),
        }))
    }

    /// Poll the tag image and send presentations through the channel.
    ///
    /// Runs until the watcher is stopped or the receiver is dropped. Calling
    /// it on a running watcher returns immediately.
    pub async fn start(&mut self, tx: mpsc::Sender<TagPresentation>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Tag watcher already running");
            return;
        }

        debug!(
            path = %self.path.display(),
            interval_ms = self.poll_interval.as_millis(),
            "Starting tag watcher"
        );

        let mut ticker = interval(self.poll_interval);
        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;

            match self.check_for_changes() {
                Ok(Some(presentation)) => {
                    if tx.send(presentation).await.is_err() {
                        debug!("Presentation channel closed, stopping watcher");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Error checking tag image"),
            }
        }

        self.running.store(false, Ordering::SeqCst);
        debug!("Tag watcher stopped");
    }

    /// Stop the watcher.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Get a handle that can stop the watcher from another task.
    #[must_use]
    pub fn handle(&self) -> WatchHandle {
        WatchHandle {
            running: Arc::clone(&self.running),
        }
    }
}

/// Stops a running [`TagWatcher`]. Clones share the same watcher.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    running: Arc<AtomicBool>,
}

impl WatchHandle {
    /// Stop the associated watcher.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the watcher is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
