//! Sync Engine - Local/Remote Last-Write-Wins Reconciliation
//!
//! Keeps the local citation tree reconciled with one remote copy per
//! signed-in user by comparing `lastModified` timestamps and replacing
//! whichever whole copy is older.
//!
//! # Reconciliation Decision Table
//!
//! Evaluated in order; first match wins:
//!
//! | Condition                                             | Action        |
//! |-------------------------------------------------------|---------------|
//! | No cloud record, or cloud record has no `lastModified`| Upload local  |
//! | Local has zero nodes and cloud has nodes              | Download      |
//! | Local has no `lastModified` and cloud has nodes       | Download      |
//! | Local timestamp strictly newer                        | Upload local  |
//! | Cloud timestamp strictly newer                        | Download      |
//! | Timestamps equal                                      | No-op         |
//! | Anything else                                         | Keep local    |
//!
//! Whichever branch runs, a local `lastModified` is written. That closes the
//! upload loop this design must avoid: an upload that does not leave a local
//! timestamp behind makes the next cycle see "no local timestamp" again and
//! re-upload forever.
//!
//! # Concurrency
//!
//! At most one reconciliation runs at a time. A `perform_sync` call arriving
//! while one is in flight is deduplicated - not queued, not merged - and
//! sees no effect from its own call. Writes performed by the engine are
//! tagged [`WriteOrigin::Sync`] so listeners do not mistake them for fresh
//! local edits.
//!
//! The guard is held by an RAII value inside the reconciling call, so it is
//! released on every exit path: success, error, and cancellation (the
//! auto-sync task being stopped while suspended in a remote call included).

use crate::auth::{AuthProvider, UserInfo};
use crate::services::error::SyncError;
use crate::services::sanitize::sanitize_document;
use crate::storage::{LocalStore, RemoteDocument, RemoteStore, WriteOrigin};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Broadcast channel capacity for sync status updates.
///
/// Status listeners only drive indicator UI; lagging ones can safely miss
/// intermediate states.
const SYNC_STATUS_CHANNEL_CAPACITY: usize = 16;

/// Status reported to listeners around each reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// A reconciliation started
    Syncing,
    /// The reconciliation finished successfully
    Synced,
    /// The reconciliation failed; the next scheduled cycle retries
    Error,
}

/// What a `perform_sync` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another reconciliation was in flight; this call had no effect
    AlreadyRunning,
    /// No user is signed in; nothing to reconcile against
    NotAuthenticated,
    /// Local copy was written to the remote store
    Uploaded,
    /// Cloud copy was written to local storage
    Downloaded,
    /// Timestamps were equal; nothing moved
    UpToDate,
    /// No table row matched; local data kept as-is (never silently deleted)
    KeptLocal,
}

/// Holds the in-progress flag for the duration of one reconciliation.
///
/// Dropping clears the flag, so an aborted auto-sync task cannot leave the
/// engine wedged in the already-running state.
struct InProgressGuard<'a>(&'a AtomicBool);

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Bidirectional last-write-wins sync between local storage and the remote
/// document store.
pub struct SyncEngine {
    local: Arc<LocalStore>,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    in_progress: AtomicBool,
    status_tx: broadcast::Sender<SyncStatus>,
    auto_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(
        local: Arc<LocalStore>,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(SYNC_STATUS_CHANNEL_CAPACITY);
        Self {
            local,
            remote,
            auth,
            in_progress: AtomicBool::new(false),
            status_tx,
            auto_task: Mutex::new(None),
        }
    }

    /// Subscribe to sync status updates
    pub fn subscribe_status(&self) -> broadcast::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Record that local content changed.
    ///
    /// Only stamps `lastModified`; deliberately does not trigger an
    /// immediate sync, so bursts of edits (rapid drag-and-drop) batch into
    /// the next scheduled cycle.
    pub async fn mark_as_modified(&self) {
        if let Err(e) = self.local.touch_last_modified().await {
            tracing::error!("Failed to stamp lastModified: {e}");
        }
    }

    /// Run one reconciliation.
    ///
    /// Deduplicates concurrent callers and skips when signed out. The
    /// in-progress guard is released on every exit path, cancellation
    /// included. Listeners receive `Syncing`, then `Synced` or `Error`.
    pub async fn perform_sync(&self) -> Result<SyncOutcome, SyncError> {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            tracing::debug!("Sync already in progress, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let _guard = InProgressGuard(&self.in_progress);

        let Some(user) = self.auth.current_user() else {
            tracing::debug!("No user signed in, skipping sync");
            return Ok(SyncOutcome::NotAuthenticated);
        };

        let _ = self.status_tx.send(SyncStatus::Syncing);
        let result = self.reconcile(&user).await;

        match &result {
            Ok(outcome) => {
                if let Err(e) = self.local.set_last_sync_time(Utc::now()).await {
                    tracing::warn!("Failed to record lastSyncTime: {e}");
                }
                tracing::info!(uid = %user.uid, "Sync completed: {outcome:?}");
                let _ = self.status_tx.send(SyncStatus::Synced);
            }
            Err(e) => {
                tracing::error!(uid = %user.uid, "Sync failed: {e}");
                let _ = self.status_tx.send(SyncStatus::Error);
            }
        }

        result
    }

    /// Sync once now, then every `interval`, until [`stop_auto_sync`].
    ///
    /// Cycles that fire while signed out are skipped, not cancelled; the
    /// timer keeps running so sign-in picks up where it left off.
    ///
    /// [`stop_auto_sync`]: SyncEngine::stop_auto_sync
    pub fn start_auto_sync(self: &Arc<Self>, interval: Duration) {
        self.stop_auto_sync();

        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            if let Err(e) = engine.perform_sync().await {
                tracing::warn!("Initial auto-sync cycle failed: {e}");
            }
            loop {
                tokio::time::sleep(interval).await;
                if !engine.auth.is_logged_in() {
                    continue;
                }
                if let Err(e) = engine.perform_sync().await {
                    tracing::warn!("Auto-sync cycle failed: {e}");
                }
            }
        });

        *self
            .auto_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
    }

    /// Cancel the periodic sync timer, if one is running.
    pub fn stop_auto_sync(&self) {
        let handle = self
            .auto_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    async fn reconcile(&self, user: &UserInfo) -> Result<SyncOutcome, SyncError> {
        let local_tree = self.local.load_tree().await?;
        let local_modified = self.local.last_modified().await?;

        let cloud_value = self
            .remote
            .get(&user.uid)
            .await
            .map_err(|e| SyncError::remote(e.to_string()))?;
        let cloud: Option<RemoteDocument> = match cloud_value {
            Some(value) => match serde_json::from_value(value) {
                Ok(document) => Some(document),
                Err(e) => {
                    // A record we cannot read gets overwritten by the upload
                    // branch, same as no record at all
                    tracing::warn!(uid = %user.uid, "Cloud record is unreadable, treating as absent: {e}");
                    None
                }
            },
            None => None,
        };

        let Some(cloud) = cloud else {
            self.upload(user).await?;
            return Ok(SyncOutcome::Uploaded);
        };
        if cloud.last_modified.is_none() {
            self.upload(user).await?;
            return Ok(SyncOutcome::Uploaded);
        }

        let cloud_has_nodes = !cloud.citation_tree.nodes.is_empty();

        // Fresh-session heuristic: an empty local tree must never shadow
        // non-empty cloud data
        if local_tree.nodes.is_empty() && cloud_has_nodes {
            self.download(&cloud).await?;
            return Ok(SyncOutcome::Downloaded);
        }
        if local_modified.is_none() && cloud_has_nodes {
            self.download(&cloud).await?;
            return Ok(SyncOutcome::Downloaded);
        }

        match (local_modified, cloud.last_modified) {
            (Some(local_ts), Some(cloud_ts)) if local_ts > cloud_ts => {
                self.upload(user).await?;
                Ok(SyncOutcome::Uploaded)
            }
            (Some(local_ts), Some(cloud_ts)) if cloud_ts > local_ts => {
                self.download(&cloud).await?;
                Ok(SyncOutcome::Downloaded)
            }
            (Some(_), Some(_)) => Ok(SyncOutcome::UpToDate),
            _ => {
                // Defensive default: keep local as-is, never silently delete.
                // Leave a timestamp behind so the next cycle can compare
                // instead of landing here again.
                if local_modified.is_none() {
                    self.local.touch_last_modified().await?;
                }
                tracing::warn!(uid = %user.uid, "No reconciliation rule matched, keeping local data");
                Ok(SyncOutcome::KeptLocal)
            }
        }
    }

    /// Write the sanitized local state to the remote store, stamping a fresh
    /// `lastModified` both on the uploaded document and locally.
    async fn upload(&self, user: &UserInfo) -> Result<(), SyncError> {
        // Re-read inside the branch so the upload carries edits made while
        // the decision was being computed
        let tree = self.local.load_tree().await?;
        let counter = self.local.load_node_counter().await?;
        let now = Utc::now();

        let document = RemoteDocument {
            citation_tree: tree,
            node_counter: counter,
            last_modified: Some(now),
            user_email: user.email.clone(),
        };
        let payload = sanitize_document(serde_json::to_value(&document)?);
        self.remote
            .set(&user.uid, payload)
            .await
            .map_err(|e| SyncError::remote(e.to_string()))?;

        self.local.set_last_modified(now).await?;
        tracing::info!(uid = %user.uid, "Uploaded local citation tree");
        Ok(())
    }

    /// Write the cloud copy into local storage with a sync-tagged write and
    /// the cloud's own `lastModified`.
    async fn download(&self, cloud: &RemoteDocument) -> Result<(), SyncError> {
        self.local
            .save_tree(&cloud.citation_tree, WriteOrigin::Sync)
            .await?;
        self.local.save_node_counter(cloud.node_counter).await?;
        if let Some(cloud_ts) = cloud.last_modified {
            self.local.set_last_modified(cloud_ts).await?;
        }
        tracing::info!(
            nodes = cloud.citation_tree.nodes.len(),
            "Downloaded cloud citation tree"
        );
        Ok(())
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop_auto_sync();
    }
}
