//! Ownership of the active license.
//!
//! Reads go through an [`ArcSwapOption`] and never wait on a lock, so a
//! request in flight observes either the old or the new artifact in full.
//! Every write (update, refresh, clear) runs inside one async mutex and
//! persists before it swaps.
//!
//! Cancellation is honored while waiting for initialization, the write
//! lock, or the refresher. Persisting and swapping run in a spawned task that
//! owns the write lock, so once a write starts it completes even if the
//! caller is cancelled or its future is dropped.

use crate::artifact::LicenseArtifact;
use crate::error::{ClientError, ClientResult, StoreError};
use crate::refresher::{LicenseRefresher, RefreshContext};
use crate::store::LicenseStore;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A different license was obtained, persisted and swapped in.
    Refreshed,
    /// The source had nothing new (no token, or the same token).
    Unchanged,
    /// The source errored, persisting failed, or the call was cancelled.
    Failed,
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed)
    }
}

/// Holds the active license and coordinates loads, updates and refreshes.
pub struct LicenseManager {
    store: Arc<dyn LicenseStore>,
    refresher: Arc<dyn LicenseRefresher>,
    current: Arc<ArcSwapOption<LicenseArtifact>>,
    initialized: OnceCell<()>,
    write_lock: Arc<Mutex<()>>,
}

impl LicenseManager {
    pub fn new(store: Arc<dyn LicenseStore>, refresher: Arc<dyn LicenseRefresher>) -> Self {
        Self {
            store,
            refresher,
            current: Arc::new(ArcSwapOption::const_empty()),
            initialized: OnceCell::new(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Loads the stored license once. Concurrent callers share one load.
    ///
    /// An unreadable store starts the manager without a license.
    pub async fn initialize(&self, cancel: &CancellationToken) -> ClientResult<()> {
        if self.initialized.initialized() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            _ = self.initialized.get_or_init(|| self.load_stored()) => Ok(()),
        }
    }

    async fn load_stored(&self) {
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("license store failed to load, starting without a license: {e}");
                None
            }
        };
        match &stored {
            Some(artifact) => info!(expires_at = ?artifact.expires_at(), "license loaded"),
            None => info!("no license available"),
        }
        self.current.store(stored.map(Arc::new));
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Returns the current token after making sure the store has been read.
    ///
    /// Never waits for an update or refresh in progress.
    pub async fn get_token(&self, cancel: &CancellationToken) -> ClientResult<Option<String>> {
        self.initialize(cancel).await?;
        Ok(self
            .current
            .load()
            .as_ref()
            .map(|artifact| artifact.token().to_string()))
    }

    /// Snapshot of the current artifact without touching the store.
    pub fn current(&self) -> Option<Arc<LicenseArtifact>> {
        self.current.load_full()
    }

    /// Persists `artifact` and makes it current.
    pub async fn update(
        &self,
        artifact: LicenseArtifact,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        self.initialize(cancel).await?;
        let guard = self.lock_for_write(cancel).await?;

        self.commit(guard, Some(artifact)).await?;
        info!("license updated");
        Ok(())
    }

    /// Asks the refresher for a new license; true only if one was swapped in.
    pub async fn refresh(&self, context: &RefreshContext, cancel: &CancellationToken) -> bool {
        self.refresh_with_outcome(context, cancel)
            .await
            .is_refreshed()
    }

    /// Like [`refresh`](Self::refresh) but tells "nothing new" apart from "failed".
    ///
    /// Refreshes are serialized with each other and with updates. Nothing
    /// is persisted unless the refresher returns a different token.
    pub async fn refresh_with_outcome(
        &self,
        context: &RefreshContext,
        cancel: &CancellationToken,
    ) -> RefreshOutcome {
        if self.initialize(cancel).await.is_err() {
            debug!(operation = %context.operation, "refresh cancelled before initialization");
            return RefreshOutcome::Failed;
        }
        let Ok(guard) = self.lock_for_write(cancel).await else {
            debug!(operation = %context.operation, "refresh cancelled while waiting");
            return RefreshOutcome::Failed;
        };

        let current = self.current.load_full();
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation = %context.operation, "refresh cancelled");
                return RefreshOutcome::Failed;
            }
            fetched = self.refresher.refresh(current.as_deref(), context) => fetched,
        };

        let candidate = match fetched {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                debug!(operation = %context.operation, "no new license available");
                return RefreshOutcome::Unchanged;
            }
            Err(e) => {
                warn!(operation = %context.operation, "license refresh failed: {e:#}");
                return RefreshOutcome::Failed;
            }
        };

        if current.as_deref().is_some_and(|c| c.same_token(&candidate)) {
            debug!(operation = %context.operation, "refreshed license is unchanged");
            return RefreshOutcome::Unchanged;
        }
        if cancel.is_cancelled() {
            return RefreshOutcome::Failed;
        }

        if let Err(e) = self.commit(guard, Some(candidate)).await {
            warn!(operation = %context.operation, "refreshed license could not be stored: {e}");
            return RefreshOutcome::Failed;
        }
        info!(operation = %context.operation, status = ?context.status, "license refreshed");
        RefreshOutcome::Refreshed
    }

    /// Removes the license from the store and from memory.
    pub async fn clear(&self, cancel: &CancellationToken) -> ClientResult<()> {
        self.initialize(cancel).await?;
        let guard = self.lock_for_write(cancel).await?;

        self.commit(guard, None).await?;
        info!("license cleared");
        Ok(())
    }

    async fn lock_for_write(&self, cancel: &CancellationToken) -> ClientResult<OwnedMutexGuard<()>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            guard = Arc::clone(&self.write_lock).lock_owned() => Ok(guard),
        }
    }

    /// Persists `artifact` (or clears the store for `None`), then swaps it in.
    ///
    /// The write lock travels with the spawned task and is released only
    /// after the swap.
    async fn commit(
        &self,
        guard: OwnedMutexGuard<()>,
        artifact: Option<LicenseArtifact>,
    ) -> ClientResult<()> {
        let store = Arc::clone(&self.store);
        let current = Arc::clone(&self.current);
        let task = tokio::spawn(async move {
            let _guard = guard;
            match artifact {
                Some(artifact) => {
                    store.save(&artifact).await?;
                    current.store(Some(Arc::new(artifact)));
                }
                None => {
                    store.clear().await?;
                    current.store(None);
                }
            }
            Ok::<(), StoreError>(())
        });
        task.await.map_err(StoreError::from)??;
        Ok(())
    }
}

impl std::fmt::Debug for LicenseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseManager")
            .field("initialized", &self.is_initialized())
            .field("current", &self.current.load_full())
            .finish()
    }
}
