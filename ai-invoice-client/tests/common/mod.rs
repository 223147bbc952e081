//! Shared test helpers for client tests.

#![allow(dead_code)]

use ai_invoice_client::{
    LicenseArtifact, LicenseManager, LicenseRefresher, LicenseStore, RefreshContext, StoreResult,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn artifact(token: &str) -> LicenseArtifact {
    LicenseArtifact::new(token, None).unwrap()
}

// ── Stores ──────────────────────────────────────────────────────

/// In-memory store that counts every operation.
#[derive(Default)]
pub struct CountingStore {
    stored: Mutex<Option<LicenseArtifact>>,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
    pub clears: AtomicUsize,
}

impl CountingStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_token(token: &str) -> Arc<Self> {
        let store = Self::default();
        *store.stored.lock().unwrap() = Some(artifact(token));
        Arc::new(store)
    }

    pub fn stored_token(&self) -> Option<String> {
        self.stored
            .lock()
            .unwrap()
            .as_ref()
            .map(|a| a.token().to_string())
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LicenseStore for CountingStore {
    async fn load(&self) -> StoreResult<Option<LicenseArtifact>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn save(&self, artifact: &LicenseArtifact) -> StoreResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = Some(artifact.clone());
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = None;
        Ok(())
    }
}

/// Store whose saves park until released.
#[derive(Default)]
pub struct GatedStore {
    stored: Mutex<Option<LicenseArtifact>>,
    pub save_started: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stored_token(&self) -> Option<String> {
        self.stored
            .lock()
            .unwrap()
            .as_ref()
            .map(|a| a.token().to_string())
    }
}

#[async_trait]
impl LicenseStore for GatedStore {
    async fn load(&self) -> StoreResult<Option<LicenseArtifact>> {
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn save(&self, artifact: &LicenseArtifact) -> StoreResult<()> {
        self.save_started.notify_one();
        self.release.notified().await;
        *self.stored.lock().unwrap() = Some(artifact.clone());
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        *self.stored.lock().unwrap() = None;
        Ok(())
    }
}

// ── Refreshers ──────────────────────────────────────────────────

/// What a [`ScriptedRefresher`] answers with.
#[derive(Clone)]
pub enum Script {
    Token(String),
    Nothing,
    Fail(String),
}

/// Refresher that always answers the same way and counts its calls.
pub struct ScriptedRefresher {
    script: Script,
    pub calls: AtomicUsize,
    pub last_context: Mutex<Option<RefreshContext>>,
}

impl ScriptedRefresher {
    pub fn token(token: &str) -> Arc<Self> {
        Self::new(Script::Token(token.to_string()))
    }

    pub fn nothing() -> Arc<Self> {
        Self::new(Script::Nothing)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(Script::Fail(message.to_string()))
    }

    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            last_context: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<RefreshContext> {
        self.last_context.lock().unwrap().clone()
    }
}

#[async_trait]
impl LicenseRefresher for ScriptedRefresher {
    async fn refresh(
        &self,
        _current: Option<&LicenseArtifact>,
        context: &RefreshContext,
    ) -> anyhow::Result<Option<LicenseArtifact>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().unwrap() = Some(context.clone());
        match &self.script {
            Script::Token(token) => Ok(Some(artifact(token))),
            Script::Nothing => Ok(None),
            Script::Fail(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}

/// Refresher that parks until released, then returns `token`.
pub struct GatedRefresher {
    token: String,
    pub started: Notify,
    pub release: Notify,
}

impl GatedRefresher {
    pub fn new(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: token.to_string(),
            started: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl LicenseRefresher for GatedRefresher {
    async fn refresh(
        &self,
        _current: Option<&LicenseArtifact>,
        _context: &RefreshContext,
    ) -> anyhow::Result<Option<LicenseArtifact>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Some(artifact(&self.token)))
    }
}

pub fn manager(
    store: Arc<CountingStore>,
    refresher: Arc<dyn LicenseRefresher>,
) -> Arc<LicenseManager> {
    Arc::new(LicenseManager::new(store, refresher))
}
