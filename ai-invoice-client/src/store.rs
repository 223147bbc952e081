//! Encrypted at-rest persistence of the active license.

use crate::artifact::LicenseArtifact;
use crate::error::StoreResult;
use ai_invoice_crypto::SecretProtector;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Directory under the platform data dir that holds client state.
const APP_DIR: &str = "ai-invoice";
const LICENSE_FILE: &str = "license.bin";
const KEY_FILE: &str = "license.key";

/// Persistence for the single active license artifact.
///
/// Persisted state is either a complete artifact or nothing.
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Loads the stored artifact. Absent, unreadable or corrupt data is `None`.
    async fn load(&self) -> StoreResult<Option<LicenseArtifact>>;

    /// Atomically replaces the stored artifact.
    async fn save(&self, artifact: &LicenseArtifact) -> StoreResult<()>;

    /// Deletes the stored artifact. Clearing an empty store is not an error.
    async fn clear(&self) -> StoreResult<()>;
}

/// Stores the artifact as a protected JSON blob in a single file.
pub struct FileLicenseStore {
    path: PathBuf,
    protector: Arc<dyn SecretProtector>,
}

impl FileLicenseStore {
    pub fn new(path: impl Into<PathBuf>, protector: Arc<dyn SecretProtector>) -> Self {
        Self {
            path: path.into(),
            protector,
        }
    }

    /// Default `(license file, key file)` locations under the local data dir.
    pub fn default_paths() -> Option<(PathBuf, PathBuf)> {
        let dir = dirs::data_local_dir()?.join(APP_DIR);
        Some((dir.join(LICENSE_FILE), dir.join(KEY_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(LICENSE_FILE));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    // Protector calls may block on the key file or platform APIs; they run
    // on the blocking pool.
    async fn decode(&self, blob: Vec<u8>) -> StoreResult<Option<LicenseArtifact>> {
        let protector = Arc::clone(&self.protector);
        let unprotected = tokio::task::spawn_blocking(move || protector.unprotect(&blob)).await?;
        let plaintext = match unprotected {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    protector = self.protector.name(),
                    "stored license cannot be decrypted, ignoring: {e}"
                );
                return Ok(None);
            }
        };
        match serde_json::from_slice::<LicenseArtifact>(&plaintext) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(e) => {
                warn!(path = %self.path.display(), "stored license is corrupt, ignoring: {e}");
                Ok(None)
            }
        }
    }

    async fn encode(&self, artifact: &LicenseArtifact) -> StoreResult<Vec<u8>> {
        let plaintext = Zeroizing::new(serde_json::to_vec(artifact)?);
        let protector = Arc::clone(&self.protector);
        let blob = tokio::task::spawn_blocking(move || protector.protect(&plaintext)).await??;
        Ok(blob)
    }
}

impl std::fmt::Debug for FileLicenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLicenseStore")
            .field("path", &self.path)
            .field("protector", &self.protector.name())
            .finish()
    }
}

#[async_trait]
impl LicenseStore for FileLicenseStore {
    async fn load(&self) -> StoreResult<Option<LicenseArtifact>> {
        let blob = match tokio::fs::read(&self.path).await {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored license");
                return Ok(None);
            }
            Err(e) => {
                warn!(path = %self.path.display(), "stored license is unreadable, ignoring: {e}");
                return Ok(None);
            }
        };

        let artifact = self.decode(blob).await?;
        if artifact.is_some() {
            debug!(path = %self.path.display(), "loaded stored license");
        }
        Ok(artifact)
    }

    async fn save(&self, artifact: &LicenseArtifact) -> StoreResult<()> {
        let blob = self.encode(artifact).await?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        let written = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(&blob).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        info!(path = %self.path.display(), "stored license");
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "cleared stored license");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
