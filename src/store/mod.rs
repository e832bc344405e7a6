//! Persistence of the active template specification.
//!
//! Exactly one specification is active at a time. It is stored under a fixed
//! key, overwritten on every new inspection or selection, and read when a form
//! session starts.

use async_trait::async_trait;
use moka::future::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::spec::TemplateSpec;

pub const ACTIVE_SPEC_KEY: &str = "templateSpec";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access specification store: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored specification is not readable: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait SpecStore: Send + Sync {
    async fn load(&self) -> Result<Option<TemplateSpec>, StoreError>;

    async fn save(&self, spec: &TemplateSpec) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// Keeps the active specification as `templateSpec.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileSpecStore {
    path: PathBuf,
}

impl FileSpecStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", ACTIVE_SPEC_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SpecStore for FileSpecStore {
    async fn load(&self) -> Result<Option<TemplateSpec>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, spec: &TemplateSpec) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(spec)?;
        // Write then rename so a reader never sees a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write-through cache in front of a [`SpecStore`]: reads are served from RAM,
/// writes land in the cache first and are then persisted.
#[derive(Clone)]
pub struct ActiveSpecCache {
    cache: Cache<String, TemplateSpec>,
    store: Arc<dyn SpecStore>,
}

impl ActiveSpecCache {
    pub fn new(store: Arc<dyn SpecStore>) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).build(),
            store,
        }
    }

    pub async fn get(&self) -> Result<Option<TemplateSpec>, StoreError> {
        if let Some(spec) = self.cache.get(ACTIVE_SPEC_KEY).await {
            log::debug!("Active specification served from cache");
            return Ok(Some(spec));
        }

        let spec = self.store.load().await?;
        if let Some(ref spec) = spec {
            self.cache
                .insert(ACTIVE_SPEC_KEY.to_string(), spec.clone())
                .await;
            log::info!(
                "Active specification {} v{} loaded from store",
                spec.template_id,
                spec.version
            );
        }
        Ok(spec)
    }

    /// Replaces the active specification. Nothing changes if it cannot be persisted.
    pub async fn set(&self, spec: TemplateSpec) -> Result<(), StoreError> {
        self.store.save(&spec).await?;
        log::info!(
            "Active specification set to {} v{} ({} fields)",
            spec.template_id,
            spec.version,
            spec.fields.len()
        );
        self.cache.insert(ACTIVE_SPEC_KEY.to_string(), spec).await;
        Ok(())
    }

    /// Forgets the active specification if it is the given template.
    pub async fn clear_if(&self, template_id: &str) -> Result<bool, StoreError> {
        match self.get().await? {
            Some(spec) if spec.template_id == template_id => {
                self.cache.invalidate(ACTIVE_SPEC_KEY).await;
                self.store.clear().await?;
                log::info!("Active specification {} cleared", template_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
