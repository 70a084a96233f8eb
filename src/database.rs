use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task;
use tracing::info;

use crate::store::{Catalog, StoreError};

/// Outcome of [`Database::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Opened,
    AlreadyReady,
}

/// The process-wide store handle.
///
/// Connecting opens the collection indexes once; every request afterwards
/// shares the same read-only [`Catalog`].
pub struct Database {
    index_dir: Option<PathBuf>,
    catalog: RwLock<Option<Arc<Catalog>>>,
}

impl Database {
    /// A handle that opens the indexes below `index_dir` on first use.
    pub fn open_lazy(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: Some(index_dir.into()),
            catalog: RwLock::new(None),
        }
    }

    /// A handle around an already open catalog. Once closed it cannot be
    /// reopened.
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            index_dir: None,
            catalog: RwLock::new(Some(Arc::new(catalog))),
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.catalog.read().await.is_some()
    }

    pub async fn initialize(&self) -> Result<InitOutcome, StoreError> {
        if self.is_ready().await {
            return Ok(InitOutcome::AlreadyReady);
        }

        let mut slot = self.catalog.write().await;
        if slot.is_some() {
            return Ok(InitOutcome::AlreadyReady);
        }

        let index_dir = self.index_dir.clone().ok_or(StoreError::NotInitialized)?;
        info!(path = %index_dir.display(), "opening document store");
        let catalog = task::spawn_blocking(move || Catalog::open(&index_dir)).await??;
        *slot = Some(Arc::new(catalog));
        Ok(InitOutcome::Opened)
    }

    /// The open catalog, connecting first if needed.
    pub async fn catalog(&self) -> Result<Arc<Catalog>, StoreError> {
        if let Some(catalog) = self.catalog.read().await.as_ref() {
            return Ok(Arc::clone(catalog));
        }
        self.initialize().await?;
        self.catalog
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(StoreError::NotInitialized)
    }

    pub async fn close(&self) {
        if self.catalog.write().await.take().is_some() {
            info!("document store closed");
        }
    }
}
