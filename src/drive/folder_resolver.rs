use crate::drive::remote_store::RemoteStore;
use crate::errors::AppError;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Maps `(parent id, folder name)` to a remote folder id, creating folders on first use.
///
/// The remote service offers no atomic get-or-create, so the lookup and the create
/// run under one lock. Two callers asking for the same folder therefore never both
/// see "missing" and create duplicates. Resolved ids are remembered for the rest of
/// the run; the remote listing is only consulted on a cache miss.
pub struct FolderResolver {
    store: Arc<dyn RemoteStore>,
    cache: Mutex<HashMap<(String, String), String>>,
}

impl FolderResolver {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve_folder(&self, parent_id: &str, name: &str) -> Result<String, AppError> {
        let key = (parent_id.to_string(), name.to_string());
        let mut cache = self.cache.lock().await;
        if let Some(id) = cache.get(&key) {
            debug!("Folder '{}' under {} cached as {}", name, parent_id, id);
            return Ok(id.clone());
        }

        let id = match self.store.find_folder(parent_id, name).await? {
            Some(id) => {
                debug!("Found existing folder '{}' under {}: {}", name, parent_id, id);
                id
            }
            None => {
                let id = self.store.create_folder(parent_id, name).await?;
                info!("📁 Created remote folder '{}' under {}: {}", name, parent_id, id);
                id
            }
        };
        cache.insert(key, id.clone());
        Ok(id)
    }

    /// Walks `segments` from `root_id`, skipping empty names. Stops at the first failure.
    pub async fn resolve_path<S: AsRef<str>>(&self, root_id: &str, segments: &[S]) -> Result<String, AppError> {
        let names: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();
        let mut current = root_id.to_string();
        for name in names.iter().filter(|s| !s.is_empty()) {
            current = self.resolve_folder(&current, name).await.map_err(|e| AppError::RemoteResolution {
                path: names.join("/"),
                details: e.to_string(),
            })?;
        }
        Ok(current)
    }

    pub async fn cached_folders(&self) -> usize {
        self.cache.lock().await.len()
    }
}
