// Shared helpers for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use trafficcam::errors::AppError;
use trafficcam::drive::remote_store::RemoteStore;

#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
    pub parent: String,
    pub is_folder: bool,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

/// In-memory stand-in for the remote storage service, counting every call.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<RemoteObject>>,
    pub find_folder_calls: AtomicUsize,
    pub create_folder_calls: AtomicUsize,
    pub find_file_calls: AtomicUsize,
    pub create_file_calls: AtomicUsize,
    pub update_file_calls: AtomicUsize,
    /// Number of upcoming `create_file` calls that fail. `usize::MAX` fails forever.
    failing_creates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_creates(count: usize) -> Self {
        let store = Self::default();
        store.failing_creates.store(count, Ordering::SeqCst);
        store
    }

    pub fn folders(&self) -> Vec<RemoteObject> {
        self.objects.lock().unwrap().iter().filter(|o| o.is_folder).cloned().collect()
    }

    pub fn files(&self) -> Vec<RemoteObject> {
        self.objects.lock().unwrap().iter().filter(|o| !o.is_folder).cloned().collect()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn insert(&self, parent: &str, name: &str, is_folder: bool, content_type: Option<&str>, content: Vec<u8>) -> String {
        let mut objects = self.objects.lock().unwrap();
        let id = format!("id-{}", objects.len() + 1);
        objects.push(RemoteObject {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.to_string(),
            is_folder,
            content_type: content_type.map(str::to_string),
            content,
        });
        id
    }

    fn find(&self, parent: &str, name: &str, is_folder: bool) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.parent == parent && o.name == name && o.is_folder == is_folder)
            .map(|o| o.id.clone())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<String>, AppError> {
        self.find_folder_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find(parent_id, name, true))
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String, AppError> {
        self.create_folder_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.insert(parent_id, name, true, None, Vec::new()))
    }

    async fn find_file(&self, parent_id: &str, name: &str) -> Result<Option<String>, AppError> {
        self.find_file_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find(parent_id, name, false))
    }

    async fn create_file(
        &self,
        parent_id: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<String, AppError> {
        self.create_file_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_creates.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.failing_creates.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(AppError::Remote("simulated 503 from storage".to_string()));
        }
        Ok(self.insert(parent_id, name, false, Some(content_type), content))
    }

    async fn update_file(&self, file_id: &str, content_type: &str, content: Vec<u8>) -> Result<(), AppError> {
        self.update_file_calls.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .iter_mut()
            .find(|o| o.id == file_id)
            .ok_or_else(|| AppError::Remote(format!("no such file {}", file_id)))?;
        object.content_type = Some(content_type.to_string());
        object.content = content;
        Ok(())
    }
}
