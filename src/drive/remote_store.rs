use crate::errors::AppError;
use async_trait::async_trait;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// The handful of remote storage calls the batch needs. Objects are addressed by opaque ids.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// First non-trashed folder called `name` directly under `parent_id`.
    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<String>, AppError>;

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String, AppError>;

    /// First non-trashed, non-folder object called `name` directly under `parent_id`.
    async fn find_file(&self, parent_id: &str, name: &str) -> Result<Option<String>, AppError>;

    async fn create_file(
        &self,
        parent_id: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<String, AppError>;

    /// Replaces the content of an existing file, keeping its id and parent.
    async fn update_file(&self, file_id: &str, content_type: &str, content: Vec<u8>) -> Result<(), AppError>;
}
