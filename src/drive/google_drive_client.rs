use crate::app_config::DriveConfig;
use crate::drive::remote_store::{RemoteStore, FOLDER_MIME_TYPE};
use crate::drive::service_account::ServiceAccountKey;
use crate::errors::AppError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const MULTIPART_BOUNDARY: &str = "trafficcam-upload-7f3c2a91";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Google Drive v3 over REST, authenticated with a bearer token obtained once at startup.
#[derive(Clone)]
pub struct GoogleDriveClient {
    http_client: Client,
    access_token: String,
    api_base_url: String,
    upload_base_url: String,
    timeout: Duration,
}

impl GoogleDriveClient {
    pub fn new(http_client: Client, config: &DriveConfig, access_token: String) -> Self {
        Self {
            http_client,
            access_token,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Loads the service account and authenticates. Every failure is an `AppError::Auth`.
    pub async fn connect(http_client: Client, config: &DriveConfig) -> Result<Self, AppError> {
        let key = ServiceAccountKey::load(config)?;
        let token = key.fetch_access_token(&http_client, &config.scope).await?;
        match token.expires_in {
            Some(lifetime) => debug!("Drive access token valid for {:?}", lifetime),
            None => debug!("Drive access token carries no expiry"),
        }
        Ok(Self::new(http_client, config, token.token))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.access_token).timeout(self.timeout)
    }

    async fn send(&self, builder: RequestBuilder, operation: &str) -> Result<Response, AppError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("{} failed: {}", operation, e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!("{} returned {}: {}", operation, status, body)));
        }
        Ok(response)
    }

    async fn first_match(&self, query: String, operation: &str) -> Result<Option<String>, AppError> {
        debug!("Drive query: {}", query);
        let request = self.http_client.get(format!("{}/drive/v3/files", self.api_base_url)).query(&[
            ("q", query.as_str()),
            ("fields", "files(id)"),
            ("spaces", "drive"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ]);
        let list: FileList = self
            .send(request, operation)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("{} response is invalid: {}", operation, e)))?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn created_id(response: Response, operation: &str) -> Result<String, AppError> {
        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("{} response is invalid: {}", operation, e)))?;
        Ok(file.id)
    }
}

/// Quotes a value for use inside a Drive `q` string literal.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn folder_query(parent_id: &str, name: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and '{}' in parents and trashed = false",
        escape_query_value(name),
        FOLDER_MIME_TYPE,
        escape_query_value(parent_id)
    )
}

pub fn file_query(parent_id: &str, name: &str) -> String {
    format!(
        "name = '{}' and mimeType != '{}' and '{}' in parents and trashed = false",
        escape_query_value(name),
        FOLDER_MIME_TYPE,
        escape_query_value(parent_id)
    )
}

/// `multipart/related` body: JSON metadata part followed by the media part.
pub fn multipart_related_body(metadata: &serde_json::Value, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: {ct}\r\n\r\n",
            b = MULTIPART_BOUNDARY,
            meta = metadata,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

#[async_trait]
impl RemoteStore for GoogleDriveClient {
    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<String>, AppError> {
        self.first_match(folder_query(parent_id, name), "folder lookup").await
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String, AppError> {
        let request = self
            .http_client
            .post(format!("{}/drive/v3/files", self.api_base_url))
            .query(&[("fields", "id"), ("supportsAllDrives", "true")])
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME_TYPE, "parents": [parent_id] }));
        let response = self.send(request, "folder create").await?;
        Self::created_id(response, "folder create").await
    }

    async fn find_file(&self, parent_id: &str, name: &str) -> Result<Option<String>, AppError> {
        self.first_match(file_query(parent_id, name), "file lookup").await
    }

    async fn create_file(
        &self,
        parent_id: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<String, AppError> {
        let metadata = json!({ "name": name, "parents": [parent_id] });
        let request = self
            .http_client
            .post(format!("{}/upload/drive/v3/files", self.upload_base_url))
            .query(&[("uploadType", "multipart"), ("fields", "id"), ("supportsAllDrives", "true")])
            .header(CONTENT_TYPE, format!("multipart/related; boundary={}", MULTIPART_BOUNDARY))
            .body(multipart_related_body(&metadata, content_type, &content));
        let response = self.send(request, "file upload").await?;
        Self::created_id(response, "file upload").await
    }

    async fn update_file(&self, file_id: &str, content_type: &str, content: Vec<u8>) -> Result<(), AppError> {
        let request = self
            .http_client
            .patch(format!("{}/upload/drive/v3/files/{}", self.upload_base_url, file_id))
            .query(&[("uploadType", "media"), ("supportsAllDrives", "true")])
            .header(CONTENT_TYPE, content_type)
            .body(content);
        self.send(request, "file update").await?;
        Ok(())
    }
}
