pub mod remote_store;
pub mod service_account;
pub mod google_drive_client;
pub mod folder_resolver;
pub mod uploader;
