pub mod camera_feed;
pub mod image_downloader;
