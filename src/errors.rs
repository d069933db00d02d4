use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Authentication Failed: {0}")]
    Auth(String),

    #[error("Camera Feed Error: {0}")]
    Fetch(String),

    #[error("Download Error for camera {camera_id}: {details}")]
    Download { camera_id: String, details: String },

    #[error("Remote Folder Resolution Error for '{path}': {details}")]
    RemoteResolution { path: String, details: String },

    #[error("Upload Error for {file}: {details}")]
    Upload { file: String, details: String },

    #[error("Remote Storage Error: {0}")]
    Remote(String),

    #[error("File I/O Error: {0}")]
    Io(String),
}

// Allow conversion from std::io::Error to AppError::Io
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}
