use std::path::{Path, PathBuf};
use crate::errors::AppError;
use log::{debug, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

pub fn ensure_output_directory(dir_path: &Path) -> Result<PathBuf, AppError> {
    if !dir_path.exists() {
        debug!("Output directory '{}' does not exist, attempting to create it.", dir_path.display());
        std::fs::create_dir_all(dir_path).map_err(|e| {
            AppError::Io(format!(
                "Failed to create output directory '{}': {}",
                dir_path.display(),
                e
            ))
        })?;
    } else if !dir_path.is_dir() {
        return Err(AppError::Io(format!(
            "Output path '{}' exists but is not a directory.",
            dir_path.display()
        )));
    }
    Ok(dir_path.to_path_buf())
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        Some("log") | Some("txt") => "text/plain",
        _ => "image/jpeg",
    }
}

/// Every `.jpg`/`.png` file below `root`, sorted by path.
pub fn collect_image_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️ Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_image_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Folder names between `local_root` and the file, excluding the file name itself.
pub fn relative_folder_segments(file_path: &Path, local_root: &Path) -> Result<Vec<String>, AppError> {
    let relative = file_path.strip_prefix(local_root).map_err(|_| {
        AppError::Io(format!(
            "'{}' is not located under '{}'",
            file_path.display(),
            local_root.display()
        ))
    })?;
    Ok(relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default())
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
