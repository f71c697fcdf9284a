//! File system collaborators
//!
//! Writing exports (and images) into the downloads directory, reading import
//! files, and the plugin's private data directory.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use tracing::debug;

use crate::errors::{PromptBoxError, Result};
use crate::prompt::now_millis;

/// Reads and writes files on behalf of the app
#[derive(Debug, Clone)]
pub struct FileServices {
    downloads_dir: PathBuf,
    data_dir:      PathBuf,
}

impl FileServices {
    pub fn new(downloads_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
            data_dir:      data_dir.into(),
        }
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Full text content of a file
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    /// Write text into the downloads directory and return the file path
    ///
    /// Defaults to `prompt-export-<ms>.json` when no name is given.
    pub fn write_text_file(&self, text: &str, file_name: Option<&str>) -> Result<PathBuf> {
        let file_name = match file_name {
            Some(name) => sanitize_file_name(name)?,
            None => format!("prompt-export-{}.json", now_millis()),
        };

        self.ensure_directory(&self.downloads_dir)?;
        let path = self.downloads_dir.join(file_name);
        fs::write(&path, text)?;
        debug!(path = %path.display(), "wrote text file");
        Ok(path)
    }

    /// Decode a `data:image/<ext>;base64,` URL into the downloads directory
    ///
    /// Returns `None` when the string is not an image data URL.
    pub fn write_image_file(&self, data_url: &str) -> Result<Option<PathBuf>> {
        let Some((ext, payload)) = parse_image_data_url(data_url) else {
            return Ok(None);
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| PromptBoxError::Format(format!("Invalid base64 image: {}", e)))?;

        self.ensure_directory(&self.downloads_dir)?;
        let path = self.downloads_dir.join(format!("{}.{}", now_millis(), ext));
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), "wrote image file");
        Ok(Some(path))
    }

    /// Create `path` (and parents) if missing
    pub fn ensure_directory(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(path.to_path_buf())
    }

    /// Directory for plugin-private data
    pub fn plugin_data_path(&self) -> &Path {
        &self.data_dir
    }

    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }
}

/// Split `data:image/<ext>;base64,<payload>` into `(ext, payload)`
///
/// The prefix is matched case-insensitively; `ext` is 1-20 ASCII letters.
fn parse_image_data_url(data_url: &str) -> Option<(String, &str)> {
    const PREFIX: &str = "data:image/";
    const MARKER: &str = ";base64,";

    let head = data_url.get(..PREFIX.len())?;
    if !head.eq_ignore_ascii_case(PREFIX) {
        return None;
    }

    let rest = &data_url[PREFIX.len()..];
    let ext_len = rest.find(';')?;
    let ext = &rest[..ext_len];
    if ext.is_empty() || ext.len() > 20 || !ext.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let marker = rest.get(ext_len..ext_len + MARKER.len())?;
    if !marker.eq_ignore_ascii_case(MARKER) {
        return None;
    }

    Some((ext.to_string(), &rest[ext_len + MARKER.len()..]))
}

fn sanitize_file_name(name: &str) -> Result<String> {
    let name = name.trim();
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\');
    if !is_plain {
        return Err(PromptBoxError::InvalidArgs {
            command: "write_text_file".into(),
            reason:  format!("invalid file name: {:?}", name),
        });
    }
    Ok(name.to_string())
}
