use std::path::Path;

use bytes::Bytes;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Upload size ceiling: 5 MiB.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Fallback name sent to the search endpoint when the file has none.
pub const DEFAULT_FILENAME: &str = "uploaded_cv.pdf";

/// A CV picked for upload, held in memory until the wizard is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Reads a file from disk, deriving the MIME type from its extension.
    /// Files that [`validate_file`] would reject come back with their real
    /// size and no contents, without being read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let size = tokio::fs::metadata(path).await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let known = mime_for_path(path);
        let mime = known.unwrap_or("application/octet-stream");
        if known.is_none() || size > MAX_FILE_SIZE {
            return Ok(Self {
                name,
                mime_type: mime.to_string(),
                size,
                bytes: Bytes::new(),
            });
        }
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(name, mime, Bytes::from(bytes)))
    }

    pub fn search_filename(&self) -> &str {
        if self.name.trim().is_empty() {
            DEFAULT_FILENAME
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("File must be a PDF or DOCX")]
    UnsupportedType,
    #[error("File must be smaller than 5MB")]
    TooLarge,
}

/// Type is checked before size, so a large unsupported file reports its type.
pub fn validate_file(file: &SelectedFile) -> Result<(), FileRejection> {
    if file.mime_type != PDF_MIME && file.mime_type != DOCX_MIME {
        return Err(FileRejection::UnsupportedType);
    }
    if file.size > MAX_FILE_SIZE {
        return Err(FileRejection::TooLarge);
    }
    Ok(())
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF_MIME),
        "docx" => Some(DOCX_MIME),
        _ => None,
    }
}
