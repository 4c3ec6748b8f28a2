use std::fmt;
use std::path::Path;

use image::ImageFormat;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A user-selected blob waiting to be admitted into (or already part of) the staged set
#[derive(Clone, PartialEq, Eq)]
pub struct StagedFile {
    filename: String,
    mime_type: String,
    size: u64,
    bytes: Vec<u8>,
}

impl StagedFile {
    /// Wrap an in-memory blob. The declared size is the blob length.
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Override the declared size, as reported by a browser `File` or a directory listing
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Read a file from disk. The MIME type is sniffed from the content first and
    /// from the extension second; anything unrecognised is declared as octet-stream.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        let mime_type = image::guess_format(&bytes)
            .or_else(|_| ImageFormat::from_path(path))
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_MIME);

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::debug!("Read {} ({}, {} bytes)", filename, mime_type, bytes.len());

        Ok(Self::new(filename, mime_type, bytes))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

// Blobs can be megabytes; keep them out of debug output.
impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
