use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::{ApiError, Result};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Bytes sent so far out of the file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round().min(100.0) as u8
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// File contents ready to be sent as the `file` part of a multipart form
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path, content_type: impl Into<String>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::Setup {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub(crate) fn form(file: UploadFile, metadata: Option<&Value>, on_progress: Option<ProgressCallback>) -> Result<Form> {
    let total = file.len();
    let UploadFile {
        file_name,
        content_type,
        bytes,
    } = file;

    let body = async_stream::stream! {
        let mut loaded = 0u64;
        for chunk in bytes.chunks(UPLOAD_CHUNK_SIZE) {
            loaded += chunk.len() as u64;
            yield Ok::<Vec<u8>, std::io::Error>(chunk.to_vec());
            if let Some(callback) = &on_progress {
                callback(UploadProgress { loaded, total });
            }
        }
    };

    let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
        .file_name(file_name)
        .mime_str(&content_type)
        .map_err(|e| ApiError::Setup {
            message: format!("Invalid content type '{}': {}", content_type, e),
        })?;

    let mut form = Form::new().part("file", part);
    if let Some(metadata) = metadata {
        form = form.text("metadata", metadata.to_string());
    }
    Ok(form)
}
