//! Document upload endpoint.
//!
//! Uploaded files are stored as `<unix-millis>.pdf` in the upload directory, which is
//! also served under `/uploads`. Participants announce the returned URL over the relay.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::AppState;

/// Name of the multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Missing 'file' field")]
    MissingFile,

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::Multipart(e) => e.status(),
            UploadError::MissingFile => StatusCode::BAD_REQUEST,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Upload failed: {}", self);
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Reply to a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Stored file name.
    pub file: String,
    /// Path the file is served from.
    pub url: String,
}

/// `POST /api/file`
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        let file = store(&state.upload_dir, &data).await?;
        info!(
            "Stored upload {:?} as {} ({} bytes)",
            original.as_deref().unwrap_or("<unnamed>"),
            file,
            data.len()
        );
        return Ok(Json(UploadResponse {
            url: format!("/uploads/{}", file),
            file,
        }));
    }
    Err(UploadError::MissingFile)
}

/// Write `data` to a fresh `<unix-millis>.pdf` in `dir`, returning the file name.
///
/// Uploads landing in the same millisecond take the next free stamp.
async fn store(dir: &Path, data: &[u8]) -> std::io::Result<String> {
    tokio::fs::create_dir_all(dir).await?;
    let mut stamp = unix_millis();
    loop {
        let name = format!("{}.pdf", stamp);
        let opened = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&name))
            .await;
        match opened {
            Ok(mut file) => {
                file.write_all(data).await?;
                file.flush().await?;
                return Ok(name);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
            Err(e) => return Err(e),
        }
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = store(dir.path(), b"one").await.unwrap();
        let second = store(dir.path(), b"two").await.unwrap();
        assert_ne!(first, second);
        assert!(first.ends_with(".pdf"));
        assert_eq!(std::fs::read(dir.path().join(&first)).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join(&second)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let name = store(&nested, b"%PDF-1.4").await.unwrap();
        assert!(nested.join(name).exists());
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(UploadError::MissingFile.status(), StatusCode::BAD_REQUEST);
        let io = UploadError::from(std::io::Error::other("disk full"));
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
