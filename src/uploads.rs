use actix_files::Files;
use actix_multipart::form::tempfile::TempFile;
use actix_web::web;
use chrono::Utc;
use rand::Rng;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::error::ServiceError;

/// URL prefix the uploads directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Directory of user-uploaded files (job images, provider documents)
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Static file service for the store, mounted at [`PUBLIC_PREFIX`].
    pub fn files_service(&self) -> Files {
        Files::new(PUBLIC_PREFIX, &self.dir)
    }

    /// Copy an uploaded file into the store.
    /// Returns its public path, or `None` for an empty file field.
    pub async fn save(&self, file: TempFile) -> Result<Option<String>, ServiceError> {
        if file.size == 0 {
            return Ok(None);
        }

        let original = file
            .file_name
            .as_deref()
            .map(sanitize_file_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let file_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            rand::thread_rng().gen_range(1000..=9999),
            original
        );
        let destination = self.dir.join(&file_name);

        web::block(move || std::fs::copy(file.file.path(), destination))
            .await
            .map_err(|e| ServiceError::UploadError(e.to_string()))?
            .map_err(|e| ServiceError::UploadError(e.to_string()))?;

        info!("Stored upload {}", file_name);
        Ok(Some(format!("{}/{}", PUBLIC_PREFIX, file_name)))
    }

    /// Remove a file previously returned by [`UploadStore::save`].
    /// Paths outside the store are ignored; failures are only logged.
    pub async fn discard(&self, public_path: &str) {
        let Some(path) = self.local_path(public_path) else {
            warn!("Refusing to discard {:?}: not a stored upload", public_path);
            return;
        };
        match web::block(move || std::fs::remove_file(path)).await {
            Ok(Ok(())) => info!("Discarded upload {}", public_path),
            Ok(Err(e)) => warn!("Could not discard upload {}: {}", public_path, e),
            Err(e) => warn!("Could not discard upload {}: {}", public_path, e),
        }
    }

    fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        (!name.is_empty() && sanitize_file_name(name) == name).then(|| self.dir.join(name))
    }
}

/// Keep a client file name safe to join onto the uploads directory.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
