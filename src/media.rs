//! Object storage port for uploaded images
//!
//! Accepts a binary payload and hands back a durable URL path. The local-disk
//! adapter mirrors the upload layout of the deployed site: blog images and
//! testimonial avatars side by side under one uploads root.

use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::AppError;

/// Only these image types are accepted, at most this many bytes
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// An image payload extracted from a multipart form
pub struct ImageUpload {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store a validated image and return its public URL path
    async fn save_image(
        &self,
        prefix: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError>;

    /// Remove a previously stored asset by its public URL path
    async fn delete(&self, url_path: &str) -> Result<(), AppError>;
}

fn extension_for(content_type: &str) -> Result<&'static str, AppError> {
    match content_type {
        "image/png" => Ok("png"),
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        other => Err(AppError::Validation(format!(
            "only .png, .jpg and .jpeg format allowed, got {}",
            other
        ))),
    }
}

/// Local filesystem adapter serving files under a public prefix
pub struct LocalMediaStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    fn path_for(&self, url_path: &str) -> Option<PathBuf> {
        let relative = url_path.strip_prefix(&self.public_prefix)?;
        let relative = relative.trim_start_matches('/');
        // no traversal out of the uploads root
        if Path::new(relative)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save_image(
        &self,
        prefix: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::Validation("image is required".into()));
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(format!(
                "image exceeds {} byte limit",
                MAX_IMAGE_BYTES
            )));
        }
        let ext = extension_for(content_type)?;

        let millis = chrono::Utc::now().timestamp_millis();
        let nonce: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let filename = format!("{}-{}-{}.{}", prefix, millis, nonce, ext);

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(&filename);
        tokio::fs::write(&path, data).await?;
        debug!("stored image: {}", path.display());

        Ok(format!(
            "{}/{}",
            self.public_prefix.trim_end_matches('/'),
            filename
        ))
    }

    async fn delete(&self, url_path: &str) -> Result<(), AppError> {
        let Some(path) = self.path_for(url_path) else {
            return Err(AppError::Validation(format!(
                "asset path outside uploads root: {}",
                url_path
            )));
        };
        tokio::fs::remove_file(&path).await?;
        debug!("deleted image: {}", path.display());
        Ok(())
    }
}
