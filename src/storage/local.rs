use std::path::PathBuf;

use tracing::debug;

use super::{ObjectStore, PutObject};
use crate::error::EtlError;

/// Mirrors objects onto disk as `<root>/<bucket>/<key>`.
///
/// Content type and encoding are not recorded.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path an object with `bucket` and `key` is written to.
    pub fn path_for(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.root.join(bucket);
        path.extend(key.split('/').filter(|s| !s.is_empty() && *s != ".."));
        path
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalStore {
    async fn put_object(&self, object: PutObject) -> Result<(), EtlError> {
        let path = self.path_for(&object.target.bucket, &object.target.key);
        debug!(path = %path.display(), "Writing local object");

        let storage_err = |e: std::io::Error| EtlError::Storage {
            bucket: object.target.bucket.clone(),
            key: object.target.key.clone(),
            reason: format!("{}: {e}", path.display()),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
        }
        tokio::fs::write(&path, &object.body)
            .await
            .map_err(storage_err)?;

        Ok(())
    }
}
