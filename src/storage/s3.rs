use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use super::{ObjectStore, PutObject};
use crate::error::EtlError;

/// Writes objects with S3 `PutObject`.
#[derive(Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient AWS configuration (env vars,
    /// instance or execution role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, object: PutObject) -> Result<(), EtlError> {
        self.client
            .put_object()
            .bucket(&object.target.bucket)
            .key(&object.target.key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type)
            .content_encoding(object.content_encoding)
            .send()
            .await
            .map_err(|e| EtlError::Storage {
                bucket: object.target.bucket.clone(),
                key: object.target.key.clone(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}
