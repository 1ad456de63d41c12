//! Object storage for the finished CSV files.
//!
//! [`ObjectStore`] is the async seam; [`S3Store`] is the production
//! implementation, [`LocalStore`] mirrors objects onto disk for dry runs
//! and [`MemoryStore`] keeps them in memory for tests.

mod local;
mod memory;
mod s3;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use bytes::Bytes;
use tracing::info;

use crate::error::EtlError;
use crate::table::Table;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const CSV_CONTENT_ENCODING: &str = "UTF-8";

/// Bucket and key an object is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    pub bucket: String,
    pub key: String,
}

impl StorageTarget {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// A single create-or-overwrite write.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub target: StorageTarget,
    pub body: Bytes,
    pub content_type: String,
    pub content_encoding: String,
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `object`, replacing anything already stored at its key.
    async fn put_object(&self, object: PutObject) -> Result<(), EtlError>;
}

/// Serializes `table` as CSV and overwrites `target` with it.
#[tracing::instrument(skip(store, table), fields(bucket = %target.bucket, key = %target.key))]
pub async fn store<S: ObjectStore + ?Sized>(
    store: &S,
    table: &Table,
    target: &StorageTarget,
) -> Result<(), EtlError> {
    let body = Bytes::from(table.to_csv()?);
    let size = body.len();

    store
        .put_object(PutObject {
            target: target.clone(),
            body,
            content_type: CSV_CONTENT_TYPE.to_string(),
            content_encoding: CSV_CONTENT_ENCODING.to_string(),
        })
        .await?;

    info!(rows = table.len(), bytes = size, "Object stored");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RenameMap;

    fn alabama() -> Table {
        let header = vec!["NAME".to_string(), "state".to_string()];
        let years = ["2017", "2018"].map(|y| {
            Table::new(header.clone(), vec![vec!["Alabama".to_string(), "01".to_string()]])
                .unwrap()
                .with_constant_column("year", y)
        });
        Table::concat(years.into())
            .unwrap()
            .rename(&RenameMap::new([("NAME", "state"), ("state", "state_id")]))
    }

    #[tokio::test]
    async fn test_store_writes_csv_with_headers() {
        let memory = MemoryStore::new();
        let target = StorageTarget::new("bucket", "states/census_acs5_states.csv");

        store(&memory, &alabama(), &target).await.unwrap();

        let object = memory.get(&target).unwrap();
        assert_eq!(object.content_type, "text/csv");
        assert_eq!(object.content_encoding, "UTF-8");
        assert_eq!(
            std::str::from_utf8(&object.body).unwrap(),
            "state,state_id,year\r\nAlabama,01,2017\r\nAlabama,01,2018\r\n"
        );
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let memory = MemoryStore::new();
        let target = StorageTarget::new("bucket", "states/s.csv");

        store(&memory, &alabama(), &target).await.unwrap();
        let smaller = Table::new(vec!["state".to_string()], vec![]).unwrap();
        store(&memory, &smaller, &target).await.unwrap();

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.get(&target).unwrap().body.as_ref(), b"state\r\n");
    }
}
