use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use census_etl::EtlError;
use census_etl::census::CensusClient;
use census_etl::config::CensusApiConfig;
use census_etl::dataset::default_datasets;
use census_etl::fetch::HttpClient;
use census_etl::pipeline::Pipeline;
use census_etl::storage::{MemoryStore, ObjectStore, PutObject, StorageTarget};
use census_etl::table::Table;

/// Serves canned Census responses keyed by `(year, get)`.
#[derive(Default)]
struct StubCensus {
    responses: HashMap<(String, String), (u16, String)>,
    requests: Arc<Mutex<Vec<reqwest::Url>>>,
}

impl StubCensus {
    fn with(mut self, year: &str, get: &str, status: u16, body: &str) -> Self {
        self.responses
            .insert((year.to_string(), get.to_string()), (status, body.to_string()));
        self
    }

    /// Shared handle on the request log, usable after the stub is moved.
    fn request_log(&self) -> Arc<Mutex<Vec<reqwest::Url>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl HttpClient for StubCensus {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let url = req.url().clone();
        self.requests.lock().unwrap().push(url.clone());

        let year = url.path_segments().unwrap().nth(1).unwrap().to_string();
        let get = url
            .query_pairs()
            .find(|(k, _)| k == "get")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        let (status, body) = self
            .responses
            .get(&(year, get))
            .cloned()
            .unwrap_or((404, "unknown".to_string()));

        Ok(http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into())
    }
}

/// Rejects writes to one key, accepts everything else into memory.
struct RejectKey {
    inner: MemoryStore,
    rejected: String,
}

#[async_trait]
impl ObjectStore for RejectKey {
    async fn put_object(&self, object: PutObject) -> Result<(), EtlError> {
        if object.target.key == self.rejected {
            return Err(EtlError::Storage {
                bucket: object.target.bucket,
                key: object.target.key,
                reason: "AccessDenied".to_string(),
            });
        }
        self.inner.put_object(object).await
    }
}

fn api_config() -> CensusApiConfig {
    CensusApiConfig {
        base_url: "https://api.census.test/data".to_string(),
        dataset: "acs/acs5/profile".to_string(),
        geography: "state:*".to_string(),
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(1),
        connect_timeout: Duration::from_secs(1),
    }
}

fn years() -> Vec<String> {
    vec!["2017".to_string(), "2018".to_string()]
}

fn full_stub() -> StubCensus {
    let mut stub = StubCensus::default();
    for (year, income, grads) in [("2017", "48123", "24.5"), ("2018", "49861", "25.0")] {
        stub = stub
            .with(year, "NAME", 200, r#"[["NAME","state"],["Alabama","01"]]"#)
            .with(
                year,
                "DP03_0062E",
                200,
                &format!(r#"[["DP03_0062E","state"],["{income}","01"]]"#),
            )
            .with(
                year,
                "DP02_0067PE",
                200,
                &format!(r#"[["DP02_0067PE","state"],["{grads}","01"]]"#),
            );
    }
    stub
}

fn body_of(store: &MemoryStore, key: &str) -> String {
    let object = store
        .get(&StorageTarget::new("bucket", key))
        .unwrap_or_else(|| panic!("{key} was not stored"));
    String::from_utf8(object.body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_full_run_publishes_three_csvs() {
    let census = CensusClient::new(full_stub(), &api_config());
    let pipeline = Pipeline::new(census, MemoryStore::new(), years(), default_datasets("bucket"));

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.datasets.len(), 3);
    assert!(report.datasets.iter().all(|d| d.rows == 2));

    let store = pipeline.store();
    assert_eq!(store.len(), 3);
    assert_eq!(
        body_of(store, "states/census_acs5_states.csv"),
        "state,state_id,year\r\nAlabama,01,2017\r\nAlabama,01,2018\r\n"
    );
    assert_eq!(
        body_of(
            store,
            "median-household-incomes/census_acs5_median_household_incomes.csv"
        ),
        "median_household_income,state_id,year\r\n48123,01,2017\r\n49861,01,2018\r\n"
    );
    assert_eq!(
        body_of(store, "graduation-rates/census_acs5_graduation_rates.csv"),
        "graduation_rate,state_id,year\r\n24.5,01,2017\r\n25.0,01,2018\r\n"
    );

    let object = store
        .get(&StorageTarget::new("bucket", "states/census_acs5_states.csv"))
        .unwrap();
    assert_eq!(object.content_type, "text/csv");
    assert_eq!(object.content_encoding, "UTF-8");
}

#[tokio::test]
async fn test_stored_csv_parses_back_to_renamed_table() {
    let census = CensusClient::new(full_stub(), &api_config());
    let pipeline = Pipeline::new(census, MemoryStore::new(), years(), default_datasets("bucket"));
    pipeline.run().await.unwrap();

    let object = pipeline
        .store()
        .get(&StorageTarget::new("bucket", "states/census_acs5_states.csv"))
        .unwrap();
    let table = Table::from_csv(&object.body).unwrap();

    assert_eq!(table.columns(), &["state", "state_id", "year"]);
    assert_eq!(table.column("year").unwrap(), vec!["2017", "2018"]);
}

#[tokio::test]
async fn test_upstream_failure_keeps_earlier_objects() {
    let stub = full_stub().with("2018", "DP03_0062E", 500, "server error");
    let census = CensusClient::new(stub, &api_config());
    let pipeline = Pipeline::new(census, MemoryStore::new(), years(), default_datasets("bucket"));

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, EtlError::Upstream { .. }));

    let stored = pipeline.store().targets();
    assert_eq!(
        stored,
        vec![StorageTarget::new("bucket", "states/census_acs5_states.csv")]
    );
}

#[tokio::test]
async fn test_storage_failure_aborts_remaining_datasets() {
    let store = RejectKey {
        inner: MemoryStore::new(),
        rejected: "median-household-incomes/census_acs5_median_household_incomes.csv".to_string(),
    };
    let census = CensusClient::new(full_stub(), &api_config());
    let pipeline = Pipeline::new(census, store, years(), default_datasets("bucket"));

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, EtlError::Storage { .. }));

    assert_eq!(
        pipeline.store().inner.targets(),
        vec![StorageTarget::new("bucket", "states/census_acs5_states.csv")]
    );
}

#[tokio::test]
async fn test_no_years_fails_with_empty_input() {
    let census = CensusClient::new(full_stub(), &api_config());
    let pipeline = Pipeline::new(census, MemoryStore::new(), vec![], default_datasets("bucket"));

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, EtlError::EmptyInput));
    assert!(pipeline.store().is_empty());
}

#[tokio::test]
async fn test_request_count_is_datasets_times_years() {
    let stub = full_stub();
    let log = stub.request_log();
    let census = CensusClient::new(stub, &api_config());
    let pipeline = Pipeline::new(census, MemoryStore::new(), years(), default_datasets("bucket"));

    pipeline.run().await.unwrap();

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 6);
    let order: Vec<(String, String)> = requests
        .iter()
        .map(|u| {
            let year = u.path_segments().unwrap().nth(1).unwrap().to_string();
            let get = u.query_pairs().find(|(k, _)| k == "get").unwrap().1.into_owned();
            (get, year)
        })
        .collect();
    assert_eq!(order[0], ("NAME".to_string(), "2017".to_string()));
    assert_eq!(order[1], ("NAME".to_string(), "2018".to_string()));
    assert_eq!(order[5], ("DP02_0067PE".to_string(), "2018".to_string()));
    assert!(requests
        .iter()
        .all(|u| u.query_pairs().any(|(k, v)| k == "key" && v == "test-key")));
}

#[tokio::test]
async fn test_storage_failure_stops_before_later_fetches() {
    let stub = full_stub();
    let log = stub.request_log();
    let store = RejectKey {
        inner: MemoryStore::new(),
        rejected: "states/census_acs5_states.csv".to_string(),
    };
    let pipeline = Pipeline::new(
        CensusClient::new(stub, &api_config()),
        store,
        years(),
        default_datasets("bucket"),
    );

    assert!(pipeline.run().await.is_err());
    assert_eq!(log.lock().unwrap().len(), 2);
    assert!(pipeline.store().inner.is_empty());
}
