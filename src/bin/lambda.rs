//! AWS Lambda entry point. The trigger payload is ignored; each invocation
//! reads its configuration, runs every dataset and returns
//! `{"statusCode": 200, "body": ...}`.

use census_etl::census::CensusClient;
use census_etl::config::EtlConfig;
use census_etl::dataset::default_datasets;
use census_etl::fetch::BasicClient;
use census_etl::pipeline::{InvocationResult, Pipeline};
use census_etl::storage::S3Store;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    census_etl::logging::init_lambda();

    let store = S3Store::from_env().await;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let store = store.clone();
        async move { handler(store, event).await }
    }))
    .await
}

async fn handler(store: S3Store, _event: LambdaEvent<Value>) -> Result<InvocationResult, Error> {
    let config = EtlConfig::from_env()?;

    let http = BasicClient::new(config.api.timeout, config.api.connect_timeout)?;
    let census = CensusClient::new(http, &config.api);
    let pipeline = Pipeline::new(
        census,
        store,
        config.years.clone(),
        default_datasets(&config.bucket),
    );

    let report = pipeline.run().await?;
    Ok(InvocationResult::success(&report)?)
}
