//! Drives a run: every dataset is fetched, renamed and uploaded in order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{Instrument, info};

use crate::census::CensusClient;
use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::fetch::HttpClient;
use crate::storage::{ObjectStore, store};

/// Outcome of one uploaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub name: String,
    pub bucket: String,
    pub key: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub completed_at: DateTime<Utc>,
    pub years: Vec<String>,
    pub datasets: Vec<DatasetReport>,
}

/// Fixed-shape response handed back to the invoker.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResult {
    pub fn success(report: &RunReport) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code: 200,
            body: serde_json::to_string(report)?,
        })
    }
}

pub struct Pipeline<C, S> {
    census: CensusClient<C>,
    store: S,
    years: Vec<String>,
    datasets: Vec<Dataset>,
}

impl<C: HttpClient, S: ObjectStore> Pipeline<C, S> {
    pub fn new(
        census: CensusClient<C>,
        store: S,
        years: Vec<String>,
        datasets: Vec<Dataset>,
    ) -> Self {
        Self {
            census,
            store,
            years,
            datasets,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs every dataset in order. The first failure aborts the run;
    /// objects written before it stay in place.
    pub async fn run(&self) -> Result<RunReport, EtlError> {
        info!(
            datasets = self.datasets.len(),
            years = ?self.years,
            "Starting ETL run"
        );

        let mut reports = Vec::with_capacity(self.datasets.len());
        for dataset in &self.datasets {
            let span = tracing::info_span!("dataset", name = %dataset.name);
            reports.push(self.run_dataset(dataset).instrument(span).await?);
        }

        info!(datasets = reports.len(), "ETL run finished");
        Ok(RunReport {
            completed_at: Utc::now(),
            years: self.years.clone(),
            datasets: reports,
        })
    }

    async fn run_dataset(&self, dataset: &Dataset) -> Result<DatasetReport, EtlError> {
        let table = self
            .census
            .fetch(&dataset.columns, &self.years)
            .await?
            .rename(&dataset.rename);

        store(&self.store, &table, &dataset.target).await?;

        Ok(DatasetReport {
            name: dataset.name.clone(),
            bucket: dataset.target.bucket.clone(),
            key: dataset.target.key.clone(),
            rows: table.len(),
            columns: table.columns().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_result_shape() {
        let report = RunReport {
            completed_at: Utc::now(),
            years: vec!["2017".into()],
            datasets: vec![],
        };

        let result = InvocationResult::success(&report).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["statusCode"], 200);
        let body: serde_json::Value = serde_json::from_str(json["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["years"][0], "2017");
    }
}
