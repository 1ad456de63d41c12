//! Census API fetcher: one request per year, each response reshaped into a
//! year-tagged [`Table`], all years stacked into one table.

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::CensusApiConfig;
use crate::error::EtlError;
use crate::fetch::auth::UrlParam;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::table::Table;

/// Label of the column appended to every per-year table.
pub const YEAR_COLUMN: &str = "year";

/// Query parameter the Census API expects the key in.
const KEY_PARAM: &str = "key";

pub struct CensusClient<C> {
    http: UrlParam<C>,
    base_url: String,
    dataset: String,
    geography: String,
}

impl<C: HttpClient> CensusClient<C> {
    pub fn new(inner: C, config: &CensusApiConfig) -> Self {
        Self {
            http: UrlParam::new(inner, KEY_PARAM, config.api_key.clone()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dataset: config.dataset.trim_matches('/').to_string(),
            geography: config.geography.clone(),
        }
    }

    /// Builds `{base}/{year}/{dataset}?get={columns}&for={geography}`.
    ///
    /// The API key is appended later by the [`UrlParam`] wrapper.
    pub fn request_url(&self, columns: &str, year: &str) -> Result<Url, EtlError> {
        let raw = format!("{}/{}/{}", self.base_url, year, self.dataset);
        let mut url = Url::parse(&raw)
            .map_err(|e| EtlError::config("CENSUS_API_BASE_URL", format!("'{raw}': {e}")))?;

        url.query_pairs_mut()
            .append_pair("get", columns)
            .append_pair("for", &self.geography);
        Ok(url)
    }

    /// Fetches `columns` for every year in `years` and stacks the results.
    ///
    /// Years are requested in order and duplicates are fetched again. An
    /// empty `years` fails with [`EtlError::EmptyInput`] without issuing any
    /// request.
    #[tracing::instrument(skip(self, years), fields(years = years.len()))]
    pub async fn fetch(&self, columns: &str, years: &[String]) -> Result<Table, EtlError> {
        if years.is_empty() {
            return Err(EtlError::EmptyInput);
        }

        let mut tables = Vec::with_capacity(years.len());
        for year in years {
            tables.push(self.fetch_year(columns, year).await?);
        }

        let combined = Table::concat(tables)?;
        info!(rows = combined.len(), "Combined yearly tables");
        Ok(combined)
    }

    /// Fetches one year and appends the year column.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_year(&self, columns: &str, year: &str) -> Result<Table, EtlError> {
        let url = self.request_url(columns, year)?;
        debug!(url = %url, "Requesting");

        let bytes = fetch_bytes(&self.http, &url).await?;

        let raw: Vec<Vec<Value>> = serde_json::from_slice(&bytes).map_err(|e| {
            EtlError::upstream(url.as_str(), format!("body is not an array of rows: {e}"))
        })?;

        let table = Table::from_json_rows(raw)
            .map_err(|reason| EtlError::upstream(url.as_str(), reason))?;
        info!(rows = table.len(), "Rows received");

        Ok(table.with_constant_column(YEAR_COLUMN, year))
    }
}
