//! Run configuration, read once from the environment at start-up.

use std::time::Duration;

use crate::error::EtlError;

pub const DEFAULT_BASE_URL: &str = "https://api.census.gov/data";
pub const DEFAULT_DATASET: &str = "acs/acs5/profile";
pub const DEFAULT_GEOGRAPHY: &str = "state:*";
pub const DEFAULT_YEARS: &[&str] = &["2017", "2018"];
pub const DEFAULT_BUCKET: &str = "brandonltran-census-acs5-datasets";

/// Where and how to reach the Census API.
#[derive(Debug, Clone)]
pub struct CensusApiConfig {
    pub base_url: String,
    pub dataset: String,
    pub geography: String,
    pub api_key: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// Everything a run needs, resolved up front so the fetch and upload code
/// never reads the environment itself.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub api: CensusApiConfig,
    pub years: Vec<String>,
    pub bucket: String,
}

impl EtlConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, EtlError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, which returns the raw value for a
    /// variable name.
    ///
    /// `API_KEY` is required. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EtlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));

        let api_key = get("API_KEY").ok_or_else(|| EtlError::config("API_KEY", "must be set"))?;

        let years = match get("CENSUS_YEARS") {
            Some(raw) => parse_years(&raw)
                .map_err(|reason| EtlError::config("CENSUS_YEARS", reason))?,
            None => DEFAULT_YEARS.iter().map(|y| y.to_string()).collect(),
        };

        let api = CensusApiConfig {
            base_url: get("CENSUS_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            dataset: get("CENSUS_DATASET").unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            geography: get("CENSUS_GEOGRAPHY").unwrap_or_else(|| DEFAULT_GEOGRAPHY.to_string()),
            api_key,
            timeout: secs(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", 30)?,
            connect_timeout: secs(
                get("HTTP_CONNECT_TIMEOUT_SECS"),
                "HTTP_CONNECT_TIMEOUT_SECS",
                10,
            )?,
        };

        Ok(Self {
            api,
            years,
            bucket: bucket_from_lookup(&lookup),
        })
    }

    /// Replaces the year list with values given on the command line.
    ///
    /// Entries are trimmed and blanks dropped, as for `CENSUS_YEARS`; a list
    /// with no years left is a configuration error.
    pub fn override_years(&mut self, years: &[String]) -> Result<(), EtlError> {
        self.years =
            parse_years(&years.join(",")).map_err(|reason| EtlError::config("--years", reason))?;
        Ok(())
    }
}

/// `CENSUS_BUCKET` from the process environment, or the default bucket.
pub fn bucket_from_env() -> String {
    bucket_from_lookup(|key| std::env::var(key).ok())
}

/// `CENSUS_BUCKET` resolved through `lookup`; blank counts as unset.
pub fn bucket_from_lookup<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup("CENSUS_BUCKET")).unwrap_or_else(|| DEFAULT_BUCKET.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-separated year list, dropping blank entries.
pub fn parse_years(raw: &str) -> Result<Vec<String>, String> {
    let years: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .map(str::to_string)
        .collect();

    if years.is_empty() {
        return Err("at least one year is required".to_string());
    }
    Ok(years)
}

fn secs(raw: Option<String>, key: &str, default: u64) -> Result<Duration, EtlError> {
    match raw {
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| EtlError::config(key, format!("'{v}' is not a number of seconds: {e}"))),
        None => Ok(Duration::from_secs(default)),
    }
}
