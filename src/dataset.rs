//! The ACS datasets published by a run.

use serde::Serialize;

use crate::storage::StorageTarget;
use crate::table::RenameMap;

/// Geography id column returned by `for=state:*` queries.
const STATE_FIELD: &str = "state";

/// One fetch → rename → upload unit.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    /// Comma-joined Census variable ids sent as `get=`.
    pub columns: String,
    pub rename: RenameMap,
    pub target: StorageTarget,
}

impl Dataset {
    fn acs(name: &str, variable: &str, label: &str, bucket: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: variable.to_string(),
            rename: RenameMap::new([(variable, label), (STATE_FIELD, "state_id")]),
            target: StorageTarget::new(bucket, key),
        }
    }
}

/// State names, median household income (`DP03_0062E`) and the share of
/// adults with a bachelor's degree or higher (`DP02_0067PE`), in upload order.
pub fn default_datasets(bucket: &str) -> Vec<Dataset> {
    vec![
        Dataset::acs(
            "states",
            "NAME",
            "state",
            bucket,
            "states/census_acs5_states.csv",
        ),
        Dataset::acs(
            "median-household-incomes",
            "DP03_0062E",
            "median_household_income",
            bucket,
            "median-household-incomes/census_acs5_median_household_incomes.csv",
        ),
        Dataset::acs(
            "graduation-rates",
            "DP02_0067PE",
            "graduation_rate",
            bucket,
            "graduation-rates/census_acs5_graduation_rates.csv",
        ),
    ]
}

/// Printable view of a [`Dataset`] for `census_etl datasets`.
#[derive(Debug, Serialize)]
pub struct DatasetSummary<'a> {
    pub name: &'a str,
    pub columns: &'a str,
    pub rename: Vec<(&'a str, &'a str)>,
    pub bucket: &'a str,
    pub key: &'a str,
}

impl<'a> From<&'a Dataset> for DatasetSummary<'a> {
    fn from(d: &'a Dataset) -> Self {
        Self {
            name: &d.name,
            columns: &d.columns,
            rename: d.rename.iter().collect(),
            bucket: &d.target.bucket,
            key: &d.target.key,
        }
    }
}
