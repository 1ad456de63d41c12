pub mod census;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod table;

pub use error::EtlError;
