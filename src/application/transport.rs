// Transport trait for the external time-series store
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One tagged, timestamped, single-field point bound for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub channel: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One flat result record returned by a range query. The channel tag may be
/// absent when the stored point carried none.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub channel: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// Submit a batch of points in a single write call.
    async fn write_points(&self, points: &[Point]) -> Result<()>;

    /// Execute a Flux expression and return the flat record stream, in the
    /// order the store produced it.
    async fn query_records(&self, flux: &str) -> Result<Vec<Record>>;
}
