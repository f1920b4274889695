// Telemetry manager facade - create and query assets and channels
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::aggregate::group_by_channel;
use crate::application::flux::{AssetQuery, existence_query};
use crate::application::transport::{Point, TelemetryTransport};
use crate::domain::asset::{Asset, Channel};
use crate::domain::sample::Sample;
use crate::error::{Result, TelemetryError};

/// Facade over the store transport. Every operation issues exactly one write
/// or one query call; create operations write unconditionally and never read
/// first. Callers wanting conflict guarantees can probe with
/// [`TelemetryManager::asset_exists`] beforehand.
#[derive(Clone)]
pub struct TelemetryManager {
    transport: Arc<dyn TelemetryTransport>,
    bucket: String,
}

impl TelemetryManager {
    pub fn new(transport: Arc<dyn TelemetryTransport>, bucket: impl Into<String>) -> Self {
        Self {
            transport,
            bucket: bucket.into(),
        }
    }

    /// Create an asset with one or more channels and write the initial
    /// samples to the store in a single batched call. The returned asset
    /// mirrors the input; it is not re-fetched.
    pub async fn create_asset(
        &self,
        asset_name: &str,
        initial_channels: BTreeMap<String, Vec<Sample>>,
    ) -> Result<Asset> {
        if asset_name.is_empty() {
            return Err(TelemetryError::Validation(
                "asset_name is required".to_string(),
            ));
        }
        if initial_channels.is_empty() {
            return Err(TelemetryError::Validation(
                "an asset must have at least one channel with samples".to_string(),
            ));
        }

        let mut channels = BTreeMap::new();
        let mut all_points = Vec::new();

        for (channel_name, samples) in initial_channels {
            let channel = Channel::new(channel_name, samples)?;
            all_points.extend(points_for(asset_name, &channel));
            channels.insert(channel.name.clone(), channel);
        }

        self.transport.write_points(&all_points).await?;

        Asset::new(asset_name, channels)
    }

    /// Write a channel's samples under an existing asset's measurement.
    /// With no samples there is nothing to write and no channel is created;
    /// the operation returns `Ok(None)` without touching the store.
    pub async fn create_channel(
        &self,
        asset_name: &str,
        channel_name: &str,
        samples: Vec<Sample>,
    ) -> Result<Option<Channel>> {
        if asset_name.is_empty() {
            return Err(TelemetryError::Validation(
                "asset_name is required".to_string(),
            ));
        }
        if samples.is_empty() {
            return Ok(None);
        }

        let channel = Channel::new(channel_name, samples)?;
        self.transport
            .write_points(&points_for(asset_name, &channel))
            .await?;

        Ok(Some(channel))
    }

    /// Query an asset's channel data within a time range, optionally
    /// restricted to a channel set. An asset with no matching records comes
    /// back with an empty channel map.
    pub async fn query_asset(
        &self,
        asset_name: &str,
        channel_names: Option<Vec<String>>,
        start: Option<DateTime<Utc>>,
        stop: Option<DateTime<Utc>>,
    ) -> Result<Asset> {
        if asset_name.is_empty() {
            return Err(TelemetryError::Validation(
                "asset_name is required".to_string(),
            ));
        }

        let query = AssetQuery {
            asset_name: asset_name.to_string(),
            channel_names,
            start,
            stop,
        };
        let flux = query.to_flux(&self.bucket);
        tracing::debug!(asset_name, "executing asset range query");

        let records = self.transport.query_records(&flux).await?;

        let mut channels = BTreeMap::new();
        for (name, samples) in group_by_channel(records) {
            let channel = Channel::new(name, samples)?;
            channels.insert(channel.name.clone(), channel);
        }

        Asset::new(asset_name, channels)
    }

    /// Whether any point has been written under this asset's measurement.
    pub async fn asset_exists(&self, asset_name: &str) -> Result<bool> {
        if asset_name.is_empty() {
            return Err(TelemetryError::Validation(
                "asset_name is required".to_string(),
            ));
        }

        let flux = existence_query(&self.bucket, asset_name);
        let records = self.transport.query_records(&flux).await?;
        Ok(!records.is_empty())
    }
}

/// One point per sample, tagged with the channel name under the asset's
/// measurement.
fn points_for(asset_name: &str, channel: &Channel) -> Vec<Point> {
    channel
        .samples
        .iter()
        .map(|sample| Point {
            measurement: asset_name.to_string(),
            channel: channel.name.clone(),
            timestamp: sample.timestamp,
            value: sample.value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::Record;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// In-memory stand-in for the store: remembers written batches and
    /// serves canned records for queries.
    #[derive(Default)]
    struct FakeTransport {
        batches: Mutex<Vec<Vec<Point>>>,
        records: Mutex<Vec<Record>>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn with_records(records: Vec<Record>) -> Self {
            Self {
                records: Mutex::new(records),
                ..Self::default()
            }
        }

        fn record_for(point: &Point) -> Record {
            Record {
                channel: Some(point.channel.clone()),
                timestamp: point.timestamp,
                value: point.value,
            }
        }
    }

    #[async_trait::async_trait]
    impl TelemetryTransport for FakeTransport {
        async fn write_points(&self, points: &[Point]) -> Result<()> {
            self.batches.lock().unwrap().push(points.to_vec());
            Ok(())
        }

        async fn query_records(&self, flux: &str) -> Result<Vec<Record>> {
            self.queries.lock().unwrap().push(flux.to_string());
            Ok(self.records.lock().unwrap().clone())
        }
    }

    fn manager(transport: Arc<FakeTransport>) -> TelemetryManager {
        TelemetryManager::new(transport, "telemetry")
    }

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, secs).unwrap()
    }

    #[tokio::test]
    async fn test_create_asset_batches_one_point_per_sample() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(transport.clone());

        let mut initial = BTreeMap::new();
        initial.insert(
            "vlox".to_string(),
            vec![Sample::new(ts(1), 1.0), Sample::new(ts(2), 2.0)],
        );
        initial.insert("vmet".to_string(), vec![Sample::new(ts(3), 3.0)]);

        let asset = manager.create_asset("MLOX_3", initial).await.unwrap();
        assert_eq!(asset.name, "MLOX_3");
        assert_eq!(asset.channels.len(), 2);

        let batches = transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 1, "all channels go out in one write");
        assert_eq!(batches[0].len(), 3);
        assert!(
            batches[0]
                .iter()
                .all(|p| p.measurement == "MLOX_3" && !p.channel.is_empty())
        );
    }

    #[tokio::test]
    async fn test_create_asset_rejects_empty_channel_map() {
        let manager = manager(Arc::new(FakeTransport::default()));
        let err = manager.create_asset("MLOX_3", BTreeMap::new()).await;
        assert!(matches!(err, Err(TelemetryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_asset_rejects_channel_without_samples() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(transport.clone());

        let mut initial = BTreeMap::new();
        initial.insert("x".to_string(), Vec::new());

        let err = manager.create_asset("MLOX_3", initial).await;
        assert!(matches!(err, Err(TelemetryError::Validation(_))));
        assert!(transport.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_channel_without_samples_writes_nothing() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(transport.clone());

        let created = manager
            .create_channel("MLOX_3", "tank_pressure", Vec::new())
            .await
            .unwrap();

        assert!(created.is_none());
        assert!(transport.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_channel_writes_tagged_points() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(transport.clone());

        let channel = manager
            .create_channel("MLOX_3", "pcc", vec![Sample::new(ts(1), 7.5)])
            .await
            .unwrap()
            .expect("channel should be created");

        assert_eq!(channel.name, "pcc");
        let batches = transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].channel, "pcc");
        assert_eq!(batches[0][0].measurement, "MLOX_3");
    }

    #[tokio::test]
    async fn test_query_asset_requires_name() {
        let manager = manager(Arc::new(FakeTransport::default()));
        let err = manager.query_asset("", None, None, None).await;
        assert!(matches!(err, Err(TelemetryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_query_asset_with_no_records_returns_empty_asset() {
        let manager = manager(Arc::new(FakeTransport::default()));
        let asset = manager.query_asset("MLOX_3", None, None, None).await.unwrap();
        assert_eq!(asset.name, "MLOX_3");
        assert!(asset.channels.is_empty());
    }

    #[tokio::test]
    async fn test_query_asset_passes_filters_into_flux() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(transport.clone());

        manager
            .query_asset(
                "MLOX_3",
                Some(vec!["a".to_string(), "b".to_string()]),
                Some(ts(0)),
                Some(ts(30)),
            )
            .await
            .unwrap();

        let queries = transport.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("(r[\"channel\"] == \"a\" or r[\"channel\"] == \"b\")"));
        assert!(queries[0].contains("start: 2024-05-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_round_trip_preserves_samples_in_time_order() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(transport.clone());

        let samples = vec![Sample::new(ts(1), 1.0), Sample::new(ts(2), 2.0)];
        let mut initial = BTreeMap::new();
        initial.insert("c".to_string(), samples.clone());
        manager.create_asset("A", initial).await.unwrap();

        // Replay the written batch as store-sorted query records.
        let mut written: Vec<Point> = transport.batches.lock().unwrap()[0].clone();
        written.sort_by_key(|p| p.timestamp);
        *transport.records.lock().unwrap() =
            written.iter().map(FakeTransport::record_for).collect();

        let asset = manager.query_asset("A", None, None, None).await.unwrap();
        assert_eq!(asset.channels.len(), 1);
        assert_eq!(asset.channels["c"].samples, samples);
    }

    #[tokio::test]
    async fn test_asset_exists_reflects_probe_result() {
        let transport = Arc::new(FakeTransport::with_records(vec![Record {
            channel: Some("c".to_string()),
            timestamp: ts(1),
            value: 1.0,
        }]));
        let manager = manager(transport.clone());
        assert!(manager.asset_exists("MLOX_3").await.unwrap());

        transport.records.lock().unwrap().clear();
        assert!(!manager.asset_exists("MLOX_3").await.unwrap());
    }
}
