// Entry point - populate mock telemetry and read it back through the manager
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use telemetry_db::{Asset, InfluxTransport, Sample, TelemetryManager, load_influx_settings};

/// One sample per second over the given window, ending now.
fn generate_samples(duration_seconds: i64) -> Vec<Sample> {
    let now = Utc::now();
    let mut rng = rand::thread_rng();

    (0..duration_seconds)
        .map(|i| {
            Sample::new(
                now - Duration::seconds(duration_seconds - i),
                rng.gen_range(0.0..100.0),
            )
        })
        .collect()
}

fn report_asset(asset: &Asset) {
    tracing::info!("asset {} ({} channels)", asset.name, asset.channels.len());
    for (name, channel) in &asset.channels {
        tracing::info!("  channel {}: {} samples", name, channel.samples.len());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // A missing INFLUXDB_* variable aborts startup here with a non-zero exit.
    let settings = load_influx_settings()?;
    let bucket = settings.bucket.clone();
    let manager = TelemetryManager::new(Arc::new(InfluxTransport::new(settings)), bucket);

    let mut channels = BTreeMap::new();
    channels.insert("vmet".to_string(), generate_samples(60));
    channels.insert("vlox".to_string(), generate_samples(60));
    channels.insert("pcc".to_string(), generate_samples(60));

    let asset = manager.create_asset("MLOX_3", channels).await?;
    tracing::info!(
        "created asset {} with channels: {:?}",
        asset.name,
        asset.channels.keys().collect::<Vec<_>>()
    );

    if let Some(channel) = manager
        .create_channel("MLOX_3", "tank_pressure", generate_samples(2))
        .await?
    {
        tracing::info!(
            "created channel {} with {} samples",
            channel.name,
            channel.samples.len()
        );
    }

    let stop = Utc::now();

    tracing::info!("all data, no filters");
    report_asset(&manager.query_asset("MLOX_3", None, None, None).await?);

    tracing::info!("single channel, all time");
    report_asset(
        &manager
            .query_asset("MLOX_3", Some(vec!["pcc".to_string()]), None, None)
            .await?,
    );

    tracing::info!("two channels, last minute");
    report_asset(
        &manager
            .query_asset(
                "MLOX_3",
                Some(vec!["vlox".to_string(), "vmet".to_string()]),
                Some(stop - Duration::minutes(1)),
                Some(stop),
            )
            .await?,
    );

    tracing::info!(
        "asset MLOX_3 exists: {}",
        manager.asset_exists("MLOX_3").await?
    );

    Ok(())
}
