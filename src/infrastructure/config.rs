// Environment-based configuration for the InfluxDB connection
use serde::Deserialize;

/// Connection settings for the backing InfluxDB instance. All four values
/// are required; startup fails without them.
#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

/// Resolve settings from the INFLUXDB_URL, INFLUXDB_TOKEN, INFLUXDB_ORG and
/// INFLUXDB_BUCKET environment variables.
pub fn load_influx_settings() -> anyhow::Result<InfluxSettings> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix("INFLUXDB"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
