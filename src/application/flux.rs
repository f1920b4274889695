// Flux query construction for asset range queries
use chrono::{DateTime, SecondsFormat, Utc};

/// Escape a value for embedding in a double-quoted Flux string literal, so
/// untrusted asset and channel names cannot break out of the query. Dollar
/// signs are escaped too; Flux evaluates `${...}` inside string literals as
/// interpolation.
pub fn escape_flux_string(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
}

/// A range-query request over one asset's measurement.
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
    pub asset_name: String,
    pub channel_names: Option<Vec<String>>,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
}

impl AssetQuery {
    pub fn new(asset_name: impl Into<String>) -> Self {
        Self {
            asset_name: asset_name.into(),
            ..Default::default()
        }
    }

    fn bound(ts: Option<DateTime<Utc>>, default: &str) -> String {
        match ts {
            Some(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => default.to_string(),
        }
    }

    /// Render the filter-and-project pipeline: records of the asset's
    /// measurement, `value` field only, optionally restricted to a channel
    /// set, projected to (_time, _value, channel) and sorted ascending by
    /// time. An absent start bound defaults to the beginning of time and an
    /// absent stop bound to now.
    pub fn to_flux(&self, bucket: &str) -> String {
        let mut flux = format!(
            "from(bucket: \"{}\")\n  \
             |> range(start: {}, stop: {})\n  \
             |> filter(fn: (r) => r[\"_measurement\"] == \"{}\")\n  \
             |> filter(fn: (r) => r[\"_field\"] == \"value\")",
            escape_flux_string(bucket),
            Self::bound(self.start, "0"),
            Self::bound(self.stop, "now()"),
            escape_flux_string(&self.asset_name),
        );

        // An empty channel set means no restriction, same as None.
        if let Some(channels) = self.channel_names.as_deref().filter(|c| !c.is_empty()) {
            let predicate = channels
                .iter()
                .map(|ch| format!("r[\"channel\"] == \"{}\"", escape_flux_string(ch)))
                .collect::<Vec<_>>()
                .join(" or ");
            flux.push_str(&format!("\n  |> filter(fn: (r) => ({predicate}))"));
        }

        flux.push_str(
            "\n  |> keep(columns: [\"_time\", \"_value\", \"channel\"])\
             \n  |> sort(columns: [\"_time\"])",
        );
        flux
    }
}

/// Cheapest existence probe for a measurement: ask for a single record.
pub fn existence_query(bucket: &str, asset_name: &str) -> String {
    format!(
        "{}\n  |> limit(n: 1)",
        AssetQuery::new(asset_name).to_flux(bucket)
    )
}
