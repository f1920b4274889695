// Reshape flat query records into per-channel sample sequences
use std::collections::BTreeMap;

use crate::application::transport::Record;
use crate::domain::sample::Sample;

/// Group records by channel tag, keeping the store-sorted order of samples
/// within each channel. Records are never re-sorted here; ascending time
/// order is requested by the query itself. Records carrying no channel tag
/// are rejected with a warning rather than silently dropped.
pub fn group_by_channel(records: Vec<Record>) -> BTreeMap<String, Vec<Sample>> {
    let mut grouped: BTreeMap<String, Vec<Sample>> = BTreeMap::new();

    for record in records {
        let Some(channel) = record.channel.filter(|c| !c.is_empty()) else {
            tracing::warn!(
                timestamp = %record.timestamp,
                "rejecting query record without a channel tag"
            );
            continue;
        };

        grouped
            .entry(channel)
            .or_default()
            .push(Sample::new(record.timestamp, record.value));
    }

    grouped
}
