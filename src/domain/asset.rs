// Asset and channel domain models
use std::collections::BTreeMap;

use crate::domain::sample::Sample;
use crate::error::{Result, TelemetryError};

/// A single named time series of scalar samples belonging to an asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl Channel {
    /// A channel carries at least one sample at construction time.
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TelemetryError::Validation(
                "channel name is required".to_string(),
            ));
        }
        if samples.is_empty() {
            return Err(TelemetryError::Validation(format!(
                "channel '{name}' must have at least one sample"
            )));
        }
        Ok(Self { name, samples })
    }
}

/// A named entity whose telemetry is tracked as one or more channels.
///
/// Channels are keyed by name. An empty channel map is allowed here: a range
/// query matching no records reconstructs an asset with no channels. The
/// at-least-one-channel rule applies where assets are created.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub channels: BTreeMap<String, Channel>,
}

impl Asset {
    pub fn new(name: impl Into<String>, channels: BTreeMap<String, Channel>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TelemetryError::Validation(
                "asset name is required".to_string(),
            ));
        }
        Ok(Self { name, channels })
    }
}
