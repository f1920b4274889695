// Asset/channel data-access layer over InfluxDB time-series storage
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::flux::AssetQuery;
pub use application::manager::TelemetryManager;
pub use application::transport::{Point, Record, TelemetryTransport};
pub use domain::asset::{Asset, Channel};
pub use domain::sample::Sample;
pub use error::{Result, TelemetryError};
pub use infrastructure::config::{InfluxSettings, load_influx_settings};
pub use infrastructure::influx_transport::InfluxTransport;
