// Domain layer - Telemetry value types
pub mod asset;
pub mod sample;
