// Application layer - Use cases and the transport boundary
pub mod aggregate;
pub mod flux;
pub mod manager;
pub mod transport;
