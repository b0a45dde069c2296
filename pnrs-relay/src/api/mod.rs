//! HTTP API handlers for pnrs-relay

pub mod error;
pub mod health;
pub mod investigation;

pub use error::ApiError;
pub use health::health_routes;
pub use investigation::{get_investigation_numbers, transfer_numbers};
