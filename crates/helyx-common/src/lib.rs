//! helyx-common — Shared errors, the egress-capped HTTP client, and DNA helpers
//! used across all Helyx crates.

pub mod dna;
pub mod egress;
pub mod error;

// Re-export commonly used types
pub use egress::EgressClient;
pub use error::{ApiError, HelyxError};
