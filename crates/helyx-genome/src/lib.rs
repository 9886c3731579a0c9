//! helyx-genome — Genome-browser sequence API client.
//!
//! Fetches the reference window around a variant position from the UCSC
//! sequence endpoint. The window is what the scoring model sees, so the
//! coordinate arithmetic here (1-based positions in, 0-based half-open
//! spans out) is the contract the rest of the workspace builds on.

pub mod client;
pub mod error;
pub mod window;

pub use client::GenomeClient;
pub use error::GenomeError;
pub use window::{window_span, GenomeWindow};
