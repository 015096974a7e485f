//! Centralized error handling for the IPTV catalog service
//!
//! # Error Categories
//!
//! - **Fetch Errors**: upstream channel/stream feed retrieval and decoding
//! - **Probe Errors**: stream liveness checks (always recorded as a dead verdict)
//! - **Config Errors**: startup configuration problems
//!
//! The aggregation pipeline degrades on every failure: fetch errors fall back
//! to cached or empty data and probe errors become negative verdicts, so none
//! of these reach a query caller.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for feed fetch results
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for probe results
pub type ProbeResult<T> = Result<T, ProbeError>;
