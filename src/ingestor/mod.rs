//! Catalog ingestion
//!
//! [`AggregationEngine`] turns the upstream feeds into the verified catalog;
//! [`RefreshScheduler`] decides when it runs.

pub mod aggregator;
pub mod scheduler;

pub use aggregator::AggregationEngine;
pub use scheduler::{RefreshScheduler, SchedulerEvent, SchedulerHandle};
