pub mod config;
pub mod distributor;
pub mod error;
pub mod fetcher;
pub mod indexer;
pub mod lcd;
pub mod listings;
pub mod retry;
pub mod tx;

pub use crate::error::OpsError;
