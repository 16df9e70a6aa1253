// Core modules
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod query;
pub mod store;
pub mod synthetic;

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use matcher::{MatchOutcome, OpenLot};
pub use metrics::PerformanceSnapshot;
pub use models::*;
pub use query::{DetailLevel, QueryEngine, QueryParams, QueryResponse, ResponseStatus};
pub use store::{LogSnapshot, OrderLog};
