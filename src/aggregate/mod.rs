pub mod aggregator;
pub mod edge;
pub mod error;
