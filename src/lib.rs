pub mod aggregator;
pub mod columns;
pub mod error;
pub mod fetch;
pub mod output;
