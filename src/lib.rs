pub mod actions;
pub mod chains;
pub mod config;
pub mod contract;
pub mod deduplication;
pub mod forwarder;
pub mod grammar;
pub mod pipeline;
pub mod tracker;
pub mod types;

pub use pipeline::{Extraction, SignalPipeline};
