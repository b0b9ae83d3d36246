//! offstat: aggregation and comparison of vehicular task-offloading runs.
//!
//! This crate reads the per-task event logs a simulator writes for every
//! (policy, seed) run, reduces them with the `evaluation` library, and writes
//! the resulting tables.
//!
//! ```text
//! logs ──► RunAggregator / TimeSeriesAggregator (per run, in parallel)
//!      ──► ComparativeAnalyzer (across seeds) ──► TableSink
//! ```
#![recursion_limit = "1024"]
#![deny(missing_docs)]

extern crate chrono;
extern crate csv;
extern crate env_logger;
#[macro_use]
extern crate error_chain;
extern crate evaluation;
#[macro_use]
extern crate log;
extern crate rayon;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;

#[allow(missing_docs)]
pub mod errors;
pub mod logger;
pub mod pipeline;
pub use pipeline::Report;
mod setting;
pub use setting::{seed_of, Outputs, PolicyPattern, Setting};
pub mod sink;
pub use sink::{CsvSink, MemorySink, TableSink};
pub mod source;
pub mod summary;
