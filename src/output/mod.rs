//! Output module for reporting on the crawl database
//!
//! This module reads the document store, the checkpoint and the last
//! persisted run statistics and renders them for the `--stats` command.

mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
