//! Utilities used by the command-line driver.
//!
//! - **`data_loader`**: reads a qubit operator from a term-per-line text file.
//! - **`perf`**: reads the process's peak memory usage on Linux.

pub mod data_loader;
pub mod perf;
