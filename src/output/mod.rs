//! Output module for harvest results
//!
//! This module handles:
//! - Writing the JSON record database
//! - Summarizing a finished run for the terminal

mod json;
pub mod stats;

pub use json::{to_json_writer, write_json_output, OutputDocument, RunRange};
pub use stats::{collect_statistics, print_statistics, RunStatistics};
