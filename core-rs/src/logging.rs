//! Log output setup
//!
//! Lines go to stdout, timestamped, with the source file and line of the call.

use tracing::Level;

use crate::errors::{HarnessError, Result};

/// Install the process-wide subscriber. Call once, before anything logs.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| HarnessError::Logging(e.to_string()))
}
