//! Console output

mod progress;

pub use progress::{format_dry_run, format_event, ProgressReporter};
