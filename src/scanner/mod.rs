//! Local directory enumeration

mod walker;

pub use walker::{list_entries, scan_files, scan_tree, ScanOptions};
