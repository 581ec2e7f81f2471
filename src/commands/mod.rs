//! Top-level commands

pub mod run;

pub use run::{hint, run, run_with_session};
