//! Core type definitions for copier

mod action;
mod entry;
mod error;
mod mode;
mod outcome;

pub use action::TransferAction;
pub use entry::FileEntry;
pub use error::{CopierError, RemoteError, TransferError};
pub use mode::OperationMode;
pub use outcome::TransferOutcome;
