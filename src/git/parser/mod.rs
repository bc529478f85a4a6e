//! git output parsers
//!
//! Every parser is a pure function from captured output to typed records.
//! Parsers never perform I/O; malformed input is reported as
//! [`GitError::IncompleteResult`](crate::GitError::IncompleteResult) or
//! [`GitError::InvalidResult`](crate::GitError::InvalidResult) and no partial
//! result is returned.

mod blame;
mod branch;
mod log;
mod numstat;

pub use blame::parse_blame_porcelain;
pub use branch::parse_branch_list;
pub use log::{FIELD_SEPARATOR, LOG_FORMAT, parse_log};
pub use numstat::parse_numstat;
