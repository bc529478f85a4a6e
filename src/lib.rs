pub mod audit;
pub mod config;
pub mod error;
pub mod git;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, ErrorKind, GitError, GitResult};
pub use git::{
    BlameEntry, Branch, BranchList, CancellationToken, ChangedFileEntry, Commit, GitExecutor,
    GitVersion, Operation, OperationState, Repository,
};
