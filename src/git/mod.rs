pub mod cancel;
pub mod commands;
pub mod executor;
pub mod facade;
pub mod operation;
pub mod parser;
pub mod records;
pub mod repository;
pub mod stream;
pub mod text;
pub mod version;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use commands::{
    BlameCommand, BranchCommand, FilesChangedCommand, GitCommand, LogCommand, NO_BRANCH,
    ShowCommand, VersionCheckCommand, VersionCommand,
};
pub use executor::{CommandSpec, GitExecutor, ProcessOutput, ProcessRunner, RunningProcess, SystemRunner};
pub use facade::{
    BlameFacade, BranchFacade, Facade, FilesChangedFacade, LogFacade, ShowFacade,
    VersionCheckFacade, VersionFacade, check_version,
};
pub use operation::{Operation, OperationHandle, OperationState};
pub use records::{BlameEntry, Branch, BranchList, ChangedFileEntry, Commit};
pub use repository::{Repository, parse_path};
pub use text::is_hash;
pub use version::GitVersion;
