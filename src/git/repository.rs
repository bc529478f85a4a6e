use crate::error::{GitError, GitResult};
use crate::git::commands::{
    BlameCommand, BranchCommand, FilesChangedCommand, GitCommand, LogCommand, ShowCommand,
    VersionCheckCommand, VersionCommand,
};
use crate::git::executor::GitExecutor;
use crate::git::facade::{
    BlameFacade, BranchFacade, Facade, FilesChangedFacade, LogFacade, ShowFacade,
    VersionCheckFacade, VersionFacade,
};
use crate::git::version::GitVersion;
use std::env;
use std::path::{Path, PathBuf};

/// Split `path` into the work tree containing it and the path inside it
///
/// Walks up from `path` to the first directory holding a `.git` entry (a
/// directory, or a file for worktrees and submodules). For the root itself
/// the inner path is empty.
pub fn parse_path<P: AsRef<Path>>(path: P) -> GitResult<(PathBuf, PathBuf)> {
    let path = path.as_ref();
    let root = find_root(path)?;
    let inner = path
        .strip_prefix(&root)
        .map(Path::to_path_buf)
        .map_err(|_| GitError::NotARepository)?;
    Ok((root, inner))
}

fn find_root(start: &Path) -> GitResult<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(".git").exists() {
            return Ok(current);
        }

        // Move up to parent directory
        if !current.pop() {
            return Err(GitError::NotARepository);
        }
    }
}

/// A git work tree and the executor used for commands run in it
///
/// Every method returns a fresh façade whose working directory is the
/// repository root; configure it and start it.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
    executor: GitExecutor,
}

impl Repository {
    /// Detect git repository from current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Detect git repository starting from a specific directory
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        Ok(Self::new(find_root(start_path.as_ref())?))
    }

    /// Create a Repository for a known work tree
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_executor(path, GitExecutor::new())
    }

    pub fn with_executor<P: AsRef<Path>>(path: P, executor: GitExecutor) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            executor,
        }
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the git executor for this repository
    pub fn executor(&self) -> &GitExecutor {
        &self.executor
    }

    /// History of `file` (the whole repository when `None`)
    pub fn log(&self, file: Option<&str>) -> LogFacade {
        self.facade(LogCommand {
            rev: None,
            file: file.map(str::to_string),
        })
    }

    pub fn branches(&self) -> BranchFacade {
        self.facade(BranchCommand)
    }

    /// Content of `file` at `rev`
    pub fn show(&self, rev: Option<&str>, file: &str) -> ShowFacade {
        self.facade(ShowCommand {
            rev: rev.map(str::to_string),
            file: Some(file.to_string()),
            diff: false,
        })
    }

    /// Diff introduced by `rev`, optionally limited to `file`
    pub fn diff(&self, rev: Option<&str>, file: Option<&str>) -> ShowFacade {
        self.facade(ShowCommand {
            rev: rev.map(str::to_string),
            file: file.map(str::to_string),
            diff: true,
        })
    }

    pub fn files_changed(&self, rev: Option<&str>) -> FilesChangedFacade {
        self.facade(FilesChangedCommand {
            rev: rev.map(str::to_string),
        })
    }

    pub fn blame(&self, rev: Option<&str>, file: &str) -> BlameFacade {
        self.facade(BlameCommand {
            rev: rev.map(str::to_string),
            file: file.to_string(),
        })
    }

    pub fn version(&self) -> VersionFacade {
        self.facade(VersionCommand)
    }

    pub fn version_check(&self, required: GitVersion) -> VersionCheckFacade {
        self.facade(VersionCheckCommand::new(required))
    }

    fn facade<C: GitCommand>(&self, command: C) -> Facade<C> {
        let mut facade = Facade::new(self.executor.clone(), command);
        facade.set_dir(&self.path);
        facade
    }
}
