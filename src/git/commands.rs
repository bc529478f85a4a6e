//! Per-command argument builders and parse strategies.
//!
//! Every command knows how to turn its configuration into git arguments and
//! how to turn git's stdout into records. Running them is the job of
//! [`Facade`](crate::git::facade::Facade).

use std::sync::Arc;

use crate::error::{GitError, GitResult};
use crate::git::parser::{
    LOG_FORMAT, parse_blame_porcelain, parse_branch_list, parse_log, parse_numstat,
};
use crate::git::records::{BlameEntry, BranchList, ChangedFileEntry, Commit, share};
use crate::git::text::ensure_valid_utf8;
use crate::git::version::GitVersion;

/// Label git prints for a detached HEAD; never a usable revision
pub const NO_BRANCH: &str = "(no branch)";

/// A git invocation and the interpretation of its output
pub trait GitCommand: Clone + Send + Sync + 'static {
    type Output: Send + 'static;

    /// Arguments following the executable
    fn args(&self) -> Vec<String>;

    /// Interpret stdout of a successful run
    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output>;
}

/// The revision to pass to git, if any
fn effective_rev(rev: &Option<String>) -> Option<&str> {
    rev.as_deref().filter(|r| *r != NO_BRANCH)
}

fn push_rev(args: &mut Vec<String>, rev: &Option<String>) {
    if let Some(rev) = effective_rev(rev) {
        args.push(rev.to_string());
    }
}

fn push_file(args: &mut Vec<String>, file: &Option<String>) {
    if let Some(file) = file {
        args.push("--".to_string());
        args.push(file.clone());
    }
}

/// `git log`, optionally limited to a revision and a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCommand {
    pub rev: Option<String>,
    pub file: Option<String>,
}

impl GitCommand for LogCommand {
    type Output = Vec<Arc<Commit>>;

    fn args(&self) -> Vec<String> {
        let mut args = vec!["log".to_string(), format!("--format={LOG_FORMAT}")];
        push_rev(&mut args, &self.rev);
        push_file(&mut args, &self.file);
        args
    }

    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output> {
        parse_log(stdout).map(share)
    }
}

/// `git branch`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchCommand;

impl GitCommand for BranchCommand {
    type Output = BranchList;

    fn args(&self) -> Vec<String> {
        vec!["branch".to_string()]
    }

    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output> {
        parse_branch_list(&ensure_valid_utf8(stdout))
    }
}

/// `git show`: the content of a file at a revision, or a diff
///
/// Without a file, both modes show the revision itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowCommand {
    pub rev: Option<String>,
    pub file: Option<String>,
    pub diff: bool,
}

impl GitCommand for ShowCommand {
    type Output = String;

    fn args(&self) -> Vec<String> {
        let mut args = vec!["show".to_string()];
        match (&self.file, self.diff) {
            (Some(file), false) => {
                // <rev>:<file> must stay one argument; an empty rev means the index
                let rev = effective_rev(&self.rev).unwrap_or_default();
                args.push(format!("{rev}:{file}"));
            }
            _ => {
                push_rev(&mut args, &self.rev);
                push_file(&mut args, &self.file);
            }
        }
        args
    }

    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output> {
        Ok(ensure_valid_utf8(stdout))
    }
}

/// `git show --numstat` for one revision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesChangedCommand {
    /// Defaults to `HEAD`
    pub rev: Option<String>,
}

impl FilesChangedCommand {
    fn rev(&self) -> &str {
        effective_rev(&self.rev).unwrap_or("HEAD")
    }
}

impl GitCommand for FilesChangedCommand {
    type Output = Vec<Arc<ChangedFileEntry>>;

    fn args(&self) -> Vec<String> {
        vec![
            "show".to_string(),
            "--numstat".to_string(),
            "--format=%N".to_string(),
            self.rev().to_string(),
        ]
    }

    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output> {
        parse_numstat(&ensure_valid_utf8(stdout), self.rev()).map(share)
    }
}

/// `git blame --line-porcelain` of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlameCommand {
    pub rev: Option<String>,
    pub file: String,
}

impl BlameCommand {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            rev: None,
            file: file.into(),
        }
    }
}

impl GitCommand for BlameCommand {
    type Output = Vec<Arc<BlameEntry>>;

    fn args(&self) -> Vec<String> {
        let mut args = vec!["blame".to_string(), "--line-porcelain".to_string()];
        push_rev(&mut args, &self.rev);
        args.push("--".to_string());
        args.push(self.file.clone());
        args
    }

    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output> {
        parse_blame_porcelain(&ensure_valid_utf8(stdout)).map(share)
    }
}

/// `git --version`
///
/// Output git does not describe with a version number yields `None`; the
/// operation itself still succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionCommand;

impl GitCommand for VersionCommand {
    type Output = Option<GitVersion>;

    fn args(&self) -> Vec<String> {
        vec!["--version".to_string()]
    }

    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output> {
        Ok(GitVersion::parse(&ensure_valid_utf8(stdout)))
    }
}

/// `git --version`, accepted only when at least `required`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionCheckCommand {
    pub required: GitVersion,
}

impl VersionCheckCommand {
    pub fn new(required: GitVersion) -> Self {
        Self { required }
    }
}

impl GitCommand for VersionCheckCommand {
    type Output = GitVersion;

    fn args(&self) -> Vec<String> {
        VersionCommand.args()
    }

    fn parse(&self, stdout: &[u8]) -> GitResult<Self::Output> {
        let found = VersionCommand.parse(stdout)?.ok_or_else(|| {
            GitError::VersionUndetermined(ensure_valid_utf8(stdout).trim().to_string())
        })?;

        if found.is_at_least(&self.required) {
            Ok(found)
        } else {
            Err(GitError::VersionTooOld {
                required: self.required,
                found,
            })
        }
    }
}
