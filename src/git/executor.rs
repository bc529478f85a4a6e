//! Starting git and collecting what it printed.
//!
//! Spawning is synchronous, so a missing executable is reported to the caller
//! right away. Waiting for the child is async and goes through the
//! [`RunningProcess`] seam, which tests replace with scripted children.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::audit::logger::{AuditLogger, Outcome};
use crate::error::{GitError, GitResult};
use crate::git::stream::{self, CapturedOutput};

/// Default executable, looked up in `PATH`
pub const DEFAULT_GIT: &str = "git";

/// A fully built invocation: `program args...` run in `dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Human-readable command line, for logs and error messages
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Working directory, `.` when inherited from the current process
    pub fn display_dir(&self) -> &Path {
        self.dir.as_deref().unwrap_or_else(|| Path::new("."))
    }
}

/// Result of a child process that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child did not exit normally (killed by a signal)
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn exited(&self) -> bool {
        self.exit_code.is_some()
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Map the exit status to the error taxonomy, keeping stdout on success
    pub fn into_stdout(self) -> GitResult<Vec<u8>> {
        match self.exit_code {
            None => Err(GitError::Crashed {
                signal: self.signal,
            }),
            Some(0) => Ok(self.stdout),
            Some(code) => Err(GitError::CommandFailed {
                code,
                stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
            }),
        }
    }

    fn from_status(status: ExitStatus, captured: CapturedOutput) -> Self {
        Self {
            exit_code: status.code(),
            signal: exit_signal(&status),
            stdout: captured.stdout,
            stderr: captured.stderr,
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Spawns child processes
///
/// Spawning is synchronous so that a missing executable is reported to the
/// caller right away; waiting is asynchronous.
pub trait ProcessRunner: Send + Sync + fmt::Debug {
    fn spawn(&self, spec: &CommandSpec) -> GitResult<Box<dyn RunningProcess>>;
}

/// A spawned child whose output is being collected
#[async_trait]
pub trait RunningProcess: Send {
    /// Drain both pipes and wait for exit
    async fn wait(&mut self) -> GitResult<ProcessOutput>;

    /// Ask the child to terminate; it is reaped in the background
    fn kill(&mut self);
}

/// Runs real processes on the Tokio reactor
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn spawn(&self, spec: &CommandSpec) -> GitResult<Box<dyn RunningProcess>> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| GitError::SpawnFailed {
            program: spec.program.display().to_string(),
            source,
        })?;
        debug!(pid = ?child.id(), "spawned {}", spec.command_line());

        Ok(Box::new(SystemProcess { child }))
    }
}

struct SystemProcess {
    child: Child,
}

#[async_trait]
impl RunningProcess for SystemProcess {
    async fn wait(&mut self) -> GitResult<ProcessOutput> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();

        let (captured, status) = tokio::join!(stream::collect(stdout, stderr), self.child.wait());
        let status = status?;
        let captured = captured?;

        debug!(
            code = ?status.code(),
            stdout = captured.stdout.len(),
            stderr = captured.stderr.len(),
            "child exited"
        );
        Ok(ProcessOutput::from_status(status, captured))
    }

    fn kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!("kill failed: {}", e);
        }
    }
}

/// Builds and starts git invocations
///
/// Cheap to clone; clones share the runner and the command journal.
#[derive(Debug, Clone)]
pub struct GitExecutor {
    git_path: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    journal: Option<Arc<AuditLogger>>,
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl GitExecutor {
    /// Executor running `git` from `PATH`
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    /// Executor using a custom process runner
    pub fn with_runner(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            git_path: PathBuf::from(DEFAULT_GIT),
            runner,
            journal: None,
        }
    }

    /// Use another git executable
    pub fn git_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.git_path = path.as_ref().to_path_buf();
        self
    }

    /// Record every finished invocation in `journal`
    pub fn journal(mut self, journal: AuditLogger) -> Self {
        self.journal = Some(Arc::new(journal));
        self
    }

    /// Path of the git executable
    pub fn program(&self) -> &Path {
        &self.git_path
    }

    /// Build the spec for `git <args...>` in `dir`
    pub fn command_spec(&self, dir: Option<&Path>, args: Vec<String>) -> CommandSpec {
        CommandSpec {
            program: self.git_path.clone(),
            args,
            dir: dir.map(Path::to_path_buf),
        }
    }

    /// Spawn a child for `spec`; failures are reported before any waiting
    pub fn spawn(&self, spec: &CommandSpec) -> GitResult<Box<dyn RunningProcess>> {
        self.runner.spawn(spec)
    }

    /// Start `spec` and report its completion through `on_complete`
    ///
    /// Spawn errors are returned directly and `on_complete` is never called in
    /// that case. Otherwise it is called exactly once, from a Tokio task.
    pub fn run<F>(&self, spec: CommandSpec, on_complete: F) -> GitResult<()>
    where
        F: FnOnce(GitResult<ProcessOutput>) + Send + 'static,
    {
        let mut process = self.spawn(&spec)?;
        let executor = self.clone();
        tokio::spawn(async move {
            let result = process.wait().await;
            executor.record(&spec, Outcome::of(&result));
            on_complete(result);
        });
        Ok(())
    }

    /// Run `spec` to completion
    pub async fn output(&self, spec: &CommandSpec) -> GitResult<ProcessOutput> {
        let mut process = self.spawn(spec)?;
        let result = process.wait().await;
        self.record(spec, Outcome::of(&result));
        result
    }

    /// Append a finished invocation to the journal, if one is configured
    pub(crate) fn record(&self, spec: &CommandSpec, outcome: Outcome) {
        let Some(journal) = &self.journal else {
            return;
        };
        if let Err(e) = journal.log_command(&spec.command_line(), spec.display_dir(), outcome) {
            tracing::warn!("failed to write command journal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        StdCommand::new("git")
            .args(["init"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        (temp_dir, repo_path)
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_line() {
        let executor = GitExecutor::new();
        let spec = executor.command_spec(None, args(&["log", "--", "a b"]));
        assert_eq!(spec.command_line(), "git log -- a b");
        assert_eq!(spec.program, PathBuf::from("git"));
    }

    #[test]
    fn test_into_stdout_classifies_status() {
        let ok = ProcessOutput {
            exit_code: Some(0),
            stdout: b"out".to_vec(),
            ..Default::default()
        };
        assert_eq!(ok.into_stdout().unwrap(), b"out");

        let failed = ProcessOutput {
            exit_code: Some(128),
            stderr: b"fatal: not a git repository\n".to_vec(),
            ..Default::default()
        };
        match failed.into_stdout().unwrap_err() {
            GitError::CommandFailed { code, stderr } => {
                assert_eq!(code, 128);
                assert_eq!(stderr, "fatal: not a git repository");
            }
            other => panic!("unexpected {other:?}"),
        }

        let crashed = ProcessOutput {
            exit_code: None,
            signal: Some(9),
            ..Default::default()
        };
        assert!(!crashed.exited());
        assert!(matches!(
            crashed.into_stdout().unwrap_err(),
            GitError::Crashed { signal: Some(9) }
        ));
    }

    #[tokio::test]
    async fn test_output_status() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::new();

        let spec = executor.command_spec(Some(&repo_path), args(&["status", "--porcelain"]));
        let output = executor.output(&spec).await.unwrap();
        assert!(output.success());
    }

    #[tokio::test]
    async fn test_output_failure_keeps_stderr() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::new();

        // no commits yet
        let spec = executor.command_spec(Some(&repo_path), args(&["log"]));
        let output = executor.output(&spec).await.unwrap();
        assert!(output.exited());
        assert!(!output.success());
        assert!(!output.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_synchronous() {
        let executor = GitExecutor::new().git_path("/nonexistent/git-binary");
        let spec = executor.command_spec(None, args(&["--version"]));

        let result = executor.run(spec, |_| panic!("callback must not run"));
        assert!(matches!(result, Err(GitError::SpawnFailed { .. })));
    }

    #[tokio::test]
    async fn test_run_callback() {
        let executor = GitExecutor::new();
        let spec = executor.command_spec(None, args(&["--version"]));
        let (tx, rx) = tokio::sync::oneshot::channel();

        executor
            .run(spec, move |result| {
                let _ = tx.send(result);
            })
            .unwrap();

        let output = rx.await.unwrap().unwrap();
        assert!(output.success());
        assert!(String::from_utf8_lossy(&output.stdout).starts_with("git version"));
    }
}
