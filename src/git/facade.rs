use std::path::{Path, PathBuf};
use tokio::sync::{oneshot, watch};

use crate::error::GitResult;
use crate::git::cancel::CancellationToken;
use crate::git::commands::{
    BlameCommand, BranchCommand, FilesChangedCommand, GitCommand, LogCommand, ShowCommand,
    VersionCheckCommand, VersionCommand,
};
use crate::git::executor::{CommandSpec, GitExecutor};
use crate::git::operation::{Launch, Operation, OperationHandle, OperationState};
use crate::git::version::GitVersion;

pub type LogFacade = Facade<LogCommand>;
pub type BranchFacade = Facade<BranchCommand>;
pub type ShowFacade = Facade<ShowCommand>;
pub type FilesChangedFacade = Facade<FilesChangedCommand>;
pub type BlameFacade = Facade<BlameCommand>;
pub type VersionFacade = Facade<VersionCommand>;
pub type VersionCheckFacade = Facade<VersionCheckCommand>;

/// Own token and state of the most recently started operation
#[derive(Debug)]
struct Outstanding {
    token: CancellationToken,
    state: watch::Receiver<OperationState>,
}

/// Configures and issues one kind of git command
///
/// At most one operation is outstanding per façade: starting a new one
/// cancels the previous one and kills its process. Results are delivered in
/// the order operations were started.
#[derive(Debug)]
pub struct Facade<C: GitCommand> {
    executor: GitExecutor,
    dir: Option<PathBuf>,
    command: C,
    outstanding: Option<Outstanding>,
    last_delivery: Option<oneshot::Receiver<()>>,
}

impl<C: GitCommand> Facade<C> {
    pub fn new(executor: GitExecutor, command: C) -> Self {
        Self {
            executor,
            dir: None,
            command,
            outstanding: None,
            last_delivery: None,
        }
    }

    /// Run git in `dir` instead of the current directory
    pub fn set_dir<P: AsRef<Path>>(&mut self, dir: P) {
        self.dir = Some(dir.as_ref().to_path_buf());
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    /// Configuration for the next start
    pub fn command_mut(&mut self) -> &mut C {
        &mut self.command
    }

    pub fn executor(&self) -> &GitExecutor {
        &self.executor
    }

    /// The invocation the next start will run
    pub fn spec(&self) -> CommandSpec {
        self.executor.command_spec(self.dir(), self.command.args())
    }

    /// State of the most recent operation; `Idle` before the first start
    pub fn state(&self) -> OperationState {
        self.outstanding
            .as_ref()
            .map_or(OperationState::Idle, |o| *o.state.borrow())
    }

    /// Whether an operation is still outstanding
    pub fn is_busy(&self) -> bool {
        let state = self.state();
        state != OperationState::Idle && !state.is_terminal()
    }

    /// Cancel the outstanding operation, if any
    pub fn cancel(&self) {
        if let Some(outstanding) = &self.outstanding {
            if !outstanding.state.borrow().is_terminal() {
                outstanding.token.cancel();
            }
        }
    }

    /// Start the command with a fresh cancellation token
    pub fn start(&mut self) -> GitResult<Operation<C::Output>> {
        self.start_with_token(CancellationToken::new())
    }

    /// Start the command, cancellable through `token`
    ///
    /// `token` may be shared with other operations: the façade never cancels
    /// it, only the operation's own token.
    ///
    /// Fails immediately with `Cancelled` if `token` is already cancelled, or
    /// with `SpawnFailed` if git could not be started.
    pub fn start_with_token(&mut self, token: CancellationToken) -> GitResult<Operation<C::Output>> {
        self.cancel();
        let command = self.command.clone();
        let spec = self.spec();

        let (operation, delivered) = Launch {
            executor: &self.executor,
            spec,
            token,
            after: &mut self.last_delivery,
        }
        .start_awaitable(move |stdout| command.parse(stdout))?;

        self.track(operation.handle(), delivered);
        Ok(operation)
    }

    /// Start the command and hand its result to `on_done`
    ///
    /// `on_done` runs on a Tokio task exactly once, unless starting fails, in
    /// which case the error is returned here and `on_done` is dropped.
    pub fn start_with_callback<F>(
        &mut self,
        token: CancellationToken,
        on_done: F,
    ) -> GitResult<OperationHandle>
    where
        F: FnOnce(GitResult<C::Output>) + Send + 'static,
    {
        self.cancel();
        let command = self.command.clone();
        let spec = self.spec();

        let (handle, delivered) = Launch {
            executor: &self.executor,
            spec,
            token,
            after: &mut self.last_delivery,
        }
        .start(move |stdout| command.parse(stdout), on_done)?;

        self.track(&handle, delivered);
        Ok(handle)
    }

    /// Start the command and wait for its result
    pub async fn run(&mut self) -> GitResult<C::Output> {
        self.start()?.finish().await
    }

    /// Run the command to completion, blocking the calling thread
    ///
    /// The command runs on its own thread with a private runtime, so this is
    /// usable outside of any runtime. It must not be called from within an
    /// async task.
    pub fn run_blocking(&mut self) -> GitResult<C::Output> {
        self.cancel();
        let mut detached = Facade::new(self.executor.clone(), self.command.clone());
        detached.dir = self.dir.clone();

        let worker = std::thread::spawn(move || -> GitResult<C::Output> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(detached.run())
        });

        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    fn track(&mut self, handle: &OperationHandle, delivered: oneshot::Receiver<()>) {
        self.outstanding = Some(Outstanding {
            token: handle.token().clone(),
            state: handle.state_receiver(),
        });
        self.last_delivery = Some(delivered);
    }
}

impl<C: GitCommand + Default> Facade<C> {
    /// Façade running the default-configured command with `executor`
    pub fn with_executor(executor: GitExecutor) -> Self {
        Self::new(executor, C::default())
    }
}

impl Facade<VersionCommand> {
    /// Façade checking that git is at least `required`
    pub fn check(&self, required: GitVersion) -> VersionCheckFacade {
        let mut facade = Facade::new(self.executor.clone(), VersionCheckCommand::new(required));
        facade.dir = self.dir.clone();
        facade
    }
}

/// Verify that the configured git is at least `required`
pub async fn check_version(executor: &GitExecutor, required: GitVersion) -> GitResult<GitVersion> {
    Facade::new(executor.clone(), VersionCheckCommand::new(required))
        .run()
        .await
}
