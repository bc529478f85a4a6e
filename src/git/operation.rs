//! Lifecycle of one git invocation.
//!
//! An operation goes `Idle -> Spawning -> Running` and ends in exactly one of
//! `Succeeded`, `Failed`, `Crashed` or `Cancelled`. Cancellation is checked
//! before spawning, while the child runs (the child is killed) and once more
//! before parsing. The terminal state is published as soon as the result is
//! known, even while delivery still waits on an earlier operation, and never
//! changes afterwards.
//!
//! Every operation owns its token. The caller's token is only observed, so
//! one caller token can be shared by many operations.

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::audit::logger::Outcome;
use crate::error::{GitError, GitResult};
use crate::git::cancel::CancellationToken;
use crate::git::executor::{CommandSpec, GitExecutor, RunningProcess};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationState {
    Idle,
    Spawning,
    Running,
    Succeeded,
    Failed,
    Crashed,
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationState::Succeeded
                | OperationState::Failed
                | OperationState::Crashed
                | OperationState::Cancelled
        )
    }

    fn of<T>(result: &GitResult<T>) -> Self {
        match result {
            Ok(_) => OperationState::Succeeded,
            Err(GitError::Cancelled) => OperationState::Cancelled,
            Err(GitError::Crashed { .. }) => OperationState::Crashed,
            Err(_) => OperationState::Failed,
        }
    }
}

/// Control side of a started operation
#[derive(Debug)]
pub struct OperationHandle {
    token: CancellationToken,
    state: watch::Receiver<OperationState>,
    task: JoinHandle<()>,
}

impl OperationHandle {
    /// Request cancellation; a no-op once the operation has finished
    pub fn cancel(&self) {
        if !self.state().is_terminal() {
            self.token.cancel();
        }
    }

    pub fn state(&self) -> OperationState {
        *self.state.borrow()
    }

    /// The operation's own token, separate from the one passed at start
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn state_receiver(&self) -> watch::Receiver<OperationState> {
        self.state.clone()
    }

    /// Wait until a terminal state is reached and return it
    pub async fn terminated(&self) -> OperationState {
        let mut state = self.state.clone();
        // the task always publishes a terminal state before dropping the sender
        let _ = state.wait_for(|s| s.is_terminal()).await;
        let last = *state.borrow();
        last
    }
}

/// A started operation whose result can be awaited
#[derive(Debug)]
pub struct Operation<T> {
    handle: OperationHandle,
    result: oneshot::Receiver<GitResult<T>>,
}

impl<T> Operation<T> {
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn state(&self) -> OperationState {
        self.handle.state()
    }

    pub fn handle(&self) -> &OperationHandle {
        &self.handle
    }

    /// Wait for the result
    pub async fn finish(self) -> GitResult<T> {
        match self.result.await {
            Ok(result) => result,
            Err(_) => match self.handle.task.await {
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                _ => Err(GitError::Cancelled),
            },
        }
    }
}

/// Parameters of one launch
pub(crate) struct Launch<'a> {
    pub executor: &'a GitExecutor,
    pub spec: CommandSpec,
    /// Caller's token; observed, never cancelled by the operation
    pub token: CancellationToken,
    /// Completion signal of the previous operation; results are delivered
    /// after it fires so callbacks observe start order
    pub after: &'a mut Option<oneshot::Receiver<()>>,
}

impl Launch<'_> {
    /// Spawn the child and drive it to completion on a Tokio task
    ///
    /// Cancellation before spawning and spawn failures are returned directly,
    /// without any task being created. On success, also returns the signal
    /// fired once `deliver` has run.
    pub fn start<T, P, D>(
        self,
        parse: P,
        deliver: D,
    ) -> GitResult<(OperationHandle, oneshot::Receiver<()>)>
    where
        T: Send + 'static,
        P: FnOnce(&[u8]) -> GitResult<T> + Send + 'static,
        D: FnOnce(GitResult<T>) + Send + 'static,
    {
        if self.token.is_cancelled() {
            return Err(GitError::Cancelled);
        }

        let (state_tx, state_rx) = watch::channel(OperationState::Spawning);
        let process = self.executor.spawn(&self.spec)?;
        state_tx.send_replace(OperationState::Running);

        let previous = self.after.take();
        let (delivered_tx, delivered_rx) = oneshot::channel();
        let executor = self.executor.clone();
        let spec = self.spec;
        let tokens = Tokens {
            caller: self.token,
            own: CancellationToken::new(),
        };
        let own = tokens.own.clone();

        let task = tokio::spawn(async move {
            let result = drive(&executor, &spec, process, &tokens, parse).await;
            // the result is fixed from here on; only its delivery may wait
            state_tx.send_replace(OperationState::of(&result));
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            deliver(result);
            let _ = delivered_tx.send(());
        });

        Ok((
            OperationHandle {
                token: own,
                state: state_rx,
                task,
            },
            delivered_rx,
        ))
    }

    /// Like [`start`](Self::start), delivering into an awaitable [`Operation`]
    pub fn start_awaitable<T, P>(
        self,
        parse: P,
    ) -> GitResult<(Operation<T>, oneshot::Receiver<()>)>
    where
        T: Send + 'static,
        P: FnOnce(&[u8]) -> GitResult<T> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let (handle, delivered) = self.start(parse, move |result| {
            // the receiver may have been dropped by a caller that lost interest
            let _ = result_tx.send(result);
        })?;

        Ok((
            Operation {
                handle,
                result: result_rx,
            },
            delivered,
        ))
    }
}

/// The caller's token and the operation's own; either one cancels
struct Tokens {
    caller: CancellationToken,
    own: CancellationToken,
}

impl Tokens {
    fn is_cancelled(&self) -> bool {
        self.caller.is_cancelled() || self.own.is_cancelled()
    }

    async fn cancelled(&self) {
        tokio::select! {
            _ = self.caller.cancelled() => {}
            _ = self.own.cancelled() => {}
        }
    }
}

async fn drive<T, P>(
    executor: &GitExecutor,
    spec: &CommandSpec,
    mut process: Box<dyn RunningProcess>,
    tokens: &Tokens,
    parse: P,
) -> GitResult<T>
where
    T: Send + 'static,
    P: FnOnce(&[u8]) -> GitResult<T> + Send + 'static,
{
    let waited = tokio::select! {
        biased;
        _ = tokens.cancelled() => None,
        output = process.wait() => Some(output),
    };

    let Some(output) = waited else {
        process.kill();
        executor.record(spec, Outcome::Cancelled);
        tracing::debug!("cancelled {}", spec.command_line());
        return Err(GitError::Cancelled);
    };

    executor.record(spec, Outcome::of(&output));
    let stdout = output?.into_stdout()?;

    if tokens.is_cancelled() {
        return Err(GitError::Cancelled);
    }

    match tokio::task::spawn_blocking(move || parse(&stdout)).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(GitError::Cancelled),
    }
}
