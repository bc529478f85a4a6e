//! Pipe draining for child processes.
//!
//! Both pipes are read concurrently as soon as data is ready, so the child
//! never blocks on a full pipe buffer while the other stream is idle.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

const CHUNK_SIZE: usize = 8 * 1024;

/// Raw bytes captured from a child, still undecoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Read both streams until EOF on each
///
/// A missing stream counts as already closed.
pub async fn collect<O, E>(stdout: Option<O>, stderr: Option<E>) -> io::Result<CapturedOutput>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let (stdout, stderr) = tokio::try_join!(drain(stdout, "stdout"), drain(stderr, "stderr"))?;
    Ok(CapturedOutput { stdout, stderr })
}

async fn drain<R>(reader: Option<R>, name: &'static str) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };

    let mut collected = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => {
                trace!(stream = name, bytes = collected.len(), "EOF");
                return Ok(collected);
            }
            Ok(n) => collected.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
