//! Running an assembled command line as a local subprocess.

mod executor;
mod pty;

use std::io::{self, Write};
use std::time::Duration;

use crate::error::Result;

pub use executor::SystemExecutor;

/// Exit status reported when a command is killed for exceeding its timeout.
/// Real process statuses are always within `0..=255`.
pub const TIMEOUT_EXIT_CODE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Receives output chunks as they arrive.
pub type OutputCallback<'a> = &'a mut dyn FnMut(StreamKind, &[u8]);

/// Runs a fully assembled shell command line and reports its exit code.
///
/// The command line is handed to the shell as is; implementations do no
/// quoting of their own. When `on_output` is `None`, stdout and stderr go to
/// the local stdout and stderr unmodified. With `interactive` set the child
/// runs on a pseudo-terminal and its combined output arrives as
/// [`StreamKind::Stdout`].
#[allow(async_fn_in_trait)]
pub trait ProcessExecutor {
    async fn run(
        &self,
        command_line: &str,
        timeout: Duration,
        interactive: bool,
        on_output: Option<OutputCallback<'_>>,
    ) -> Result<i32>;
}

/// Write a chunk to the matching local stream and flush it straight away.
pub fn forward_to_local(kind: StreamKind, chunk: &[u8]) {
    let result = match kind {
        StreamKind::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(chunk).and_then(|_| out.flush())
        }
        StreamKind::Stderr => {
            let mut err = io::stderr().lock();
            err.write_all(chunk).and_then(|_| err.flush())
        }
    };

    if let Err(e) = result {
        tracing::warn!("Failed to forward {:?} output: {}", kind, e);
    }
}
