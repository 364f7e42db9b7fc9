use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use super::pty::run_in_pty;
use super::{forward_to_local, OutputCallback, ProcessExecutor, StreamKind, TIMEOUT_EXIT_CODE};
use crate::error::{Error, Result};

pub(super) const CHUNK_SIZE: usize = 8 * 1024;

#[cfg(unix)]
pub(super) const SHELL: &str = "sh";
#[cfg(unix)]
pub(super) const SHELL_FLAG: &str = "-c";
#[cfg(windows)]
pub(super) const SHELL: &str = "cmd";
#[cfg(windows)]
pub(super) const SHELL_FLAG: &str = "/C";

/// Runs command lines through the system shell with tokio's process support.
///
/// Interactive runs get a pseudo-terminal, so the remote side sees a tty and
/// prompts work. Everything else uses plain pipes with stdin closed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessExecutor for SystemExecutor {
    async fn run(
        &self,
        command_line: &str,
        timeout: Duration,
        interactive: bool,
        on_output: Option<OutputCallback<'_>>,
    ) -> Result<i32> {
        let mut forward = forward_to_local;
        let emit: OutputCallback<'_> = match on_output {
            Some(callback) => callback,
            None => &mut forward,
        };

        if interactive {
            return run_in_pty(command_line, timeout, emit).await;
        }

        let mut cmd = Command::new(SHELL);
        cmd.arg(SHELL_FLAG)
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout takes down everything the shell started.
        #[cfg(unix)]
        cmd.process_group(0);

        tracing::debug!("Spawning {} for: {}", SHELL, command_line);

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: SHELL.to_string(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Exit status is only collected once both pipes hit EOF, so every
        // chunk has been delivered before the caller sees the code.
        let pump = async {
            pump_output(stdout, stderr, emit).await?;
            child.wait().await
        };

        let outcome = tokio::time::timeout(timeout, pump).await;

        match outcome {
            Ok(status) => {
                let code = exit_code(status?);
                if code != 0 {
                    tracing::warn!("Command exited with status {}: {}", code, command_line);
                }
                Ok(code)
            }
            Err(_) => {
                tracing::error!(
                    "Command timed out after {}s, killing it: {}",
                    timeout.as_secs(),
                    command_line
                );
                kill_tree(&mut child).await;
                Ok(TIMEOUT_EXIT_CODE)
            }
        }
    }
}

async fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        kill_process_group(pid);
    }
    if let Err(e) = child.kill().await {
        tracing::warn!("Failed to kill timed out command: {}", e);
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!("killpg({}) failed: {}", pgid, io::Error::last_os_error());
    }
}

async fn pump_output(
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
    emit: OutputCallback<'_>,
) -> io::Result<()> {
    let mut out_buf = vec![0u8; CHUNK_SIZE];
    let mut err_buf = vec![0u8; CHUNK_SIZE];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(stdout.as_mut(), &mut out_buf), if stdout.is_some() => {
                match read? {
                    0 => stdout = None,
                    n => emit(StreamKind::Stdout, &out_buf[..n]),
                }
            }
            read = read_chunk(stderr.as_mut(), &mut err_buf), if stderr.is_some() => {
                match read? {
                    0 => stderr = None,
                    n => emit(StreamKind::Stderr, &err_buf[..n]),
                }
            }
        }
    }

    Ok(())
}

async fn read_chunk<R>(stream: Option<&mut R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(stream) => stream.read(buf).await,
        None => std::future::pending().await,
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
