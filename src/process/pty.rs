use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use tokio::sync::mpsc;

use super::executor::{CHUNK_SIZE, SHELL, SHELL_FLAG};
use super::{OutputCallback, StreamKind, TIMEOUT_EXIT_CODE};
use crate::error::{Error, Result};

const PTY_ROWS: u16 = 24;
const PTY_COLS: u16 = 80;

/// Run `command_line` with a pseudo-terminal as its stdin, stdout and stderr.
///
/// Everything the child writes arrives on the pty master and is reported as
/// [`StreamKind::Stdout`]. Local stdin is copied into the pty so prompts can
/// be answered.
pub(super) async fn run_in_pty(
    command_line: &str,
    timeout: Duration,
    emit: OutputCallback<'_>,
) -> Result<i32> {
    let pair = native_pty_system()
        .openpty(PtySize {
            rows: PTY_ROWS,
            cols: PTY_COLS,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| Error::Pty(format!("failed to open pty: {:#}", e)))?;

    let mut cmd = CommandBuilder::new(SHELL);
    cmd.arg(SHELL_FLAG);
    cmd.arg(command_line);
    // Without this the child would start in the home directory.
    if let Ok(cwd) = std::env::current_dir() {
        cmd.cwd(cwd);
    }

    tracing::debug!("Spawning {} in a pty for: {}", SHELL, command_line);

    let mut child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| Error::Spawn {
            program: SHELL.to_string(),
            source: io::Error::other(format!("{:#}", e)),
        })?;
    // The master only sees EOF once no slave handle is left open on our side.
    drop(pair.slave);

    let master = pair.master;
    let mut killer = child.clone_killer();
    let reader = master
        .try_clone_reader()
        .map_err(|e| Error::Pty(format!("failed to read from pty: {:#}", e)))?;
    let writer = master
        .take_writer()
        .map_err(|e| Error::Pty(format!("failed to write to pty: {:#}", e)))?;

    forward_stdin(writer);
    let mut chunks = spawn_reader(reader);

    let pump = async {
        while let Some(chunk) = chunks.recv().await {
            emit(StreamKind::Stdout, &chunk);
        }
        tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(io::Error::other)?
    };

    let outcome = tokio::time::timeout(timeout, pump).await;

    match outcome {
        Ok(status) => {
            let code = i32::try_from(status?.exit_code()).unwrap_or(i32::MAX);
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
            if let Err(e) = killer.kill() {
                tracing::warn!("Failed to kill timed out command: {}", e);
            }
            Ok(TIMEOUT_EXIT_CODE)
        }
    }
}

fn spawn_reader(mut reader: Box<dyn Read + Send>) -> mpsc::UnboundedReceiver<Vec<u8>> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                // Linux reports EIO here once the child side has closed.
                Err(e) => {
                    tracing::debug!("pty reader finished: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

fn forward_stdin(mut writer: Box<dyn Write + Send>) {
    thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if writer
                        .write_all(&buf[..n])
                        .and_then(|_| writer.flush())
                        .is_err()
                    {
                        break;
                    }
                }
            }
        }
    });
}
