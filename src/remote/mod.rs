//! Building and running `ssh ... "modx <command> <args>"` invocations.

pub mod escape;
mod handler;
mod proxy;

use std::time::Duration;

pub use handler::RemoteHandler;
pub use proxy::RemoteCommandProxy;

pub const DEFAULT_REMOTE_PROGRAM: &str = "modx";

/// Remote admin commands can run long operations, so allow up to an hour.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);
