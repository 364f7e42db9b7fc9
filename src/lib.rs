//! Run modx CLI commands on a remote host through the system `ssh` client.
//!
//! A short connection string such as `deploy@example.com:2222/var/www` (or a
//! bare ssh config alias) is parsed into a [`ConnectionDescriptor`], turned
//! into an `ssh` command line by [`RemoteCommandProxy`] and run by a
//! [`ProcessExecutor`]. [`RemoteHandler`] ties the three together.

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod process;
pub mod remote;

pub use connection::ConnectionDescriptor;
pub use error::{Error, Result};
pub use process::{ProcessExecutor, StreamKind, SystemExecutor, TIMEOUT_EXIT_CODE};
pub use remote::{RemoteCommandProxy, RemoteHandler};
