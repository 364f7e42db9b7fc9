use std::path::PathBuf;
use std::time::Duration;

use super::{RemoteCommandProxy, DEFAULT_REMOTE_PROGRAM, DEFAULT_TIMEOUT};
use crate::connection::ConnectionDescriptor;
use crate::error::Result;
use crate::process::{ProcessExecutor, SystemExecutor};

/// Entry point: connection string + command + args in, exit code out.
#[derive(Debug, Clone)]
pub struct RemoteHandler<E = SystemExecutor> {
    executor: E,
    ssh_config: Option<PathBuf>,
    program: String,
    timeout: Duration,
}

impl RemoteHandler<SystemExecutor> {
    pub fn new() -> Self {
        Self::with_executor(SystemExecutor::new())
    }
}

impl Default for RemoteHandler<SystemExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ProcessExecutor> RemoteHandler<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            ssh_config: None,
            program: DEFAULT_REMOTE_PROGRAM.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use this ssh client configuration for alias detection.
    pub fn ssh_config(mut self, path: Option<PathBuf>) -> Self {
        self.ssh_config = path;
        self
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn descriptor(&self, connection: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::parse_with_config(connection, self.ssh_config.as_deref())
    }

    pub fn proxy<'a>(
        &'a self,
        descriptor: &'a ConnectionDescriptor,
        command: &'a str,
        args: &'a [String],
    ) -> RemoteCommandProxy<'a, E> {
        RemoteCommandProxy::new(descriptor, command, args, &self.executor)
            .with_program(&self.program)
            .with_timeout(self.timeout)
    }

    /// Parse `connection`, assemble the ssh command line and run it.
    pub async fn execute(&self, connection: &str, command: &str, args: &[String]) -> Result<i32> {
        let descriptor = self.descriptor(connection);
        self.proxy(&descriptor, command, args).execute().await
    }
}
