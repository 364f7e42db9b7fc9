use std::time::Duration;

use super::escape::{double_quote, quote_arg, quote_command_name, quote_path};
use super::{DEFAULT_REMOTE_PROGRAM, DEFAULT_TIMEOUT};
use crate::connection::{ConnectionDescriptor, DEFAULT_SSH_PORT};
use crate::error::Result;
use crate::process::{forward_to_local, ProcessExecutor};

/// Turns a connection descriptor plus a modx command into one `ssh` command
/// line and runs it.
pub struct RemoteCommandProxy<'a, E> {
    descriptor: &'a ConnectionDescriptor,
    command: &'a str,
    args: &'a [String],
    executor: &'a E,
    program: &'a str,
    timeout: Duration,
}

impl<'a, E: ProcessExecutor> RemoteCommandProxy<'a, E> {
    pub fn new(
        descriptor: &'a ConnectionDescriptor,
        command: &'a str,
        args: &'a [String],
        executor: &'a E,
    ) -> Self {
        Self {
            descriptor,
            command,
            args,
            executor,
            program: DEFAULT_REMOTE_PROGRAM,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Program to invoke on the remote side instead of `modx`.
    pub fn with_program(mut self, program: &'a str) -> Self {
        self.program = program;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `user@host`, or just the host for aliases and empty users.
    pub fn target(&self) -> String {
        match self.descriptor.user().filter(|u| !u.is_empty()) {
            Some(user) => format!("{}@{}", user, self.descriptor.host()),
            None => self.descriptor.host().to_string(),
        }
    }

    pub fn ssh_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        if let Some(port) = self.descriptor.port().filter(|p| *p != DEFAULT_SSH_PORT) {
            options.push("-p".to_string());
            options.push(port.to_string());
        }
        options
    }

    /// The command as the remote shell should see it, including any `cd` prefix.
    pub fn remote_command(&self) -> String {
        let mut remote = String::new();

        if let Some(path) = self.descriptor.path().filter(|p| !p.is_empty()) {
            remote.push_str("cd ");
            remote.push_str(&quote_path(path));
            remote.push_str(" && ");
        }

        remote.push_str(&quote_arg(self.program));
        remote.push(' ');
        remote.push_str(&quote_command_name(self.command));
        for arg in self.args {
            remote.push(' ');
            remote.push_str(&quote_arg(arg));
        }

        remote
    }

    /// The full local command line: `ssh [-p PORT] TARGET "REMOTE COMMAND"`.
    pub fn command_line(&self) -> String {
        let mut parts = vec!["ssh".to_string()];
        parts.extend(self.ssh_options());
        parts.push(quote_arg(&self.target()).into_owned());
        parts.push(double_quote(&self.remote_command()));
        parts.join(" ")
    }

    /// Run the command, streaming its output to the local stdout and stderr.
    /// The exit code is returned exactly as the executor reports it.
    pub async fn execute(&self) -> Result<i32> {
        let command_line = self.command_line();
        tracing::info!(
            "Running on {}: {}",
            self.descriptor.original(),
            command_line
        );

        let mut forward = forward_to_local;
        let code = self
            .executor
            .run(&command_line, self.timeout, true, Some(&mut forward))
            .await?;

        tracing::debug!("Remote command finished with exit code {}", code);
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::OutputCallback;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(String, Duration, bool)>>,
    }

    impl ProcessExecutor for RecordingExecutor {
        async fn run(
            &self,
            command_line: &str,
            timeout: Duration,
            interactive: bool,
            on_output: Option<OutputCallback<'_>>,
        ) -> Result<i32> {
            assert!(on_output.is_some());
            self.calls
                .lock()
                .unwrap()
                .push((command_line.to_string(), timeout, interactive));
            Ok(0)
        }
    }

    fn descriptor(raw: &str) -> ConnectionDescriptor {
        let config = NamedTempFile::new().unwrap();
        ConnectionDescriptor::parse_with_config(raw, Some(config.path()))
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn default_port_with_path() {
        let d = descriptor("deploy@prod.example.com/var/www");
        let executor = RecordingExecutor::default();
        let no_args: Vec<String> = Vec::new();
        let proxy = RemoteCommandProxy::new(&d, "cache:clear", &no_args, &executor);

        let line = proxy.command_line();
        assert!(!line.contains("-p"));
        assert!(line.contains("cd /var/www &&"));
        assert!(line.contains("modx cache:clear"));
        assert_eq!(
            line,
            "ssh 'deploy@prod.example.com' \"cd /var/www && modx cache:clear\""
        );
    }

    #[test]
    fn custom_port_without_path() {
        let d = descriptor("deploy@prod.example.com:2222");
        let executor = RecordingExecutor::default();
        let no_args: Vec<String> = Vec::new();
        let proxy = RemoteCommandProxy::new(&d, "cache:clear", &no_args, &executor);

        let line = proxy.command_line();
        assert!(line.contains("-p 2222"));
        assert!(!line.contains("cd "));
        assert_eq!(
            line,
            "ssh -p 2222 'deploy@prod.example.com' \"modx cache:clear\""
        );
    }

    #[test]
    fn alias_has_no_port_or_cd() {
        let mut config = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut config, b"Host prod\n").unwrap();
        let d = ConnectionDescriptor::parse_with_config("prod", Some(config.path()));

        let executor = RecordingExecutor::default();
        let no_args: Vec<String> = Vec::new();
        let proxy = RemoteCommandProxy::new(&d, "version", &no_args, &executor);

        assert_eq!(proxy.target(), "prod");
        assert_eq!(proxy.command_line(), "ssh prod \"modx version\"");
    }

    #[test]
    fn empty_user_targets_bare_host() {
        let d = descriptor("@example.com");
        let executor = RecordingExecutor::default();
        let no_args: Vec<String> = Vec::new();
        let proxy = RemoteCommandProxy::new(&d, "version", &no_args, &executor);
        assert_eq!(proxy.target(), "example.com");
    }

    #[test]
    fn arguments_are_escaped_individually() {
        let d = descriptor("deploy@example.com~/site");
        let executor = RecordingExecutor::default();
        let values = args(&["Home page", "a&b", "<b>", "say \"hi\"", "it's", "$HOME"]);
        let proxy = RemoteCommandProxy::new(&d, "resource:create", &values, &executor);

        assert_eq!(
            proxy.remote_command(),
            "cd ~/site && modx resource:create 'Home page' 'a&b' '<b>' 'say \"hi\"' 'it'\\''s' '$HOME'"
        );
    }

    #[test]
    fn custom_program() {
        let d = descriptor("deploy@example.com");
        let executor = RecordingExecutor::default();
        let no_args: Vec<String> = Vec::new();
        let proxy = RemoteCommandProxy::new(&d, "list", &no_args, &executor)
            .with_program("/opt/modx/bin/modx");
        assert_eq!(proxy.remote_command(), "/opt/modx/bin/modx list");
    }

    #[tokio::test]
    async fn execute_runs_interactively_with_long_timeout() {
        let d = descriptor("deploy@example.com:2200/var/www");
        let executor = RecordingExecutor::default();
        let values = args(&["--force"]);
        let proxy = RemoteCommandProxy::new(&d, "cache:clear", &values, &executor);

        let code = proxy.execute().await.unwrap();
        assert_eq!(code, 0);

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (line, timeout, interactive) = &calls[0];
        assert_eq!(
            line,
            "ssh -p 2200 'deploy@example.com' \"cd /var/www && modx cache:clear --force\""
        );
        assert_eq!(*timeout, Duration::from_secs(3600));
        assert!(*interactive);
    }
}
