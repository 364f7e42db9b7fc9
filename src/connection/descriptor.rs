use std::fmt;
use std::path::{Path, PathBuf};

use super::{current_user, ssh_config, DEFAULT_SSH_PORT};

/// A parsed `[user@]host[:port][path]` connection string, or an ssh config alias.
///
/// Alias descriptors carry only the host name. User, port and path for them
/// come from the ssh client configuration at connect time.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    original: String,
    user: Option<String>,
    host: String,
    port: Option<u16>,
    path: Option<String>,
    alias: bool,
    config_override: Option<PathBuf>,
}

impl ConnectionDescriptor {
    /// Parse against the default ssh client configuration.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with_config(raw, None)
    }

    /// Parse, consulting `config_override` instead of the default client config
    /// for alias detection. Never fails: the worst case is a bare host.
    pub fn parse_with_config(raw: &str, config_override: Option<&Path>) -> Self {
        let config_override = config_override.map(Path::to_path_buf);

        if alias_lookup(raw, config_override.as_deref()) {
            tracing::debug!("Connection '{}' resolved as ssh config alias", raw);
            return Self {
                original: raw.to_string(),
                user: None,
                host: raw.to_string(),
                port: None,
                path: None,
                alias: true,
                config_override,
            };
        }

        let (user, rest) = match raw.split_once('@') {
            Some((user, rest)) => (user.to_string(), rest),
            None => (current_user(), raw),
        };
        let (host, port, path) = split_host_port_path(rest);

        tracing::debug!(
            "Parsed connection '{}': user={} host={} port={} path={:?}",
            raw,
            user,
            host,
            port,
            path
        );

        Self {
            original: raw.to_string(),
            user: Some(user),
            host: host.to_string(),
            port: Some(port),
            path: path.map(str::to_string),
            alias: false,
            config_override,
        }
    }

    /// The connection string exactly as it was typed.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `None` for aliases, otherwise the explicit port or 22.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Re-check the ssh client configuration for a `Host` entry matching the
    /// original string. Not cached, so edits to the config are picked up.
    pub fn is_alias(&self) -> bool {
        alias_lookup(&self.original, self.config_override.as_deref())
    }
}

/// Renders the descriptor as it was classified at parse time. Unlike
/// [`ConnectionDescriptor::is_alias`], this does not re-read the ssh config,
/// so the rendering of a given descriptor never changes.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alias {
            return f.write_str(&self.host);
        }

        if let Some(user) = self.user.as_deref().filter(|u| !u.is_empty()) {
            write!(f, "{}@", user)?;
        }
        f.write_str(&self.host)?;

        let port = self.port.unwrap_or(DEFAULT_SSH_PORT);
        if port != DEFAULT_SSH_PORT {
            write!(f, ":{}", port)?;
        }

        if let Some(path) = &self.path {
            // Relative paths need the colon back or they would merge into the host.
            if port == DEFAULT_SSH_PORT && !path.starts_with(|c: char| c == '/' || c == '~') {
                f.write_str(":")?;
            }
            f.write_str(path)?;
        }

        Ok(())
    }
}

fn alias_lookup(raw: &str, config_override: Option<&Path>) -> bool {
    if raw.contains(|c: char| c == '@' || c == ':') {
        return false;
    }

    match ssh_config::resolve_config_path(config_override) {
        Some(path) => ssh_config::has_host_entry(&path, raw),
        None => false,
    }
}

/// Split `host[:port][path]`. The first colon wins; digits right after it are
/// the port, anything else after it is the path.
fn split_host_port_path(rest: &str) -> (&str, u16, Option<&str>) {
    if let Some((host, after)) = rest.split_once(':') {
        let digits = after.bytes().take_while(|b| b.is_ascii_digit()).count();
        if digits > 0 {
            if let Ok(port) = after[..digits].parse::<u16>() {
                return (host, port, non_empty(&after[digits..]));
            }
        }
        return (host, DEFAULT_SSH_PORT, non_empty(after));
    }

    match rest.find(|c: char| c == '/' || c == '~') {
        Some(idx) => (&rest[..idx], DEFAULT_SSH_PORT, non_empty(&rest[idx..])),
        None => (rest, DEFAULT_SSH_PORT, None),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
