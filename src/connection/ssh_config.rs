use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that points alias lookup at a different client config.
pub const SSH_CONFIG_ENV: &str = "MODX_SSH_CONFIG";

/// Resolve which ssh client configuration file to consult.
///
/// Order: explicit override, then `MODX_SSH_CONFIG`, then `~/.ssh/config`.
/// Returns `None` only when no override is given and no home directory exists.
pub fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env::var_os(SSH_CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(".ssh").join("config"))
}

/// Check whether `name` appears as a `Host <name>` line in the config at `path`.
///
/// A missing or unreadable file is not an error, the name is just not an alias.
pub fn has_host_entry(path: &Path, name: &str) -> bool {
    if !path.exists() {
        tracing::debug!("SSH config file not found at {:?}", path);
        return false;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read SSH config file {:?}: {}", path, e);
            return false;
        }
    };

    content.lines().any(|line| is_host_line_for(line, name))
}

fn is_host_line_for(line: &str, name: &str) -> bool {
    let line = line.trim();
    let (Some(keyword), Some(rest)) = (line.get(..4), line.get(4..)) else {
        return false;
    };
    if !keyword.eq_ignore_ascii_case("host") {
        return false;
    }

    // "Host" must be followed by whitespace, which also rules out "HostName".
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }

    rest.trim().eq_ignore_ascii_case(name)
}
