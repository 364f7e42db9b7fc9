//! Connection strings such as `user@host:2222/var/www` and how they resolve.

mod descriptor;
pub mod ssh_config;

pub use descriptor::ConnectionDescriptor;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Name of the user running this process, used when a connection string has no `user@`.
pub fn current_user() -> String {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|user| !user.is_empty())
        .unwrap_or_else(|| "root".to_string())
}
