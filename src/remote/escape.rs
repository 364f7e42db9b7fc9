//! Quoting for the two shells a remote command passes through: the local
//! shell that launches `ssh`, and the remote login shell.

use std::borrow::Cow;

/// Quote one word for a POSIX shell. Plain words are returned unchanged.
pub fn quote_arg(arg: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(arg))
}

/// Quote a remote working directory while keeping a leading `~` expandable.
pub fn quote_path(path: &str) -> Cow<'_, str> {
    if path == "~" {
        return Cow::Borrowed(path);
    }

    match path.strip_prefix("~/") {
        Some("") => Cow::Borrowed(path),
        Some(rest) => Cow::Owned(format!("~/{}", quote_arg(rest))),
        None => quote_arg(path),
    }
}

/// Command names like `cache:clear` pass through as is; anything else gets quoted.
pub fn quote_command_name(name: &str) -> Cow<'_, str> {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.'));

    if plain {
        Cow::Borrowed(name)
    } else {
        quote_arg(name)
    }
}

/// Wrap `s` in double quotes, escaping the characters that stay special
/// inside them so the local shell passes `s` through byte for byte.
pub fn double_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
