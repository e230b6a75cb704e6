// file: src/shell/kind.rs
// description: Supported shells, their display names and Windows path translation
// reference: internal module structure

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Cmd,
    PowerShell,
    Wsl,
    GitBash,
    Sh,
}

impl ShellKind {
    pub const ALL: [ShellKind; 5] = [
        ShellKind::Cmd,
        ShellKind::PowerShell,
        ShellKind::Wsl,
        ShellKind::GitBash,
        ShellKind::Sh,
    ];

    /// Label reported in the `shell` field of every execution result
    pub fn display_name(self) -> &'static str {
        match self {
            ShellKind::Cmd => "CMD",
            ShellKind::PowerShell => "PowerShell",
            ShellKind::Wsl => "WSL/Ubuntu",
            ShellKind::GitBash => "Git Bash",
            ShellKind::Sh => "sh",
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// `C:\Users\me` -> `/mnt/c/Users/me`
pub fn to_wsl_path(windows_path: &str) -> String {
    translate_drive(windows_path, "/mnt/")
}

/// `C:\Users\me` -> `/c/Users/me`
pub fn to_git_bash_path(windows_path: &str) -> String {
    translate_drive(windows_path, "/")
}

fn translate_drive(path: &str, mount_prefix: &str) -> String {
    let forward = path.replace('\\', "/");
    let mut chars = forward.chars();

    match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            format!(
                "{}{}{}",
                mount_prefix,
                drive.to_ascii_lowercase(),
                &forward[2..]
            )
        }
        _ => forward,
    }
}

/// Single-quotes a value for a POSIX shell command line.
pub fn posix_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
