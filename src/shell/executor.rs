// file: src/shell/executor.rs
// description: Spawns a command in the selected shell and waits for it with a timeout
// reference: https://docs.rs/tokio/latest/tokio/process/

use crate::config::ShellConfig;
use crate::error::{Result, ToolkitError};
use crate::models::ExecutionResult;
use crate::shell::kind::{ShellKind, posix_quote, to_git_bash_path, to_wsl_path};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

const GIT_BASH_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Git\bin\bash.exe",
    r"C:\Program Files (x86)\Git\bin\bash.exe",
];

#[derive(Debug, Clone)]
pub struct ShellExecutor {
    default_timeout_secs: u64,
    git_bash: Option<PathBuf>,
}

impl ShellExecutor {
    pub fn new(config: &ShellConfig) -> Self {
        let git_bash = locate_git_bash(config.git_bash_path.as_deref());
        match &git_bash {
            Some(path) => info!("Git Bash found at {}", path.display()),
            None => debug!("Git Bash not found"),
        }

        Self {
            default_timeout_secs: config.default_timeout_secs,
            git_bash,
        }
    }

    pub fn default_timeout_secs(&self) -> u64 {
        self.default_timeout_secs
    }

    /// Runs `command` and never fails: spawn errors, missing shells and
    /// timeouts are reported inside the returned result.
    pub async fn execute(
        &self,
        kind: ShellKind,
        command: &str,
        working_dir: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> ExecutionResult {
        if command.trim().is_empty() {
            return ExecutionResult::failed("Command parameter is required", None);
        }

        let timeout = timeout_secs
            .filter(|&t| t > 0)
            .unwrap_or(self.default_timeout_secs);
        let working_dir = working_dir.filter(|d| !d.trim().is_empty());

        info!("Executing in {} (timeout {}s): {}", kind, timeout, command);

        match self.run(kind, command, working_dir, timeout).await {
            Ok(result) => result,
            Err(e) => {
                warn!("{} execution failed: {}", kind, e);
                // OS errors are relayed without the crate's "IO error" prefix
                let message = match e {
                    ToolkitError::Io(inner) => inner.to_string(),
                    other => other.to_string(),
                };
                ExecutionResult::failed(message, Some(kind.display_name()))
            }
        }
    }

    /// Whether the shell's executable can be found on this machine
    pub async fn is_available(&self, kind: ShellKind) -> bool {
        match kind {
            ShellKind::Cmd => which::which("cmd").is_ok(),
            ShellKind::PowerShell => which::which("powershell").is_ok(),
            ShellKind::Wsl => wsl_ready().await,
            ShellKind::GitBash => self.git_bash.is_some(),
            ShellKind::Sh => which::which("sh").is_ok(),
        }
    }

    async fn run(
        &self,
        kind: ShellKind,
        command: &str,
        working_dir: Option<&str>,
        timeout: u64,
    ) -> Result<ExecutionResult> {
        if kind == ShellKind::Wsl && !wsl_ready().await {
            return Err(ToolkitError::ShellUnavailable(
                "WSL is not installed or not configured properly".to_string(),
            ));
        }

        let mut cmd = self.build_command(kind, command, working_dir)?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()?;

        // dropping the wait future on timeout drops the child, which kills it
        let output = tokio::time::timeout(Duration::from_secs(timeout), child.wait_with_output())
            .await
            .map_err(|_| ToolkitError::Timeout(timeout))??;

        debug!("{} exited with {:?}", kind, output.status.code());

        Ok(ExecutionResult::completed(
            output.status.code(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            kind.display_name(),
        ))
    }

    fn build_command(
        &self,
        kind: ShellKind,
        command: &str,
        working_dir: Option<&str>,
    ) -> Result<Command> {
        let cmd = match kind {
            ShellKind::Cmd => {
                let mut c = Command::new("cmd.exe");
                c.args(["/c", command]);
                with_cwd(c, working_dir)
            }
            ShellKind::PowerShell => {
                let mut c = Command::new("powershell.exe");
                c.args(["-NoProfile", "-NonInteractive", "-Command", command]);
                with_cwd(c, working_dir)
            }
            ShellKind::Wsl => {
                let script = prefixed_with_cd(command, working_dir.map(to_wsl_path));
                let mut c = Command::new("wsl.exe");
                c.args(["-e", "bash", "-c", script.as_str()]);
                c
            }
            ShellKind::GitBash => {
                let bash = self.git_bash.as_ref().ok_or_else(|| {
                    ToolkitError::ShellUnavailable(
                        "Git Bash not found. Please install Git for Windows.".to_string(),
                    )
                })?;
                let script = prefixed_with_cd(command, working_dir.map(to_git_bash_path));
                let mut c = Command::new(bash);
                c.args(["-c", script.as_str()]);
                c
            }
            ShellKind::Sh => {
                let mut c = Command::new("sh");
                c.args(["-c", command]);
                with_cwd(c, working_dir)
            }
        };
        Ok(cmd)
    }
}

fn with_cwd(mut cmd: Command, working_dir: Option<&str>) -> Command {
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

fn prefixed_with_cd(command: &str, dir: Option<String>) -> String {
    match dir {
        Some(dir) => format!("cd {} && {}", posix_quote(&dir), command),
        None => command.to_string(),
    }
}

async fn wsl_ready() -> bool {
    if which::which("wsl").is_err() {
        return false;
    }

    Command::new("wsl.exe")
        .arg("--status")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

fn locate_git_bash(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        warn!("Configured git_bash_path {} does not exist", path.display());
    }

    let local_install = std::env::var_os("LOCALAPPDATA")
        .map(|dir| PathBuf::from(dir).join(r"Programs\Git\bin\bash.exe"));

    GIT_BASH_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .chain(local_install)
        .find(|p| p.exists())
        .or_else(|| {
            which::which("bash")
                .ok()
                .filter(|p| p.to_string_lossy().to_lowercase().contains("git"))
        })
}
