// file: src/models/execution.rs
// description: Outcome of a shell command run through one of the supported shells
// reference: serialized verbatim as MCP tool output

use serde::{Deserialize, Serialize};

/// Either the captured output of a finished process or the reason it could
/// not run to completion. A non-zero exit code still counts as `success`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExecutionResult {
    Completed {
        success: bool,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        shell: String,
    },
    Failed {
        success: bool,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        shell: Option<String>,
    },
}

impl ExecutionResult {
    pub fn completed(exit_code: Option<i32>, stdout: String, stderr: String, shell: &str) -> Self {
        ExecutionResult::Completed {
            success: true,
            exit_code,
            stdout,
            stderr,
            shell: shell.to_string(),
        }
    }

    pub fn failed(error: impl Into<String>, shell: Option<&str>) -> Self {
        ExecutionResult::Failed {
            success: false,
            error: error.into(),
            shell: shell.map(str::to_string),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Completed { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionResult::Completed { exit_code, .. } => *exit_code,
            ExecutionResult::Failed { .. } => None,
        }
    }

    pub fn stdout(&self) -> Option<&str> {
        match self {
            ExecutionResult::Completed { stdout, .. } => Some(stdout),
            ExecutionResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionResult::Failed { error, .. } => Some(error),
            ExecutionResult::Completed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completed_wire_shape() {
        let result = ExecutionResult::completed(Some(0), "hi\n".into(), String::new(), "sh");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "exit_code": 0, "stdout": "hi\n", "stderr": "", "shell": "sh"})
        );
    }

    #[test]
    fn test_failed_without_shell_omits_field() {
        let result = ExecutionResult::failed("Command parameter is required", None);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": false, "error": "Command parameter is required"})
        );
        assert!(!result.is_success());
    }
}
