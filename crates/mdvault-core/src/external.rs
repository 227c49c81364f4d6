//! Delegation to the external vault CLI
//!
//! Task, project, context, macro and capture operations belong to a separate
//! command-line tool. This module only builds argument lists, runs the
//! process, and passes its output through; it never parses that output.

use crate::error::{VaultError, VaultResult};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Environment variable telling the child which vault to operate on
pub const VAULT_PATH_ENV: &str = "MARKDOWN_VAULT_PATH";

/// Result of running the external tool
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    /// Program path and arguments, space-joined
    pub command_line: String,
}

impl CommandOutput {
    /// Text handed back to the caller: trimmed stdout on success, otherwise
    /// the command line followed by stderr and stdout.
    #[must_use]
    pub fn into_text(self) -> String {
        if self.success {
            self.stdout.trim().to_string()
        } else {
            format!(
                "Error executing command: {}\n{}\n{}",
                self.command_line, self.stderr, self.stdout
            )
        }
    }
}

/// Argument list builder for the external tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    args: Vec<String>,
}

impl CliArgs {
    /// Start with the subcommand words, e.g. `["project", "list"]`.
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: command.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Positional argument, only when present
    #[must_use]
    pub fn arg_opt(self, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.arg(value),
            None => self,
        }
    }

    /// `--name` when `enabled`
    #[must_use]
    pub fn flag(mut self, name: &str, enabled: bool) -> Self {
        if enabled {
            self.args.push(format!("--{name}"));
        }
        self
    }

    /// `--name value`
    #[must_use]
    pub fn opt(mut self, name: &str, value: impl Display) -> Self {
        self.args.push(format!("--{name}"));
        self.args.push(value.to_string());
        self
    }

    /// `--name value`, only when present
    #[must_use]
    pub fn opt_some(self, name: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.opt(name, value),
            None => self,
        }
    }

    /// `--var key=value`
    #[must_use]
    pub fn var(self, key: &str, value: &str) -> Self {
        self.opt("var", format!("{key}={value}"))
    }

    /// One `--var key=value` per pair, in iteration order
    #[must_use]
    pub fn vars<'a, I>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        vars.into_iter().fold(self, |args, (k, v)| args.var(k, v))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.args
    }
}

/// The external CLI, bound to one vault
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: String,
    vault_root: PathBuf,
}

impl ExternalTool {
    pub fn new(program: impl Into<String>, vault_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            vault_root: vault_root.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full path of the executable, searched on `PATH`.
    pub fn locate(&self) -> VaultResult<PathBuf> {
        which::which(&self.program).map_err(|_| VaultError::ExternalToolMissing {
            program: self.program.clone(),
        })
    }

    /// Run the tool and capture everything it produced.
    ///
    /// A non-zero exit is not an error here; only a missing executable or a
    /// failure to spawn is.
    pub async fn execute(&self, args: &CliArgs) -> VaultResult<CommandOutput> {
        let executable = self.locate()?;
        let command_line = command_line(&executable, args.as_slice());
        tracing::debug!("Running {}", command_line);

        let output = Command::new(&executable)
            .args(args.as_slice())
            .env(VAULT_PATH_ENV, &self.vault_root)
            .current_dir(&self.vault_root)
            .output()
            .await
            .map_err(|e| VaultError::io(&executable, e))?;

        if !output.status.success() {
            tracing::warn!("{} exited with {:?}", command_line, output.status.code());
        }

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            command_line,
        })
    }

    /// Run the tool and return its output as caller-facing text.
    pub async fn run(&self, args: &CliArgs) -> VaultResult<String> {
        Ok(self.execute(args).await?.into_text())
    }
}

fn command_line(executable: &Path, args: &[String]) -> String {
    std::iter::once(executable.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_args_builder() {
        let mut vars = BTreeMap::new();
        vars.insert("who".to_string(), "me".to_string());

        let args = CliArgs::new(["capture", "inbox"])
            .flag("batch", true)
            .flag("dry-run", false)
            .var("text", "hello world")
            .vars(&vars)
            .opt_some("limit", Some(5))
            .opt_some("folder", None::<&str>)
            .arg_opt(Some("extra"));

        assert_eq!(
            args.as_slice(),
            [
                "capture",
                "inbox",
                "--batch",
                "--var",
                "text=hello world",
                "--var",
                "who=me",
                "--limit",
                "5",
                "extra"
            ]
        );
    }

    #[test]
    fn test_failure_text_includes_command_and_streams() {
        let output = CommandOutput {
            success: false,
            stdout: "partial".into(),
            stderr: "boom".into(),
            exit_code: Some(2),
            command_line: "/usr/bin/mdv task list".into(),
        };
        assert_eq!(
            output.into_text(),
            "Error executing command: /usr/bin/mdv task list\nboom\npartial"
        );
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let temp_dir = TempDir::new().unwrap();
        let tool = ExternalTool::new("definitely-not-a-real-mdvault-cli", temp_dir.path());
        let err = tool.run(&CliArgs::new(["task", "list"])).await.unwrap_err();
        assert!(matches!(err, VaultError::ExternalToolMissing { .. }));
        assert_eq!(
            err.to_string(),
            "Error: 'definitely-not-a-real-mdvault-cli' executable not found in PATH"
        );
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_child_sees_vault_path_and_output_is_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        let tool = ExternalTool::new("sh", temp_dir.path());
        let args = CliArgs::new(["-c", "echo \"$MARKDOWN_VAULT_PATH\""]);

        let text = tool.run(&args).await.unwrap();
        assert_eq!(text, temp_dir.path().display().to_string());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_nonzero_exit_is_passed_through() {
        let temp_dir = TempDir::new().unwrap();
        let tool = ExternalTool::new("sh", temp_dir.path());
        let args = CliArgs::new(["-c", "echo out; echo err >&2; exit 3"]);

        let output = tool.execute(&args).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        let text = output.into_text();
        assert!(text.starts_with("Error executing command: "));
        assert!(text.contains("\nerr\n"));
        assert!(text.ends_with("out\n"));
    }
}
