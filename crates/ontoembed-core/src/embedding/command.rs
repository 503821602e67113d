use std::ffi::OsStr;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

/// A configured external program plus its leading arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExternalCommand {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
}

impl ExternalCommand {
    /// Split a whitespace-separated command line; `key` names the config
    /// entry it came from
    pub(crate) fn parse(command: &str, key: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| Error::ConfigError(format!("{} is empty", key)))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Run with `extra` appended to the configured arguments
    ///
    /// Returns trimmed stdout on success. On failure the reason is the
    /// trimmed stderr, or the exit status if stderr was empty.
    pub(crate) fn run<I, S>(&self, extra: I) -> std::result::Result<String, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        debug!(program = %self.program, "Running external command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .output()
            .map_err(|e| format!("failed to run {}: {}", self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
