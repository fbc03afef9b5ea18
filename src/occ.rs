use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::config::Config;
use crate::report::Reporter;

/// Uniform outcome of an occ invocation. stdout/stderr are populated only
/// when capture was requested; otherwise they went straight to the
/// operator's terminal.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

#[derive(Debug, Error)]
pub enum OccError {
    #[error("unable to execute `{command}`; ensure PHP is installed and the occ path points at your Nextcloud installation")]
    ToolMissing { command: String },

    #[error("{description} failed: {detail}")]
    Failed {
        description: String,
        code: Option<i32>,
        detail: String,
    },
}

/// Gateway to the Nextcloud administrative CLI. Every call is a blocking
/// external-process invocation; nothing is retried.
pub trait AdminTool {
    /// Runs `occ <args>`. A non-zero exit is an error when `fatal`, and a
    /// reported warning with `Ok(None)` otherwise. A missing executable is
    /// always an error, whatever `fatal` says.
    fn run(
        &self,
        args: &[&str],
        capture: bool,
        fatal: bool,
        description: &str,
    ) -> Result<Option<CommandOutput>, OccError>;
}

pub struct OccClient<'a> {
    php: String,
    occ: PathBuf,
    reporter: &'a dyn Reporter,
}

impl<'a> OccClient<'a> {
    pub fn new(config: &Config, reporter: &'a dyn Reporter) -> Self {
        Self {
            php: config.php.clone(),
            occ: config.occ.clone(),
            reporter,
        }
    }

    fn failure(
        &self,
        description: &str,
        code: Option<i32>,
        stderr: Option<String>,
        fatal: bool,
    ) -> Result<Option<CommandOutput>, OccError> {
        let detail = match stderr.as_deref().map(str::trim) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => match code {
                Some(code) => format!("command exited with status {}", code),
                None => "command was terminated by a signal".to_string(),
            },
        };
        if fatal {
            return Err(OccError::Failed {
                description: description.to_string(),
                code,
                detail,
            });
        }
        self.reporter.warning(description, &detail);
        Ok(None)
    }
}

impl AdminTool for OccClient<'_> {
    fn run(
        &self,
        args: &[&str],
        capture: bool,
        fatal: bool,
        description: &str,
    ) -> Result<Option<CommandOutput>, OccError> {
        let mut cmd = Command::new(&self.php);
        cmd.arg(self.occ.as_os_str()).args(args);
        tracing::debug!(occ = %self.occ.display(), ?args, capture, fatal, "run occ");

        if capture {
            match cmd.output() {
                Ok(out) if out.status.success() => Ok(Some(CommandOutput {
                    code: out.status.code(),
                    stdout: Some(String::from_utf8_lossy(&out.stdout).into_owned()),
                    stderr: Some(String::from_utf8_lossy(&out.stderr).into_owned()),
                })),
                Ok(out) => self.failure(
                    description,
                    out.status.code(),
                    Some(String::from_utf8_lossy(&out.stderr).into_owned()),
                    fatal,
                ),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OccError::ToolMissing {
                    command: format!("{} {}", self.php, self.occ.display()),
                }),
                Err(e) => self.failure(description, None, Some(e.to_string()), fatal),
            }
        } else {
            match cmd.status() {
                Ok(status) if status.success() => Ok(Some(CommandOutput {
                    code: status.code(),
                    stdout: None,
                    stderr: None,
                })),
                Ok(status) => self.failure(description, status.code(), None, fatal),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OccError::ToolMissing {
                    command: format!("{} {}", self.php, self.occ.display()),
                }),
                Err(e) => self.failure(description, None, Some(e.to_string()), fatal),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemReporter;

    fn client<'a>(php: &str, reporter: &'a MemReporter) -> OccClient<'a> {
        OccClient {
            php: php.to_string(),
            occ: PathBuf::from("occ"),
            reporter,
        }
    }

    #[test]
    fn missing_tool_is_fatal_even_when_marked_non_fatal() {
        let reporter = MemReporter::default();
        let occ = client("/definitely/not/installed/php", &reporter);
        let err = occ
            .run(&["--version"], false, false, "availability check")
            .unwrap_err();
        assert!(matches!(err, OccError::ToolMissing { .. }));
    }

    #[test]
    fn captured_output_round_trips() {
        // `echo occ status --something` stands in for a php occ run
        let reporter = MemReporter::default();
        let occ = client("echo", &reporter);
        let out = occ
            .run(&["status", "--something"], true, true, "status")
            .unwrap()
            .unwrap();
        assert_eq!(out.code, Some(0));
        assert!(out.stdout.unwrap().contains("status --something"));
    }

    #[test]
    fn non_fatal_failure_is_reported_and_swallowed() {
        let reporter = MemReporter::default();
        let occ = client("false", &reporter);
        let out = occ
            .run(&["user:setting"], false, false, "setting pronouns")
            .unwrap();
        assert!(out.is_none());
        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].0, "setting pronouns");
    }

    #[test]
    fn fatal_failure_carries_description_and_status() {
        let reporter = MemReporter::default();
        let occ = client("false", &reporter);
        let err = occ
            .run(&["user:add"], false, true, "user creation")
            .unwrap_err();
        match err {
            OccError::Failed {
                description, code, ..
            } => {
                assert_eq!(description, "user creation");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
