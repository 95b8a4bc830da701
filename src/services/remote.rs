//! Runs certificate scripts on the EVCC controller over SSH.
//!
//! Building the invocation is kept apart from running it so the argv and
//! environment can be checked without a reachable host.
//!
//! No HTTP route calls into this module; it is a library entry point for
//! operator tooling, configured from `CONFIG.remote`.

use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;

use crate::config::remote::RemoteConfig;
use crate::config::CONFIG;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote command failed (code: {code:?}, signal: {signal:?}): {stderr}")]
    CommandFailed {
        code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
    },

    #[error("Failed to reach {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured output of a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A fully resolved process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct RemoteShell {
    config: RemoteConfig,
}

impl RemoteShell {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    /// Shell for the host named by `HOSTNAME`/`PORT`/`USERNAME`/`PASSWORD`
    pub fn from_env() -> Self {
        Self::new(CONFIG.remote.clone())
    }

    pub fn target(&self) -> String {
        format!("{}@{}", self.config.username, self.config.host)
    }

    /// Arguments passed to `ssh` for `command`
    pub fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.config.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
        ];
        if self.config.password.is_none() {
            args.push("-o".to_string());
            args.push("BatchMode=yes".to_string());
        }
        args.push(self.target());
        args.push(command.to_string());
        args
    }

    /// With a password the call goes through `sshpass -e`, which reads it
    /// from `SSHPASS`
    pub fn invocation(&self, command: &str) -> Invocation {
        let ssh_args = self.ssh_args(command);
        match &self.config.password {
            Some(password) => {
                let mut args = vec!["-e".to_string(), "ssh".to_string()];
                args.extend(ssh_args);
                Invocation {
                    program: "sshpass".to_string(),
                    args,
                    envs: vec![("SSHPASS".to_string(), password.clone())],
                }
            }
            None => Invocation {
                program: "ssh".to_string(),
                args: ssh_args,
                envs: Vec::new(),
            },
        }
    }

    pub async fn execute(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        tracing::debug!(target_host = %self.target(), port = self.config.port, "Executing remote command");
        let invocation = self.invocation(command);
        run(&invocation, &self.target()).await
    }
}

/// Spawn `invocation` and wait for it. Non-zero exits become
/// [`RemoteError::CommandFailed`].
pub async fn run(invocation: &Invocation, target: &str) -> Result<CommandOutput, RemoteError> {
    let output = Command::new(&invocation.program)
        .args(&invocation.args)
        .envs(invocation.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| RemoteError::Connection {
            target: target.to_string(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        return Ok(CommandOutput { stdout, stderr });
    }

    tracing::warn!(
        target_host = %target,
        code = ?output.status.code(),
        "Remote command exited unsuccessfully"
    );
    Err(RemoteError::CommandFailed {
        code: output.status.code(),
        signal: exit_signal(&output.status),
        stderr,
    })
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(password: Option<&str>) -> RemoteShell {
        RemoteShell::new(RemoteConfig {
            host: "evcc.local".to_string(),
            port: 2222,
            username: "ops".to_string(),
            password: password.map(str::to_string),
        })
    }

    fn sh(script: &str) -> Invocation {
        Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            envs: vec![("GREETING".to_string(), "hello".to_string())],
        }
    }

    #[test]
    fn test_from_env_uses_global_config() {
        let shell = RemoteShell::from_env();
        assert_eq!(
            shell.target(),
            format!("{}@{}", CONFIG.remote.username, CONFIG.remote.host)
        );
        assert_eq!(shell.ssh_args("true")[1], CONFIG.remote.port.to_string());
    }

    #[test]
    fn test_key_based_invocation() {
        let invocation = shell(None).invocation("ls /certs");
        assert_eq!(invocation.program, "ssh");
        assert_eq!(invocation.args[..2], ["-p", "2222"]);
        assert!(invocation.args.contains(&"BatchMode=yes".to_string()));
        assert_eq!(invocation.args.last().unwrap(), "ls /certs");
        assert_eq!(invocation.args[invocation.args.len() - 2], "ops@evcc.local");
        assert!(invocation.envs.is_empty());
    }

    #[test]
    fn test_password_never_lands_in_argv() {
        let invocation = shell(Some("s3cret")).invocation("reboot");
        assert_eq!(invocation.program, "sshpass");
        assert_eq!(invocation.args[..2], ["-e", "ssh"]);
        assert!(!invocation.args.iter().any(|a| a.contains("s3cret")));
        assert!(!invocation.args.contains(&"BatchMode=yes".to_string()));
        assert_eq!(
            invocation.envs,
            vec![("SSHPASS".to_string(), "s3cret".to_string())]
        );
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let output = run(&sh("echo \"$GREETING\"; echo warn >&2"), "local")
            .await
            .unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "warn\n");
    }

    #[tokio::test]
    async fn test_run_reports_exit_code_and_stderr() {
        let err = run(&sh("echo broken >&2; exit 3"), "local")
            .await
            .unwrap_err();
        match err {
            RemoteError::CommandFailed {
                code,
                signal,
                stderr,
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(signal, None);
                assert_eq!(stderr, "broken\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_connection_error() {
        let invocation = Invocation {
            program: "/nonexistent/ssh-binary".to_string(),
            args: Vec::new(),
            envs: Vec::new(),
        };
        let err = run(&invocation, "ops@evcc.local").await.unwrap_err();
        assert!(matches!(err, RemoteError::Connection { .. }));
        assert!(err.to_string().contains("ops@evcc.local"));
    }
}
