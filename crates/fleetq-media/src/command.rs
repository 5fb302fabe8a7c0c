//! Transformation command descriptor and runner.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// A transformation command: `program [args..] <input> <output>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformCommand {
    program: String,
    args: Vec<String>,
}

impl TransformCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add a fixed leading argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple fixed leading arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Parse a whitespace-separated command line such as `bash /opt/vf.sh`.
    pub fn parse(line: &str) -> MediaResult<Self> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| MediaError::invalid_transform("empty command"))?;
        Ok(Self::new(program).args(parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the full argument list for one job.
    pub fn build_args(&self, input: &str, output: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(input.to_string());
        args.push(output.to_string());
        args
    }
}

impl std::fmt::Display for TransformCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a finished command left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Stdout followed by stderr
    pub output: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs transformation commands to completion.
#[derive(Debug, Clone, Default)]
pub struct TransformRunner {
    timeout: Option<Duration>,
}

impl TransformRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the command once it has run this long.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `cmd` for one job and wait for it to exit.
    ///
    /// A non-zero exit is not an error; only failing to start the process
    /// or hitting the timeout is.
    pub async fn run(&self, cmd: &TransformCommand, input: &str, output: &str) -> MediaResult<CommandOutput> {
        let args = cmd.build_args(input, output);
        debug!("Running: {} {}", cmd.program(), args.join(" "));

        let child = Command::new(cmd.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Own process group, so a timeout reaches everything the command started.
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::spawn(cmd.program(), e))?;
        let pid = child.id();

        let started = Instant::now();
        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    if let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) {
                        if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                            warn!(program = %cmd.program(), error = %e, "Failed to kill process group");
                        }
                    }
                    warn!(
                        program = %cmd.program(),
                        "Command timed out after {:?}, killed",
                        timeout
                    );
                    return Err(MediaError::Timeout(timeout));
                }
            },
            None => child.wait_with_output().await?,
        };

        let mut combined = result.stdout;
        combined.extend_from_slice(&result.stderr);

        debug!(
            program = %cmd.program(),
            exit_code = ?result.status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );

        Ok(CommandOutput {
            exit_code: result.status.code(),
            output: combined,
        })
    }
}

/// Check that a program resolves on `PATH`.
pub fn check_program(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::ProgramNotFound(program.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> TransformCommand {
        TransformCommand::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_build_args_appends_locations() {
        let cmd = TransformCommand::parse("bash /opt/vf-wav-s3.sh").unwrap();
        assert_eq!(cmd.program(), "bash");
        assert_eq!(
            cmd.build_args("s3://b/in/a.wav", "s3://b/out/a.wav"),
            vec!["/opt/vf-wav-s3.sh", "s3://b/in/a.wav", "s3://b/out/a.wav"]
        );
        assert_eq!(cmd.to_string(), "bash /opt/vf-wav-s3.sh");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(matches!(
            TransformCommand::parse("   "),
            Err(MediaError::InvalidTransform(_))
        ));
    }

    #[tokio::test]
    async fn test_run_captures_stdout_then_stderr() {
        let cmd = shell("printf 'in=%s ' \"$0\"; printf 'err' >&2; printf 'out=%s' \"$1\"");
        let result = TransformRunner::new().run(&cmd, "A", "B").await.unwrap();

        assert!(result.success());
        assert_eq!(result.output, b"in=A out=Berr".to_vec());
    }

    #[tokio::test]
    async fn test_run_reports_nonzero_exit() {
        let result = TransformRunner::new()
            .run(&shell("printf boom; exit 3"), "A", "B")
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.output, b"boom".to_vec());
    }

    #[tokio::test]
    async fn test_run_kills_on_timeout() {
        let runner = TransformRunner::new().with_timeout(Duration::from_millis(200));
        let started = Instant::now();

        let result = runner.run(&shell("sleep 30"), "A", "B").await;
        assert!(matches!(result, Err(MediaError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_timeout_kills_background_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("late-write");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());
        let runner = TransformRunner::new().with_timeout(Duration::from_millis(200));

        let result = runner.run(&shell(&script), "A", "B").await;
        assert!(matches!(result, Err(MediaError::Timeout(_))));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "descendant kept running after the timeout");
    }

    #[test]
    fn test_timeout_message_keeps_sub_second_precision() {
        let err = MediaError::Timeout(Duration::from_millis(200));
        assert_eq!(err.to_string(), "Command timed out after 200ms");
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let cmd = TransformCommand::new("fleetq-definitely-not-a-program");
        let result = TransformRunner::new().run(&cmd, "A", "B").await;
        assert!(matches!(result, Err(MediaError::Spawn { .. })));
    }

    #[test]
    fn test_check_program() {
        assert!(check_program("sh").is_ok());
        assert!(check_program("fleetq-definitely-not-a-program").is_err());
    }
}
