use std::{
    io::{self, ErrorKind, Read, Write},
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use log::{debug, warn};
use xtag_proto::ports::typeset::{
    MathMode, TypesetError, TypesetOutput, TypesetPort, TypesetRequest,
};

/// Environment variable telling the command which layout was requested.
pub const MODE_ENV: &str = "XTAG_MATH_MODE";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// [`TypesetPort`] implementation that pipes the source through a shell command.
///
/// The command reads TeX on stdin and prints the rendered text on stdout. A
/// non-zero exit status rejects the source, with stderr as the diagnostic. A
/// command still running when the timeout elapses is killed.
#[derive(Debug, Clone)]
pub struct CommandTypesetter {
    command: String,
    timeout: Duration,
}

impl CommandTypesetter {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    fn timed_out(&self) -> TypesetError {
        TypesetError::Timeout {
            timeout: self.timeout,
        }
    }
}

impl TypesetPort for CommandTypesetter {
    fn typeset(&self, request: &TypesetRequest) -> Result<TypesetOutput, TypesetError> {
        let deadline = Instant::now() + self.timeout;
        let command = self.command.as_str();

        debug!(target: "xtag::typeset", "running `{command}` ({} mode)", request.mode);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env(MODE_ENV, request.mode.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| TypesetError::unavailable(format!("failed to spawn `{command}`: {err}")))?;

        feed_stdin(&mut child, request.source.clone());
        let output = collect_output(&mut child);

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!(target: "xtag::typeset", "`{command}` timed out after {:?}", self.timeout);
                terminate(&mut child, command);
                return Err(self.timed_out());
            }
            Err(err) => {
                terminate(&mut child, command);
                return Err(TypesetError::unavailable(format!(
                    "failed to wait for `{command}`: {err}"
                )));
            }
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        let (stdout, stderr) = match output.recv_timeout(remaining.max(POLL_INTERVAL)) {
            Ok(output) => output,
            Err(RecvTimeoutError::Timeout) => return Err(self.timed_out()),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TypesetError::unavailable(
                    "output reader terminated before sending result",
                ));
            }
        };

        interpret(command, status, &stdout, &stderr, request.mode)
    }
}

/// Writes the source from a separate thread so a command that never reads
/// stdin cannot block the caller. A command may exit without consuming all of
/// its input, so a closed pipe is not an error.
fn feed_stdin(child: &mut Child, source: String) {
    let Some(mut stdin) = child.stdin.take() else {
        return;
    };

    thread::spawn(move || match stdin.write_all(source.as_bytes()) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::BrokenPipe => {
            debug!(target: "xtag::typeset", "command closed stdin before reading the whole source");
        }
        Err(err) => warn!(target: "xtag::typeset", "failed to write source: {err}"),
    });
}

/// Drains stdout and stderr concurrently and delivers both once the pipes close.
fn collect_output(child: &mut Child) -> mpsc::Receiver<(Vec<u8>, Vec<u8>)> {
    let (tx, rx) = mpsc::channel();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    thread::spawn(move || {
        let stderr = thread::spawn(move || read_pipe(stderr));
        let stdout = read_pipe(stdout);
        let stderr = stderr.join().unwrap_or_default();

        if tx.send((stdout, stderr)).is_err() {
            debug!(target: "xtag::typeset", "output receiver dropped before completion");
        }
    });

    rx
}

fn read_pipe(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buffer = Vec::new();

    if let Some(mut pipe) = pipe
        && let Err(err) = pipe.read_to_end(&mut buffer)
    {
        warn!(target: "xtag::typeset", "failed to read command output: {err}");
    }

    buffer
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn terminate(child: &mut Child, command: &str) {
    if let Err(err) = child.kill() {
        warn!(target: "xtag::typeset", "failed to kill `{command}`: {err}");
    }

    if let Err(err) = child.wait() {
        warn!(target: "xtag::typeset", "failed to reap `{command}`: {err}");
    }
}

fn interpret(
    command: &str,
    status: ExitStatus,
    stdout: &[u8],
    stderr: &[u8],
    mode: MathMode,
) -> Result<TypesetOutput, TypesetError> {
    if !status.success() {
        let stderr = String::from_utf8_lossy(stderr);
        let stderr = stderr.trim();

        return Err(TypesetError::rejected(if stderr.is_empty() {
            format!("`{command}` exited with {status}")
        } else {
            stderr.to_owned()
        }));
    }

    Ok(TypesetOutput {
        rendered: String::from_utf8_lossy(stdout).trim_end().to_owned(),
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: &str, mode: MathMode) -> TypesetRequest {
        TypesetRequest {
            source: source.to_owned(),
            mode,
        }
    }

    #[test]
    fn pipes_source_through_the_command() {
        let typesetter = CommandTypesetter::new("cat", Duration::from_secs(5));

        let output = typesetter
            .typeset(&request("x + y\n", MathMode::Inline))
            .expect("cat succeeds");

        assert_eq!(output.rendered, "x + y");
        assert_eq!(output.mode, MathMode::Inline);
    }

    #[test]
    fn exposes_the_requested_mode() {
        let typesetter =
            CommandTypesetter::new("cat > /dev/null; printf %s \"$XTAG_MATH_MODE\"", Duration::from_secs(5));

        let output = typesetter
            .typeset(&request("x", MathMode::Display))
            .expect("command succeeds");

        assert_eq!(output.rendered, "display");
    }

    #[test]
    fn non_zero_exit_rejects_with_stderr() {
        let typesetter =
            CommandTypesetter::new("cat > /dev/null; echo 'unknown macro' >&2; exit 3", Duration::from_secs(5));

        let result = typesetter.typeset(&request("\\foo", MathMode::Inline));

        assert_eq!(result, Err(TypesetError::rejected("unknown macro")));
    }

    #[test]
    fn slow_commands_time_out() {
        let typesetter = CommandTypesetter::new("sleep 5", Duration::from_millis(50));

        let result = typesetter.typeset(&request("x", MathMode::Inline));

        assert_eq!(
            result,
            Err(TypesetError::Timeout {
                timeout: Duration::from_millis(50)
            })
        );
    }

    #[test]
    fn timed_out_commands_are_killed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let marker = dir.path().join("finished");
        let typesetter = CommandTypesetter::new(
            format!("sleep 1; touch '{}'", marker.display()),
            Duration::from_millis(50),
        );

        let result = typesetter.typeset(&request("x", MathMode::Inline));
        assert_eq!(
            result,
            Err(TypesetError::Timeout {
                timeout: Duration::from_millis(50)
            })
        );

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists(), "command kept running after the timeout");
    }

    #[test]
    fn commands_may_ignore_their_input() {
        let typesetter = CommandTypesetter::new("echo rendered", Duration::from_secs(5));
        let large = "x".repeat(200 * 1024);

        for source in [large.as_str(), "x"] {
            let output = typesetter
                .typeset(&request(source, MathMode::Inline))
                .expect("command succeeds without reading stdin");

            assert_eq!(output.rendered, "rendered");
        }
    }
}
