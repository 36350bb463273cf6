use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Runs external commands for checks that have no API equivalent.
pub trait CommandRunner: Send + Sync {
    /// Stdout of `program args...`.
    ///
    /// `None` when the program is missing, exits non-zero or times out.
    fn run(&self, program: &str, args: &[&str]) -> Option<String>;
}

/// Spawns real child processes, killing any that outlive the timeout.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    const POLL_INTERVAL: Duration = Duration::from_millis(20);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program, error = %e, "command could not be spawned");
                return None;
            }
        };

        // Drain stdout while the child runs so a full pipe never stalls it.
        let (tx, rx) = mpsc::channel();
        if let Some(mut out) = child.stdout.take() {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let result = out.read_to_end(&mut buf).map(|_| buf);
                let _ = tx.send(result);
            });
        } else {
            let _ = tx.send(Ok(Vec::new()));
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        tracing::debug!(program, ?status, "command failed");
                        return None;
                    }
                    // A grandchild may still hold the pipe open.
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    return match rx.recv_timeout(remaining.max(Self::POLL_INTERVAL)) {
                        Ok(Ok(stdout)) => Some(String::from_utf8_lossy(&stdout).into_owned()),
                        Ok(Err(e)) => {
                            tracing::debug!(program, error = %e, "failed to read command output");
                            None
                        }
                        Err(_) => {
                            tracing::debug!(program, "command output still open after exit");
                            None
                        }
                    };
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        tracing::debug!(program, timeout = ?self.timeout, "command timed out");
                        let _ = child.kill();
                        let _ = child.wait();
                        return None;
                    }
                    thread::sleep(Self::POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::debug!(program, error = %e, "failed to wait for command");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_yields_none() {
        let runner = SystemCommandRunner::default();
        assert_eq!(runner.run("envscope-no-such-binary", &[]), None);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let runner = SystemCommandRunner::default();
        let out = runner.run("sh", &["-c", "echo wheel staff"]);
        assert_eq!(out.as_deref().map(str::trim), Some("wheel staff"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_yields_none() {
        let runner = SystemCommandRunner::default();
        assert_eq!(runner.run("sh", &["-c", "exit 3"]), None);
    }

    #[cfg(unix)]
    #[test]
    fn hung_command_is_killed() {
        let runner = SystemCommandRunner::new(Duration::from_millis(100));
        let start = Instant::now();

        assert_eq!(runner.run("sleep", &["5"]), None);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn output_larger_than_pipe_buffer_is_captured() {
        let runner = SystemCommandRunner::new(Duration::from_secs(5));
        let out = runner.run("sh", &["-c", "head -c 200000 /dev/zero | tr '\\0' a"]);

        let out = out.expect("command should succeed");
        assert_eq!(out.len(), 200_000);
        assert!(out.bytes().all(|b| b == b'a'));
    }
}
