//! Subprocess execution of synkctl
//!
//! Every invocation is bounded by a timeout that covers both the child and
//! the collection of its output. The child is killed and reaped on every exit
//! path, including early returns and panics.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::SynkctlConfig;
use crate::errors::DeviceError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of one finished invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Executes synkctl with the given arguments.
///
/// Spawn failures and timeouts are errors; a non-zero exit is a regular
/// [`CommandOutput`] with `success == false`.
pub trait CommandRunner {
    fn run(&self, args: &[String]) -> Result<CommandOutput, DeviceError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, args: &[String]) -> Result<CommandOutput, DeviceError> {
        (**self).run(args)
    }
}

/// Runs the real synkctl binary
#[derive(Debug, Clone)]
pub struct SynkctlRunner {
    program: String,
    timeout: Duration,
}

impl SynkctlRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SynkctlConfig) -> Self {
        Self::new(config.command.clone(), config.timeout)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, args: &[String]) -> String {
        let mut command = self.program.clone();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }
}

/// Kills the child if it is still running when dropped
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            if let Err(e) = self.0.kill() {
                warn!("Failed to kill synkctl process {}: {}", self.0.id(), e);
            }
            let _ = self.0.wait();
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

impl CommandRunner for SynkctlRunner {
    fn run(&self, args: &[String]) -> Result<CommandOutput, DeviceError> {
        let command = self.describe(args);
        debug!("Running {}", command);

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DeviceError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;
        let mut child = ChildGuard(child);

        // Pipes are drained concurrently so a chatty child cannot block on a full buffer
        let stdout = drain(child.0.stdout.take());
        let stderr = drain(child.0.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.0.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!("{} timed out after {:?}, killing it", command, self.timeout);
                    drop(child);
                    return Err(DeviceError::Timeout {
                        command,
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(DeviceError::Spawn {
                        program: self.program.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        };

        // A descendant that inherited the pipes can hold them open after synkctl exits
        let collect = |pipe: Receiver<String>| {
            match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(output) => Ok(output),
                Err(RecvTimeoutError::Disconnected) => Ok(String::new()),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "{} exited but its output was not closed within {:?}",
                        command, self.timeout
                    );
                    Err(DeviceError::Timeout {
                        command: command.clone(),
                        timeout: self.timeout,
                    })
                }
            }
        };
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        debug!("{} exited with {}", command, status);

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout,
            stderr,
        })
    }
}
