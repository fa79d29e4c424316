//! Shell command execution
//!
//! Commands are handed to the platform shell as single strings, mirroring how
//! the feature-management and service-control tools are normally invoked. The
//! wait on the child is synchronous and has no timeout; a hung child blocks
//! the blocking-pool task it runs on, not the runtime.

use super::{CommandResult, OpError};
use log::{debug, warn};
use std::process::{Command, Stdio};
use std::time::Instant;

#[cfg(target_os = "windows")]
use winapi::um::winbase::CREATE_NO_WINDOW;

/// Shell used to interpret command strings on this platform
fn platform_shell() -> (&'static str, &'static [&'static str]) {
    #[cfg(target_os = "windows")]
    return ("cmd", &["/C"]);

    #[cfg(not(target_os = "windows"))]
    return ("sh", &["-c"]);
}

/// Executes single shell commands and classifies their outcome
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    shell: &'static str,
    shell_args: &'static [&'static str],
}

impl Default for CommandRunner {
    fn default() -> Self {
        let (shell, shell_args) = platform_shell();
        Self { shell, shell_args }
    }
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner bound to a specific interpreter path. Used by tests to drive
    /// the launch-failure path with a path that does not exist.
    #[cfg(test)]
    fn with_shell(shell: &'static str, shell_args: &'static [&'static str]) -> Self {
        Self { shell, shell_args }
    }

    fn build_command(&self, command: &str) -> Command {
        let mut cmd = Command::new(self.shell);
        cmd.args(self.shell_args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Suppress the console window the child would otherwise pop up
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }

    /// Execute a command and wait for completion.
    ///
    /// A non-zero exit is not an error here: the caller always gets the
    /// captured `CommandResult` back. Only a command that cannot be launched
    /// at all (missing shell, resource exhaustion) errs.
    pub fn execute(&self, command: &str) -> Result<CommandResult, OpError> {
        let start = Instant::now();
        debug!("Executing: {}", command);

        let output = self
            .build_command(command)
            .output()
            .map_err(|source| OpError::Launch {
                command: command.to_string(),
                source,
            })?;

        let result = CommandResult {
            command: command.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        audit_execution(&result);
        Ok(result)
    }

    /// Spawn a command without waiting for it. Used for launching the IIS
    /// management console, which stays open until the user closes it.
    pub fn execute_detached(&self, command: &str) -> Result<(), OpError> {
        debug!("Spawning detached: {}", command);
        self.build_command(command)
            .spawn()
            .map(|_| ())
            .map_err(|source| OpError::Launch {
                command: command.to_string(),
                source,
            })
    }

    /// Run `execute` on the blocking worker pool and await the outcome.
    /// Must be called from within a tokio runtime.
    pub async fn execute_on_pool(&self, command: &str) -> Result<CommandResult, OpError> {
        let runner = *self;
        let command = command.to_string();
        tokio::task::spawn_blocking(move || runner.execute(&command))
            .await
            .map_err(|e| OpError::Worker(e.to_string()))?
    }

    /// Run `execute` on the blocking worker pool and deliver the outcome to a
    /// callback. No cancellation; concurrent invocations are independent.
    /// Must be called from within a tokio runtime. The returned handle lets a
    /// caller observe completion (or a panicked callback); dropping it is fine.
    pub fn execute_async<F>(&self, command: String, on_complete: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(Result<CommandResult, OpError>) + Send + 'static,
    {
        let runner = *self;
        tokio::task::spawn_blocking(move || {
            let result = runner.execute(&command);
            on_complete(result);
        })
    }
}

/// One audit line per executed command, timestamped independently of the
/// logger's own clock so the trail survives log-format changes.
fn audit_execution(result: &CommandResult) {
    let line = format!(
        "[{}] `{}` exit={} took {}ms",
        chrono::Local::now().to_rfc3339(),
        result.command,
        result.exit_code,
        result.duration_ms
    );
    if result.success() {
        debug!("{}", line);
    } else {
        warn!("{}", line);
    }
}
