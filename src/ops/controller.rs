//! High-level file-sharing operations
//!
//! Each operation is a fixed, ordered command pipeline. Steps run
//! sequentially; the first failing step aborts the rest and surfaces as a
//! single aggregated error carrying that step's command text and stderr.
//! There is no retry and no rollback: enabling IIS-WebServerRole and then
//! failing on IIS-FTPServer leaves the system partially modified, and the
//! error names the command that stopped the pipeline so an operator can
//! finish or undo by hand.

use super::runner::CommandRunner;
use super::{
    feature_listing_command, status, FeatureStatus, LogSink, OpError, Operation,
    IIS_MANAGER_COMMAND,
};
use crate::config::Config;
use log::debug;
use std::sync::Arc;

pub struct ServiceController {
    runner: CommandRunner,
    sink: Arc<dyn LogSink>,
    english_output: bool,
}

impl ServiceController {
    pub fn new(config: &Config, sink: Arc<dyn LogSink>) -> Self {
        Self {
            runner: CommandRunner::new(),
            sink,
            english_output: config.english_output,
        }
    }

    /// Run one operation to completion. Concurrent calls on clones of the
    /// controller are independent; only the log sink is shared, and sinks
    /// serialize their own appends.
    pub async fn run(&self, op: Operation) -> Result<(), OpError> {
        self.sink.append(op.begin_message());

        match op {
            Operation::StartIis => self.runner.execute_detached(IIS_MANAGER_COMMAND)?,
            Operation::CheckStatus => {
                self.check_status().await?;
                return Ok(());
            }
            _ => self.run_commands(op.commands()).await?,
        }

        self.sink.append(op.done_message());
        Ok(())
    }

    /// Execute a command list sequentially, short-circuiting on the first
    /// failure (per-operation; other operations are unaffected).
    pub async fn run_commands(&self, commands: &[&str]) -> Result<(), OpError> {
        for command in commands {
            let result = self.runner.execute_on_pool(command).await?;

            let stdout = result.stdout.trim_end();
            if !stdout.is_empty() {
                self.sink.append(stdout);
            }

            if !result.success() {
                self.sink.append(&format!(
                    "Command failed: {}\n{}",
                    result.command,
                    result.stderr.trim_end()
                ));
                return Err(OpError::from_result(&result));
            }
        }
        Ok(())
    }

    /// Enumerate optional features once and report enabled/disabled for each
    /// known feature, one log line per feature. Parsing never fails: text
    /// that does not match any expected shape reads as disabled.
    pub async fn check_status(&self) -> Result<Vec<FeatureStatus>, OpError> {
        let command = feature_listing_command(self.english_output);
        let result = self.runner.execute_on_pool(command).await?;

        if !result.success() {
            self.sink.append(&format!(
                "Feature status check failed: {}\n{}",
                result.command,
                result.stderr.trim_end()
            ));
            return Err(OpError::from_result(&result));
        }

        let statuses = status::parse_feature_listing(&result.stdout);
        for status in &statuses {
            debug!(
                "feature {} -> enabled={}",
                status.feature.dism_token(),
                status.enabled
            );
            self.sink.append(&format!(
                "{} feature: {}",
                status.feature.display_name(),
                if status.enabled { "enabled" } else { "disabled" }
            ));
        }
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::MemorySink;

    fn test_controller() -> (ServiceController, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let controller = ServiceController::new(&Config::default(), sink.clone());
        (controller, sink)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pipeline_runs_all_steps_on_success() {
        let (controller, sink) = test_controller();
        controller
            .run_commands(&["echo step-one", "echo step-two"])
            .await
            .unwrap();

        let lines = sink.lines();
        assert!(lines.iter().any(|l| l.contains("step-one")));
        assert!(lines.iter().any(|l| l.contains("step-two")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pipeline_short_circuits_on_failure() {
        let (controller, sink) = test_controller();

        let marker = std::env::temp_dir().join(format!(
            "sharectl-short-circuit-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&marker);

        #[cfg(target_os = "windows")]
        let touch = format!("type nul > {}", marker.display());
        #[cfg(not(target_os = "windows"))]
        let touch = format!("touch {}", marker.display());

        let err = controller
            .run_commands(&["echo before", "exit 7", touch.as_str()])
            .await
            .unwrap_err();

        // Step 3 must never have run
        assert!(!marker.exists());

        // The aggregated error names the failing step
        match err {
            OpError::CommandFailed {
                command, exit_code, ..
            } => {
                assert_eq!(command, "exit 7");
                assert_eq!(exit_code, 7);
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }

        let lines = sink.lines();
        assert!(lines.iter().any(|l| l.contains("Command failed: exit 7")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_error_carries_stderr() {
        let (controller, _sink) = test_controller();

        #[cfg(target_os = "windows")]
        let failing = "echo broken 1>&2 & exit 5";
        #[cfg(not(target_os = "windows"))]
        let failing = "echo broken >&2; exit 5";

        let err = controller.run_commands(&[failing]).await.unwrap_err();
        match err {
            OpError::CommandFailed { stderr, .. } => assert!(stderr.contains("broken")),
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_operations_are_independent() {
        let (a, sink_a) = test_controller();
        let (b, sink_b) = test_controller();

        let left = a.run_commands(&["echo left", "exit 1"]);
        let right = b.run_commands(&["echo right-one", "echo right-two"]);

        let (left_result, right_result) = tokio::join!(left, right);

        // One operation failing must not affect the other's execution
        assert!(left_result.is_err());
        right_result.unwrap();
        assert!(sink_a.lines().iter().any(|l| l.contains("left")));
        assert!(sink_b.lines().iter().any(|l| l.contains("right-two")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_begin_message_logged_before_commands() {
        let (controller, sink) = test_controller();
        // StopFtp's `net stop ftpsvc` fails on a machine where the service is
        // already stopped (or where `net` does not exist); either way the call
        // must return rather than hang, and the begin message must be logged.
        let _ = controller.run(Operation::StopFtp).await;
        let lines = sink.lines();
        assert_eq!(lines.first().map(String::as_str), Some("Stopping FTP server..."));
    }
}
