//! Sandboxed executor
//!
//! Takes submitted source text and one argument list, runs the submission's
//! entry point inside the sandbox, and reports a structured
//! `ExecutionResult`. User-code failures are values, never `Err`; `Err` is
//! reserved for sandbox infrastructure faults.
//!
//! The bridge between sandbox and submission is a per-language harness (from
//! the language registry) that reads the argument list as JSON on stdin,
//! calls the entry point, and writes the result as JSON on stdout. The
//! harness signals through exit codes which side failed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::languages::LanguageConfig;
use crate::runner::{RunLimits, RunOutcome, RunStatus, SandboxedRunner};
use crate::sandbox::{BoxIdPool, SandboxSettings};

/// Harness exit-code protocol
mod harness_exit_codes {
    /// Source failed to load or does not define the entry point
    pub const ENTRY_MISSING: i32 = 64;
    /// An exception escaped the entry point
    pub const ENTRY_FAULT: i32 = 65;
}

/// Cap on error text carried into reports
const MAX_ERROR_LEN: usize = 4096;

/// Result of executing a submission against one input
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The entry point returned a value
    Produced(Value),
    /// Source does not load or does not define the entry point
    CompileError(String),
    /// The entry point raised / the process crashed
    RuntimeError(String),
    /// Wall-clock limit exceeded
    TimedOut,
    /// Memory ceiling exceeded
    ResourceExceeded,
}

/// Executor seam: the orchestrator talks to this trait so grading logic can
/// be exercised against a scripted implementation in tests.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `source`'s `entry_point` against one positional argument list.
    async fn run(
        &self,
        source: &str,
        language: &LanguageConfig,
        entry_point: &str,
        args: &[Value],
        limits: &RunLimits,
    ) -> Result<ExecutionResult>;
}

/// Executor backed by the isolate sandbox
pub struct SandboxExecutor {
    boxes: BoxIdPool,
    settings: SandboxSettings,
}

impl SandboxExecutor {
    pub fn new(settings: SandboxSettings) -> Self {
        Self {
            boxes: BoxIdPool::new(settings.worker_id),
            settings,
        }
    }
}

#[async_trait]
impl Executor for SandboxExecutor {
    async fn run(
        &self,
        source: &str,
        language: &LanguageConfig,
        entry_point: &str,
        args: &[Value],
        limits: &RunLimits,
    ) -> Result<ExecutionResult> {
        let work_dir = tempfile::tempdir().context("Failed to create scratch dir")?;

        let source_path = work_dir.path().join(&language.source_file);
        std::fs::write(&source_path, source).context("Failed to write submission source")?;

        let harness_path = work_dir.path().join(&language.harness_file);
        std::fs::write(&harness_path, language.render_harness(entry_point))
            .context("Failed to write harness")?;

        // Compile step for compiled languages, under its own limits
        if let Some(compile_cmd) = &language.compile_command {
            let compile_limits = RunLimits::new(
                self.settings.compile_time_limit_ms,
                self.settings.compile_memory_limit_mb,
            );
            let runner = SandboxedRunner::new(self.boxes.next(), work_dir.path());
            let outcome = runner.execute(compile_cmd, &compile_limits, None).await?;

            if !outcome.is_success() {
                let message = truncate(combine_output(&outcome));
                debug!("Compilation failed: {}", message);
                return Ok(ExecutionResult::CompileError(message));
            }
        }

        let stdin = serde_json::to_string(args).context("Failed to encode call arguments")?;

        let runner = SandboxedRunner::new(self.boxes.next(), work_dir.path());
        let outcome = runner
            .execute(&language.run_command, limits, Some(&stdin))
            .await?;

        interpret_run(&outcome)
    }
}

/// Map a raw run outcome to an execution result using the harness protocol.
///
/// Sandbox faults are `Err`: the submission cannot be blamed for them.
pub fn interpret_run(outcome: &RunOutcome) -> Result<ExecutionResult> {
    let result = match outcome.status {
        RunStatus::Exited(0) => parse_produced(&outcome.stdout),
        RunStatus::Exited(code) if code == harness_exit_codes::ENTRY_MISSING => {
            ExecutionResult::CompileError(error_text(outcome, "entry point not defined"))
        }
        RunStatus::Exited(code) if code == harness_exit_codes::ENTRY_FAULT => {
            ExecutionResult::RuntimeError(error_text(outcome, "uncaught exception"))
        }
        RunStatus::Exited(code) => {
            ExecutionResult::RuntimeError(format!("process exited with status {}", code))
        }
        RunStatus::TimeLimitExceeded => ExecutionResult::TimedOut,
        RunStatus::MemoryLimitExceeded => ExecutionResult::ResourceExceeded,
        RunStatus::Signaled(sig) => {
            ExecutionResult::RuntimeError(format!("killed by signal {}", sig))
        }
        RunStatus::RuntimeError => {
            ExecutionResult::RuntimeError(error_text(outcome, "process failed"))
        }
        RunStatus::SystemError => {
            anyhow::bail!("sandbox failure during execution: {}", outcome.stderr.trim())
        }
    };

    Ok(result)
}

/// The harness writes the result as the last non-empty stdout line, leaving
/// room for whatever the submission itself printed above it.
fn parse_produced(stdout: &str) -> ExecutionResult {
    let last_line = stdout.lines().rev().find(|line| !line.trim().is_empty());

    match last_line {
        Some(line) => match serde_json::from_str::<Value>(line.trim()) {
            Ok(value) => ExecutionResult::Produced(value),
            Err(_) => ExecutionResult::RuntimeError("produced malformed output".to_string()),
        },
        None => ExecutionResult::RuntimeError("no result produced".to_string()),
    }
}

fn error_text(outcome: &RunOutcome, fallback: &str) -> String {
    let stderr = outcome.stderr.trim();
    if stderr.is_empty() {
        fallback.to_string()
    } else {
        truncate(stderr.to_string())
    }
}

fn combine_output(outcome: &RunOutcome) -> String {
    let mut text = outcome.stdout.trim().to_string();
    let stderr = outcome.stderr.trim();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }
    if text.is_empty() {
        "compilation failed".to_string()
    } else {
        text
    }
}

fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_ERROR_LEN {
        text
    } else {
        text.chars().take(MAX_ERROR_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(status: RunStatus, stdout: &str, stderr: &str) -> RunOutcome {
        RunOutcome {
            time_ms: 10,
            memory_kb: 1024,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            status,
        }
    }

    #[test]
    fn test_clean_exit_produces_last_line_json() {
        let result = interpret_run(&outcome(RunStatus::Exited(0), "\n[0,1]", "")).unwrap();
        assert_eq!(result, ExecutionResult::Produced(json!([0, 1])));
    }

    #[test]
    fn test_submission_prints_are_skipped() {
        let result = interpret_run(&outcome(
            RunStatus::Exited(0),
            "debugging line\nanother\n[1,2]\n",
            "",
        ))
        .unwrap();
        assert_eq!(result, ExecutionResult::Produced(json!([1, 2])));
    }

    #[test]
    fn test_entry_missing_maps_to_compile_error() {
        let result = interpret_run(&outcome(
            RunStatus::Exited(64),
            "",
            "entry point 'twoSum' is not defined",
        ))
        .unwrap();
        assert_eq!(
            result,
            ExecutionResult::CompileError("entry point 'twoSum' is not defined".to_string())
        );
    }

    #[test]
    fn test_entry_fault_maps_to_runtime_error_with_message() {
        let result = interpret_run(&outcome(RunStatus::Exited(65), "", "x is not defined")).unwrap();
        assert_eq!(
            result,
            ExecutionResult::RuntimeError("x is not defined".to_string())
        );
    }

    #[test]
    fn test_entry_fault_without_stderr_gets_fallback() {
        let result = interpret_run(&outcome(RunStatus::Exited(65), "", "")).unwrap();
        assert_eq!(
            result,
            ExecutionResult::RuntimeError("uncaught exception".to_string())
        );
    }

    #[test]
    fn test_timeout_and_memory_map_to_structured_results() {
        assert_eq!(
            interpret_run(&outcome(RunStatus::TimeLimitExceeded, "", "")).unwrap(),
            ExecutionResult::TimedOut
        );
        assert_eq!(
            interpret_run(&outcome(RunStatus::MemoryLimitExceeded, "", "")).unwrap(),
            ExecutionResult::ResourceExceeded
        );
    }

    #[test]
    fn test_signal_maps_to_runtime_error() {
        let result = interpret_run(&outcome(RunStatus::Signaled(11), "", "")).unwrap();
        assert_eq!(
            result,
            ExecutionResult::RuntimeError("killed by signal 11".to_string())
        );
    }

    #[test]
    fn test_malformed_output_is_runtime_error() {
        let result = interpret_run(&outcome(RunStatus::Exited(0), "not json at all", "")).unwrap();
        assert_eq!(
            result,
            ExecutionResult::RuntimeError("produced malformed output".to_string())
        );
    }

    #[test]
    fn test_empty_output_is_runtime_error() {
        let result = interpret_run(&outcome(RunStatus::Exited(0), "", "")).unwrap();
        assert_eq!(
            result,
            ExecutionResult::RuntimeError("no result produced".to_string())
        );
    }

    #[test]
    fn test_long_stderr_is_truncated() {
        let long = "e".repeat(10_000);
        let result = interpret_run(&outcome(RunStatus::Exited(65), "", &long)).unwrap();
        match result {
            ExecutionResult::RuntimeError(msg) => assert_eq!(msg.len(), 4096),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_sandbox_fault_is_an_error_not_a_verdict() {
        let result = interpret_run(&outcome(RunStatus::SystemError, "", "box init failed"));
        assert!(result.is_err());
    }
}
