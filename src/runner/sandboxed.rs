//! Sandboxed runner implementation using isolate
//!
//! Executes untrusted submission code in an isolated environment with
//! resource limits. One isolate box per invocation; the box is created,
//! fed the work directory, run, and cleaned up.

use anyhow::Result;
use std::path::Path;
use tokio::fs;

use super::{RunLimits, RunOutcome, RunStatus};
use crate::sandbox::{is_cgroups_available, IoSpec, IsolateBox, IsolateStatus, Limits};

/// Runner that executes a command in an isolate sandbox
pub struct SandboxedRunner {
    /// Box id for this invocation
    box_id: u32,
    /// Directory containing the submission, harness, and supporting files
    work_dir: std::path::PathBuf,
}

impl SandboxedRunner {
    pub fn new(box_id: u32, work_dir: impl AsRef<Path>) -> Self {
        Self {
            box_id,
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    /// Run a command in the sandbox
    pub async fn execute(
        &self,
        command: &[String],
        limits: &RunLimits,
        stdin_content: Option<&str>,
    ) -> Result<RunOutcome> {
        if !is_cgroups_available().await {
            anyhow::bail!("Cgroup support is required for sandboxed execution");
        }

        let isolate_box = IsolateBox::new(self.box_id, true).await?;

        isolate_box.copy_dir_in(&self.work_dir).await?;

        // Stage stdin in a temp file; IsolateBox copies it into the box
        let stdin_file = if let Some(content) = stdin_content {
            let temp_file = tempfile::NamedTempFile::new()?;
            fs::write(temp_file.path(), content).await?;
            Some(temp_file)
        } else {
            None
        };

        let mut io = IoSpec::new();
        if let Some(ref temp_file) = stdin_file {
            io = io.with_stdin(temp_file.path());
        }

        let sandbox_limits = Limits {
            time_ms: limits.time_ms,
            memory_mb: limits.memory_mb,
            ..Limits::default()
        };

        let outcome = isolate_box.run(command, &sandbox_limits, &io).await?;

        isolate_box.cleanup().await?;

        let memory_limit_kb = limits.memory_mb * 1024;
        let status = match outcome.meta.status {
            IsolateStatus::Ok if outcome.meta.exit_code == 0 => RunStatus::Exited(0),
            IsolateStatus::Ok => RunStatus::Exited(outcome.meta.exit_code),
            IsolateStatus::TimeOut => RunStatus::TimeLimitExceeded,
            IsolateStatus::Signal(sig) => RunStatus::Signaled(sig),
            IsolateStatus::RuntimeError => RunStatus::RuntimeError,
            IsolateStatus::InternalError => RunStatus::SystemError,
        };

        // A run that stayed under the wall clock but over the memory ceiling
        // reports as memory exceeded regardless of how it exited
        let status = if outcome.meta.memory_kb > memory_limit_kb
            && !matches!(status, RunStatus::SystemError)
        {
            RunStatus::MemoryLimitExceeded
        } else {
            status
        };

        Ok(RunOutcome {
            time_ms: outcome.meta.time_ms,
            memory_kb: outcome.meta.memory_kb,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            status,
        })
    }
}
