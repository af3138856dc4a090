//! Isolate box management
//!
//! Low-level wrapper around the isolate sandbox. Manages box initialization,
//! cleanup, and command execution. Submitted code only ever runs inside a
//! box: separate process tree, no network, nothing mounted writable except
//! the box directory and /tmp.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use super::meta::{parse_meta, IsolateMeta};

/// Cached cgroup availability
static USE_CGROUPS: OnceLock<bool> = OnceLock::new();

/// Box id reserved for the cgroup availability probe
const PROBE_BOX_ID: &str = "9999";

/// Check if isolate cgroups are available
pub async fn is_cgroups_available() -> bool {
    if let Some(value) = USE_CGROUPS.get() {
        return *value;
    }

    let test_result = Command::new("isolate")
        .args(["--box-id", PROBE_BOX_ID, "--cg", "--init"])
        .output()
        .await;

    let _ = Command::new("isolate")
        .args(["--box-id", PROBE_BOX_ID, "--cleanup"])
        .output()
        .await;

    let available = match test_result {
        Ok(r) => r.status.success(),
        Err(_) => false,
    };

    let _ = USE_CGROUPS.set(available);
    available
}

/// Ensure cgroups are available; return an error otherwise
pub async fn ensure_cgroups_available() -> Result<()> {
    if is_cgroups_available().await {
        Ok(())
    } else {
        anyhow::bail!("Isolate cgroup support is required but not available. Install isolate with cgroup support and ensure cgroups are enabled.")
    }
}

/// I/O specification for sandbox execution
#[derive(Debug, Clone)]
pub struct IoSpec {
    /// Path to stdin file (copied into the box)
    pub stdin_path: Option<std::path::PathBuf>,
    /// File name for stdout inside the box
    pub stdout_file: String,
    /// File name for stderr inside the box
    pub stderr_file: String,
}

impl IoSpec {
    pub fn new() -> Self {
        Self {
            stdin_path: None,
            stdout_file: "stdout.txt".to_string(),
            stderr_file: "stderr.txt".to_string(),
        }
    }

    pub fn with_stdin(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin_path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl Default for IoSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// Resource limits for sandbox execution
#[derive(Debug, Clone)]
pub struct Limits {
    /// Time limit in milliseconds
    pub time_ms: u32,
    /// Memory limit in MB
    pub memory_mb: u32,
    /// Maximum number of processes
    pub processes: u32,
    /// Maximum open files
    pub open_files: u32,
    /// Maximum file size in KB
    pub fsize_kb: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            time_ms: 1000,
            memory_mb: 256,
            processes: 64,
            open_files: 256,
            fsize_kb: 262144, // 256MB
        }
    }
}

/// Raw outcome from sandbox execution (no grading interpretation)
#[derive(Debug)]
pub struct SandboxOutcome {
    /// Parsed meta file contents
    pub meta: IsolateMeta,
    pub stdout: String,
    pub stderr: String,
}

/// Isolate box manager
pub struct IsolateBox {
    box_id: u32,
    box_path: String,
    use_cgroups: bool,
}

impl IsolateBox {
    /// Create and initialize a new isolate box
    pub async fn new(box_id: u32, use_cgroups: bool) -> Result<Self> {
        // Clean up any stale box with the same id
        let _ = Command::new("isolate")
            .args(["--box-id", &box_id.to_string(), "--cleanup"])
            .output()
            .await;

        let box_id_str = box_id.to_string();
        let mut args = vec!["--box-id", &box_id_str];
        if use_cgroups {
            args.push("--cg");
        }
        args.push("--init");

        let output = Command::new("isolate")
            .args(&args)
            .output()
            .await
            .context("Failed to run isolate --init")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to initialize isolate box: {}", stderr);
        }

        let box_path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(
            "Initialized isolate box {} at {} (cgroups: {})",
            box_id, box_path, use_cgroups
        );

        Ok(Self {
            box_id,
            box_path,
            use_cgroups,
        })
    }

    /// Path to the box/box subdirectory (working directory for programs)
    pub fn work_dir(&self) -> String {
        format!("{}/box", self.box_path)
    }

    /// Copy a directory's contents into the box's working directory
    pub async fn copy_dir_in(&self, source_dir: &Path) -> Result<()> {
        let mut entries = fs::read_dir(source_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let dest = format!("{}/{}", self.work_dir(), entry.file_name().to_string_lossy());
            fs::copy(entry.path(), &dest)
                .await
                .with_context(|| format!("Failed to copy {:?} into box", entry.path()))?;
        }
        Ok(())
    }

    /// Run a command in the isolate box
    pub async fn run(
        &self,
        command: &[String],
        limits: &Limits,
        io: &IoSpec,
    ) -> Result<SandboxOutcome> {
        let meta_file = format!("/tmp/isolate_meta_{}.txt", self.box_id);
        let stdout_path = format!("{}/{}", self.work_dir(), io.stdout_file);
        let stderr_path = format!("{}/{}", self.work_dir(), io.stderr_file);

        let time_limit_secs = (limits.time_ms as f64) / 1000.0;
        let wall_time_secs = time_limit_secs * 2.0 + 1.0;
        let memory_limit_kb = limits.memory_mb * 1024;

        let mut args = vec!["--box-id".to_string(), self.box_id.to_string()];

        if self.use_cgroups {
            args.push("--cg".to_string());
            args.push(format!("--cg-mem={}", memory_limit_kb));
        }

        args.extend([
            format!("--time={}", time_limit_secs),
            format!("--wall-time={}", wall_time_secs),
            format!("--meta={}", meta_file),
            format!("--stdout={}", io.stdout_file),
            format!("--stderr={}", io.stderr_file),
            format!("--processes={}", limits.processes),
            format!("--open-files={}", limits.open_files),
            format!("--fsize={}", limits.fsize_kb),
            // Mount directories needed for language runtimes
            "--dir=/usr".to_string(),
            "--dir=/lib".to_string(),
            "--dir=/lib64".to_string(),
            "--dir=/etc:noexec".to_string(),
            "--dir=/tmp:tmp".to_string(),
            "--env=PATH=/usr/local/bin:/usr/bin:/bin".to_string(),
            "--env=HOME=/box".to_string(),
        ]);

        if let Some(stdin_path) = &io.stdin_path {
            let dest = format!("{}/stdin.txt", self.work_dir());
            fs::copy(stdin_path, &dest).await?;
            args.push("--stdin=stdin.txt".to_string());
        }

        args.push("--run".to_string());
        args.push("--".to_string());

        // Resolve bare program names against /usr/bin; box-relative and
        // absolute paths pass through
        let mut cmd_iter = command.iter();
        if let Some(cmd) = cmd_iter.next() {
            if cmd.starts_with('/') || cmd.starts_with("./") {
                args.push(cmd.clone());
            } else {
                args.push(format!("/usr/bin/{}", cmd));
            }
            args.extend(cmd_iter.cloned());
        }

        debug!("Running isolate with args: {:?}", args);

        let _output = Command::new("isolate")
            .args(&args)
            .output()
            .await
            .context("Failed to run isolate")?;

        let meta_content = fs::read_to_string(&meta_file).await.unwrap_or_default();
        let meta = parse_meta(&meta_content);

        let stdout = fs::read_to_string(&stdout_path).await.unwrap_or_default();
        let stderr = fs::read_to_string(&stderr_path).await.unwrap_or_default();

        let _ = fs::remove_file(&meta_file).await;

        Ok(SandboxOutcome {
            meta,
            stdout,
            stderr,
        })
    }

    /// Cleanup the isolate box
    pub async fn cleanup(self) -> Result<()> {
        Command::new("isolate")
            .args(["--box-id", &self.box_id.to_string(), "--cleanup"])
            .output()
            .await?;
        info!("Cleaned up isolate box {}", self.box_id);
        Ok(())
    }
}
