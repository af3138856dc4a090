//! Sandbox module - Low-level isolate wrapper
//!
//! Minimal abstraction over the isolate sandbox:
//! - Box initialization and cleanup
//! - Cgroup detection
//! - File copy-in helpers
//! - Raw command execution returning `SandboxOutcome`
//! - Box-id allocation for concurrent gradings
//!
//! The sandbox module does not interpret execution results; mapping raw
//! outcomes to grading semantics happens in the executor.

pub mod config;
pub mod isolate_box;
pub mod meta;

pub use config::{BoxIdPool, SandboxSettings};
pub use isolate_box::{
    ensure_cgroups_available, is_cgroups_available, IoSpec, IsolateBox, Limits, SandboxOutcome,
};
pub use meta::{parse_meta, IsolateMeta, IsolateStatus};
