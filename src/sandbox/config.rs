//! Sandbox settings and box-id allocation

use std::sync::atomic::{AtomicU32, Ordering};

/// Settings for sandbox operation, loaded from the environment at startup
/// and passed explicitly to the executor.
#[derive(Debug, Clone)]
pub struct SandboxSettings {
    /// Compile time limit in milliseconds
    pub compile_time_limit_ms: u32,
    /// Compile memory limit in MB
    pub compile_memory_limit_mb: u32,
    /// Worker ID for box-id allocation (0-9); relevant when several grader
    /// processes share a host
    pub worker_id: u32,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            compile_time_limit_ms: 30_000,
            compile_memory_limit_mb: 2048,
            worker_id: 0,
        }
    }
}

impl SandboxSettings {
    /// Read settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            compile_time_limit_ms: env_u32("GRADER_COMPILE_TIME_LIMIT_MS")
                .unwrap_or(defaults.compile_time_limit_ms),
            compile_memory_limit_mb: env_u32("GRADER_COMPILE_MEMORY_LIMIT_MB")
                .unwrap_or(defaults.compile_memory_limit_mb),
            worker_id: env_u32("GRADER_WORKER_ID").unwrap_or(defaults.worker_id),
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok()?.parse().ok()
}

/// Allocator handing out isolate box ids for concurrent executions.
///
/// Isolate only supports box ids 0-9999; each worker (0-9) owns a range of
/// 1000 ids and the counter cycles within it, so two gradings running at the
/// same time never share a box.
#[derive(Debug)]
pub struct BoxIdPool {
    worker_offset: u32,
    counter: AtomicU32,
}

impl BoxIdPool {
    pub fn new(worker_id: u32) -> Self {
        Self {
            worker_offset: (worker_id % 10) * 1000,
            counter: AtomicU32::new(0),
        }
    }

    /// Next box id within this worker's range
    pub fn next(&self) -> u32 {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        self.worker_offset + (counter % 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_ids_stay_in_worker_range() {
        let pool = BoxIdPool::new(3);
        for _ in 0..2500 {
            let id = pool.next();
            assert!((3000..4000).contains(&id));
        }
    }

    #[test]
    fn test_box_ids_distinct_until_wrap() {
        let pool = BoxIdPool::new(0);
        let first: Vec<u32> = (0..1000).map(|_| pool.next()).collect();
        let mut sorted = first.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 1000);
    }

    #[test]
    fn test_worker_id_wraps_to_single_digit() {
        let pool = BoxIdPool::new(12);
        assert!((2000..3000).contains(&pool.next()));
    }
}
