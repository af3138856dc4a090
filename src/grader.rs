//! Grading orchestrator
//!
//! Runs a submission across its problem's test vectors, in store order, one
//! fresh sandbox context per vector. Executor failures mark the vector
//! failed and stop the run; wrong answers keep going.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::checker::outputs_match;
use crate::executor::{ExecutionResult, Executor};
use crate::languages::LanguageRegistry;
use crate::problems::ProblemStore;
use crate::report::{GradeReport, ReportStatus, VectorResult};
use crate::runner::RunLimits;

/// A user's attempted solution
#[derive(Debug, Clone)]
pub struct Submission {
    pub problem_id: String,
    pub language: String,
    pub code: String,
}

/// Errors surfaced to the caller instead of a report
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("unknown problem: {0}")]
    UnknownProblem(String),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("grader is at capacity, retry later")]
    Busy,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Grading orchestrator
pub struct Grader {
    problems: Arc<ProblemStore>,
    languages: Arc<LanguageRegistry>,
    executor: Arc<dyn Executor>,
}

impl Grader {
    pub fn new(
        problems: Arc<ProblemStore>,
        languages: Arc<LanguageRegistry>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            problems,
            languages,
            executor,
        }
    }

    /// Grade one submission.
    ///
    /// User-code failures land in the report; `Err` means the submission
    /// never reached execution (bad problem/language) or the sandbox itself
    /// failed.
    pub async fn grade(&self, submission: &Submission) -> Result<GradeReport, GradeError> {
        let problem = self.problems.problem(&submission.problem_id)?;
        let language = self.languages.get(&submission.language)?;
        let limits = RunLimits::new(problem.time_limit_ms, problem.memory_limit_mb);

        let mut vectors = Vec::with_capacity(problem.vectors.len());
        let mut aborted = false;

        for (idx, vector) in problem.vectors.iter().enumerate() {
            let args = problem.call_args(vector);
            let result = self
                .executor
                .run(
                    &submission.code,
                    language,
                    &problem.entry_point,
                    &args,
                    &limits,
                )
                .await?;

            match result {
                ExecutionResult::Produced(actual) => {
                    let passed = outputs_match(problem.comparator, &vector.expected, &actual);
                    vectors.push(VectorResult {
                        input: vector.input.clone(),
                        expected: vector.expected.clone(),
                        actual: Some(actual),
                        passed,
                        error: None,
                    });
                }
                ExecutionResult::CompileError(message) if idx == 0 => {
                    // The submission never loaded; no vector was attempted
                    info!(
                        "Submission for {} failed to compile: {}",
                        submission.problem_id, message
                    );
                    return Ok(GradeReport {
                        status: ReportStatus::RuntimeError,
                        vectors: vec![],
                        error_message: Some(message),
                    });
                }
                failure => {
                    vectors.push(VectorResult {
                        input: vector.input.clone(),
                        expected: vector.expected.clone(),
                        actual: None,
                        passed: false,
                        error: Some(failure_text(&failure)),
                    });
                    aborted = true;
                    break;
                }
            }
        }

        let status = if aborted {
            ReportStatus::RuntimeError
        } else if vectors.iter().all(|v| v.passed) {
            ReportStatus::AllPassed
        } else {
            ReportStatus::SomeFailed
        };

        let report = GradeReport {
            status,
            vectors,
            error_message: None,
        };

        info!(
            "Graded submission: problem={}, language={}, status={}, passed={}/{}",
            submission.problem_id,
            submission.language,
            report.status,
            report.passed_count(),
            problem.vectors.len()
        );

        Ok(report)
    }
}

fn failure_text(result: &ExecutionResult) -> String {
    match result {
        ExecutionResult::CompileError(msg) | ExecutionResult::RuntimeError(msg) => msg.clone(),
        ExecutionResult::TimedOut => "time limit exceeded".to_string(),
        ExecutionResult::ResourceExceeded => "memory limit exceeded".to_string(),
        ExecutionResult::Produced(_) => unreachable!("produced results are not failures"),
    }
}
