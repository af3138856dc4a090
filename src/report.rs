//! Grade reports and their user-facing rendering

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Aggregate outcome of grading one submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every vector ran and passed
    AllPassed,
    /// Every vector ran; at least one comparison failed
    SomeFailed,
    /// Execution aborted on a compile error, fault, timeout, or resource limit
    RuntimeError,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::AllPassed => "all_passed",
            ReportStatus::SomeFailed => "some_failed",
            ReportStatus::RuntimeError => "runtime_error",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one test vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorResult {
    /// The vector's named input, as registered
    pub input: Value,
    /// Expected output
    pub expected: Value,
    /// Produced output; absent when execution failed before producing one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    pub passed: bool,
    /// Error text for vectors that failed to execute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of grading a submission.
///
/// `vectors` follows store order. When a fatal execution error stops the run
/// early, vectors that were never attempted are omitted, so the sequence can
/// be shorter than the problem's vector count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub status: ReportStatus,
    pub vectors: Vec<VectorResult>,
    /// Set when the submission failed before any vector ran (compile error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GradeReport {
    pub fn passed_count(&self) -> usize {
        self.vectors.iter().filter(|v| v.passed).count()
    }
}

/// User-facing rendering of a grade report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedReport {
    pub status: ReportStatus,
    pub message: String,
    pub test_cases: Vec<TestCaseDetail>,
}

/// One line of the per-vector detail list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseDetail {
    pub label: String,
    pub passed: bool,
    /// Input/expected/output breakdown, present for failed cases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Turn a grade report into its user-facing structure. Pure.
pub fn format_report(report: &GradeReport) -> FormattedReport {
    let message = match report.status {
        ReportStatus::AllPassed => "All test cases passed".to_string(),
        ReportStatus::SomeFailed => "Some test cases failed".to_string(),
        ReportStatus::RuntimeError => match &report.error_message {
            Some(msg) => format!("Runtime error in your code: {}", msg),
            None => "Runtime error in your code".to_string(),
        },
    };

    let test_cases = report
        .vectors
        .iter()
        .enumerate()
        .map(|(idx, vector)| {
            let detail = if vector.passed {
                None
            } else if let Some(error) = &vector.error {
                Some(format!("input: {}, error: {}", vector.input, error))
            } else {
                let actual = vector
                    .actual
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "none".to_string());
                Some(format!(
                    "input: {}, expected: {}, output: {}",
                    vector.input, vector.expected, actual
                ))
            };

            TestCaseDetail {
                label: format!("Test Case {}", idx + 1),
                passed: vector.passed,
                detail,
            }
        })
        .collect();

    FormattedReport {
        status: report.status,
        message,
        test_cases,
    }
}
