//! HTTP surface
//!
//! A single request/response endpoint for grading plus read-only problem
//! metadata lookups. Capacity is bounded by a semaphore: submissions beyond
//! the configured number of grading slots are rejected with 503 rather than
//! queued.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::grader::{GradeError, Grader, Submission};
use crate::problems::{Difficulty, Problem, ProblemStore};
use crate::report::{format_report, FormattedReport};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub grader: Arc<Grader>,
    pub problems: Arc<ProblemStore>,
    /// Grading slots; exhausted slots mean `Busy`
    pub slots: Arc<Semaphore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/problems", get(list_problems))
        .route("/api/problems/{id}", get(get_problem))
        .route("/api/submissions", post(submit))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Request body for a submission
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub problem_id: String,
    pub language: String,
    pub code: String,
}

async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<FormattedReport>, ApiError> {
    // Acquire a grading slot up front; dropping out here cancels the grade
    // before any sandbox work starts
    let _permit = state.slots.try_acquire().map_err(|_| {
        info!("Rejecting submission for {}: at capacity", request.problem_id);
        ApiError::from(GradeError::Busy)
    })?;

    let submission = Submission {
        problem_id: request.problem_id,
        language: request.language,
        code: request.code,
    };

    let report = state.grader.grade(&submission).await?;
    Ok(Json(format_report(&report)))
}

/// Problem metadata row for listings
#[derive(Debug, Serialize)]
pub struct ProblemSummary {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
}

/// Full problem metadata; vectors are not exposed, only their count
#[derive(Debug, Serialize)]
pub struct ProblemDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub vector_count: usize,
}

fn summary(id: &str, problem: &Problem) -> ProblemSummary {
    ProblemSummary {
        id: id.to_string(),
        name: problem.name.clone(),
        difficulty: problem.difficulty,
        tags: problem.tags.clone(),
    }
}

fn detail(id: &str, problem: &Problem) -> ProblemDetail {
    ProblemDetail {
        id: id.to_string(),
        name: problem.name.clone(),
        description: problem.description.clone(),
        difficulty: problem.difficulty,
        tags: problem.tags.clone(),
        vector_count: problem.vectors.len(),
    }
}

async fn list_problems(State(state): State<AppState>) -> Json<Vec<ProblemSummary>> {
    let problems = state
        .problems
        .iter()
        .map(|(id, problem)| summary(id, problem))
        .collect();
    Json(problems)
}

async fn get_problem(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProblemDetail>, ApiError> {
    let problem = state.problems.problem(&id)?;
    Ok(Json(detail(&id, problem)))
}

/// Error type for the HTTP boundary.
///
/// `UnknownProblem` is a client error; `Busy` is a transient capacity signal
/// the caller may retry with backoff. Execution outcomes (timeouts, resource
/// limits) never reach this type; they are report content.
pub struct ApiError(GradeError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            GradeError::UnknownProblem(_) => StatusCode::NOT_FOUND,
            GradeError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            GradeError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            GradeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GradeError> for ApiError {
    fn from(err: GradeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self.0 {
            GradeError::Internal(err) => {
                error!("Grading failed: {:#}", err);
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
