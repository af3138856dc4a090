//! Problem registry and test vectors
//!
//! Problems and their test vectors are reference data: loaded once at startup
//! from a TOML file and read-only afterwards. The store is passed explicitly
//! to the components that need it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grader::GradeError;

/// Problem difficulty for display purposes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        write!(f, "{}", s)
    }
}

/// How a produced output is compared against the expected output.
///
/// Declared per problem in the registry; order-insensitive comparison is an
/// explicit opt-in, never assumed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Structural equality
    #[default]
    Exact,
    /// Arrays compare as multisets (element order ignored)
    SetEquality,
}

/// One (input, expected output) pair
#[derive(Debug, Clone, Deserialize)]
pub struct TestVector {
    /// Named argument values, e.g. `{ nums = [2, 7], target = 9 }`
    pub input: Value,
    /// Expected output value
    pub expected: Value,
}

/// A registered problem with its test vectors
#[derive(Debug, Clone, Deserialize)]
pub struct Problem {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Name of the callable the submission must define
    pub entry_point: String,
    /// Parameter order used to turn a vector's named input into call arguments
    pub params: Vec<String>,
    #[serde(default)]
    pub comparator: Comparator,
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u32,
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u32,
    pub vectors: Vec<TestVector>,
}

fn default_time_limit_ms() -> u32 {
    2000
}

fn default_memory_limit_mb() -> u32 {
    256
}

impl Problem {
    /// Build the positional argument list for a vector from its named input.
    ///
    /// Missing parameters become JSON null so a broken registry entry surfaces
    /// as a failed vector instead of a panic.
    pub fn call_args(&self, vector: &TestVector) -> Vec<Value> {
        self.params
            .iter()
            .map(|p| {
                vector
                    .input
                    .get(p)
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    }
}

/// Read-only problem store keyed by problem id
#[derive(Debug)]
pub struct ProblemStore {
    problems: BTreeMap<String, Problem>,
}

impl ProblemStore {
    /// Load the store from a TOML file. Fails fast on malformed config.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse problem config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let problems: BTreeMap<String, Problem> = toml::from_str(content)?;

        for (id, problem) in &problems {
            if problem.vectors.is_empty() {
                anyhow::bail!("Problem {} has no test vectors", id);
            }
            if problem.params.is_empty() {
                anyhow::bail!("Problem {} declares no parameters", id);
            }
        }

        Ok(Self { problems })
    }

    /// Look up a problem by id
    pub fn problem(&self, id: &str) -> Result<&Problem, GradeError> {
        self.problems
            .get(id)
            .ok_or_else(|| GradeError::UnknownProblem(id.to_string()))
    }

    /// Test vectors for a problem, in registry order
    pub fn vectors(&self, id: &str) -> Result<&[TestVector], GradeError> {
        Ok(&self.problem(id)?.vectors)
    }

    /// All problem ids with their metadata, for listing
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Problem)> {
        self.problems.iter().map(|(id, p)| (id.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
[two-sum]
name = "Two Sum"
description = "Return indices of the two numbers that add up to target."
difficulty = "easy"
tags = ["Array", "Hash Table"]
entry_point = "twoSum"
params = ["nums", "target"]
comparator = "set_equality"

[[two-sum.vectors]]
input = { nums = [2, 7, 11, 15], target = 9 }
expected = [0, 1]

[[two-sum.vectors]]
input = { nums = [3, 2, 4], target = 6 }
expected = [1, 2]
"#;

    #[test]
    fn test_load_store() {
        let store = ProblemStore::from_toml(SAMPLE).unwrap();
        assert_eq!(store.len(), 1);

        let problem = store.problem("two-sum").unwrap();
        assert_eq!(problem.name, "Two Sum");
        assert_eq!(problem.difficulty, Difficulty::Easy);
        assert_eq!(problem.comparator, Comparator::SetEquality);
        assert_eq!(problem.entry_point, "twoSum");
        assert_eq!(problem.time_limit_ms, 2000);
        assert_eq!(problem.vectors.len(), 2);
    }

    #[test]
    fn test_vectors_keep_registry_order() {
        let store = ProblemStore::from_toml(SAMPLE).unwrap();
        let vectors = store.vectors("two-sum").unwrap();
        assert_eq!(vectors[0].expected, json!([0, 1]));
        assert_eq!(vectors[1].expected, json!([1, 2]));
    }

    #[test]
    fn test_unknown_problem() {
        let store = ProblemStore::from_toml(SAMPLE).unwrap();
        let err = store.problem("three-sum").unwrap_err();
        assert!(matches!(err, GradeError::UnknownProblem(ref id) if id == "three-sum"));
    }

    #[test]
    fn test_call_args_follow_param_order() {
        let store = ProblemStore::from_toml(SAMPLE).unwrap();
        let problem = store.problem("two-sum").unwrap();
        let args = problem.call_args(&problem.vectors[0]);
        assert_eq!(args, vec![json!([2, 7, 11, 15]), json!(9)]);
    }

    #[test]
    fn test_missing_param_becomes_null() {
        let store = ProblemStore::from_toml(SAMPLE).unwrap();
        let problem = store.problem("two-sum").unwrap();
        let vector = TestVector {
            input: json!({ "nums": [1, 2] }),
            expected: json!([0, 1]),
        };
        let args = problem.call_args(&vector);
        assert_eq!(args, vec![json!([1, 2]), Value::Null]);
    }

    #[test]
    fn test_empty_vectors_rejected() {
        let bad = r#"
[empty]
name = "Empty"
description = "No vectors."
difficulty = "easy"
entry_point = "solve"
params = ["x"]
vectors = []
"#;
        assert!(ProblemStore::from_toml(bad).is_err());
    }
}
