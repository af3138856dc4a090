//! Output comparison
//!
//! Compares a produced output against the expected output using the
//! comparator declared in the problem's registry entry. Order-insensitive
//! comparison is a per-problem opt-in for problems whose answer is a set of
//! values rather than a sequence.

use serde_json::Value;

use crate::problems::Comparator;

/// Compare a produced output against the expected output
pub fn outputs_match(comparator: Comparator, expected: &Value, actual: &Value) -> bool {
    match comparator {
        Comparator::Exact => expected == actual,
        Comparator::SetEquality => set_equal(expected, actual),
    }
}

/// Multiset comparison for array outputs; non-arrays compare exactly.
///
/// Quadratic matching keeps element comparison structural (JSON values are
/// not hashable); vector outputs are small.
fn set_equal(expected: &Value, actual: &Value) -> bool {
    let (Value::Array(expected), Value::Array(actual)) = (expected, actual) else {
        return expected == actual;
    };

    if expected.len() != actual.len() {
        return false;
    }

    let mut used = vec![false; actual.len()];
    for item in expected {
        let matched = actual
            .iter()
            .enumerate()
            .find(|(i, candidate)| !used[*i] && *candidate == item);
        match matched {
            Some((i, _)) => used[i] = true,
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_match() {
        assert!(outputs_match(Comparator::Exact, &json!([0, 1]), &json!([0, 1])));
        assert!(!outputs_match(Comparator::Exact, &json!([0, 1]), &json!([1, 0])));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        assert!(outputs_match(
            Comparator::SetEquality,
            &json!([0, 1]),
            &json!([1, 0])
        ));
        assert!(outputs_match(
            Comparator::SetEquality,
            &json!([0, 1]),
            &json!([0, 1])
        ));
    }

    #[test]
    fn test_set_equality_respects_multiplicity() {
        assert!(outputs_match(
            Comparator::SetEquality,
            &json!([3, 3]),
            &json!([3, 3])
        ));
        assert!(!outputs_match(
            Comparator::SetEquality,
            &json!([3, 3]),
            &json!([3, 4])
        ));
        assert!(!outputs_match(
            Comparator::SetEquality,
            &json!([1, 2, 2]),
            &json!([1, 1, 2])
        ));
    }

    #[test]
    fn test_set_equality_length_mismatch() {
        assert!(!outputs_match(
            Comparator::SetEquality,
            &json!([0, 1]),
            &json!([0, 1, 2])
        ));
        assert!(!outputs_match(Comparator::SetEquality, &json!([0, 1]), &json!([])));
    }

    #[test]
    fn test_set_equality_falls_back_to_exact_for_non_arrays() {
        assert!(outputs_match(Comparator::SetEquality, &json!(42), &json!(42)));
        assert!(!outputs_match(
            Comparator::SetEquality,
            &json!(42),
            &json!("42")
        ));
        assert!(!outputs_match(
            Comparator::SetEquality,
            &json!([0, 1]),
            &json!(null)
        ));
    }

    #[test]
    fn test_nested_values_compare_structurally() {
        assert!(outputs_match(
            Comparator::SetEquality,
            &json!([[1, 2], [3, 4]]),
            &json!([[3, 4], [1, 2]])
        ));
    }
}
