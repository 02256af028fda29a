//! Input predicates. Failures are a `false`, never an error.

use serde_json::Value;

/// Validator accepting numeric input within `[min, max]`.
///
/// Empty input, non-numbers, `NaN` and infinities are rejected.
pub fn validate_range_num(min: f64, max: f64) -> impl Fn(&str) -> bool {
    move |raw: &str| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => value.is_finite() && value >= min && value <= max,
            Err(_) => false,
        }
    }
}

/// Structural equality of two JSON documents.
pub fn is_equal_obj(a: &Value, b: &Value) -> bool {
    std::ptr::eq(a, b) || a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn range_bounds_are_inclusive() {
        let valid = validate_range_num(0.0, 10.0);
        assert!(valid("0"));
        assert!(valid("10"));
        assert!(valid("4.5"));
        assert!(!valid("10.01"));
        assert!(!valid("-1"));
    }

    #[test]
    fn range_rejects_non_numbers() {
        let valid = validate_range_num(-90.0, 90.0);
        assert!(!valid(""));
        assert!(!valid("   "));
        assert!(!valid("north"));
        assert!(!valid("NaN"));
    }

    #[test]
    fn range_rejects_infinity_even_when_unbounded() {
        let valid = validate_range_num(f64::NEG_INFINITY, f64::INFINITY);
        assert!(valid("1e300"));
        assert!(!valid("inf"));
        assert!(!valid("-infinity"));
    }

    #[test]
    fn equal_objects() {
        let a = json!({ "id": 1, "tags": ["a"] });
        assert!(is_equal_obj(&a, &a));
        assert!(is_equal_obj(&a, &json!({ "tags": ["a"], "id": 1 })));
        assert!(!is_equal_obj(&a, &json!({ "id": 2, "tags": ["a"] })));
    }
}
