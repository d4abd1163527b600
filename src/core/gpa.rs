use crate::models::RuleOperator;
use serde_json::Value;

/// A parsed GPA constraint from a rule payload.
///
/// The legacy fallback flow only ever produces `AtLeast`, but the other
/// comparison operators are supported with symmetric semantics. `Between`
/// is inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpaRequirement {
    AtLeast(f64),
    Above(f64),
    AtMost(f64),
    Below(f64),
    /// Exact comparison, no tolerance. Band midpoints and rule thresholds
    /// are short decimals with exact binary representations, so equality
    /// behaves predictably here.
    Exactly(f64),
    Between(f64, f64),
}

impl GpaRequirement {
    /// Parse a GPA requirement from `(operator, value)`.
    ///
    /// Payload keys per operator: `min` for `>=`/`>`, `max` for `<=`/`<`,
    /// both for `between`, `value` for `=`. Returns `None` when the
    /// operator has no GPA semantics or the payload is missing the expected
    /// number, which the rule layer treats as an unverified automatic pass.
    pub fn parse(operator: RuleOperator, value: &Value) -> Option<GpaRequirement> {
        match operator {
            RuleOperator::GreaterOrEqual => number_field(value, "min").map(GpaRequirement::AtLeast),
            RuleOperator::GreaterThan => number_field(value, "min").map(GpaRequirement::Above),
            RuleOperator::LessOrEqual => number_field(value, "max").map(GpaRequirement::AtMost),
            RuleOperator::LessThan => number_field(value, "max").map(GpaRequirement::Below),
            RuleOperator::Equal => number_field(value, "value").map(GpaRequirement::Exactly),
            RuleOperator::Between => {
                let min = number_field(value, "min")?;
                let max = number_field(value, "max")?;
                Some(GpaRequirement::Between(min, max))
            }
            _ => None,
        }
    }

    /// Check a resolved GPA against this requirement.
    #[inline]
    pub fn satisfied_by(&self, gpa: f64) -> bool {
        match *self {
            GpaRequirement::AtLeast(min) => gpa >= min,
            GpaRequirement::Above(min) => gpa > min,
            GpaRequirement::AtMost(max) => gpa <= max,
            GpaRequirement::Below(max) => gpa < max,
            GpaRequirement::Exactly(expected) => gpa == expected,
            GpaRequirement::Between(min, max) => gpa >= min && gpa <= max,
        }
    }
}

/// Read a numeric field out of a rule payload object.
#[inline]
pub fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_at_least() {
        let req = GpaRequirement::parse(RuleOperator::GreaterOrEqual, &json!({"min": 3.5}));
        assert_eq!(req, Some(GpaRequirement::AtLeast(3.5)));
    }

    #[test]
    fn test_parse_exactly() {
        let req = GpaRequirement::parse(RuleOperator::Equal, &json!({"value": 3.75}));
        assert_eq!(req, Some(GpaRequirement::Exactly(3.75)));

        // "=" reads "value"; other keys cannot be evaluated
        assert_eq!(GpaRequirement::parse(RuleOperator::Equal, &json!({"min": 3.75})), None);
    }

    #[test]
    fn test_exactly_semantics() {
        let req = GpaRequirement::Exactly(3.75);
        assert!(req.satisfied_by(3.75));
        assert!(!req.satisfied_by(3.74));
        assert!(!req.satisfied_by(3.76));
    }

    #[test]
    fn test_parse_between() {
        let req = GpaRequirement::parse(RuleOperator::Between, &json!({"min": 2.5, "max": 3.5}));
        assert_eq!(req, Some(GpaRequirement::Between(2.5, 3.5)));
    }

    #[test]
    fn test_parse_missing_key() {
        // ">=" reads "min"; a payload without it cannot be evaluated
        assert_eq!(
            GpaRequirement::parse(RuleOperator::GreaterOrEqual, &json!({"max": 3.5})),
            None
        );
        assert_eq!(GpaRequirement::parse(RuleOperator::Between, &json!({"min": 2.5})), None);
    }

    #[test]
    fn test_parse_non_gpa_operator() {
        assert_eq!(GpaRequirement::parse(RuleOperator::In, &json!({"min": 3.0})), None);
        assert_eq!(GpaRequirement::parse(RuleOperator::Exists, &json!({})), None);
    }

    #[test]
    fn test_parse_integer_threshold() {
        // JSON integers are valid thresholds
        let req = GpaRequirement::parse(RuleOperator::GreaterOrEqual, &json!({"min": 3}));
        assert_eq!(req, Some(GpaRequirement::AtLeast(3.0)));
    }

    #[test]
    fn test_at_least_is_inclusive() {
        let req = GpaRequirement::AtLeast(3.5);
        assert!(req.satisfied_by(3.5));
        assert!(req.satisfied_by(3.75));
        assert!(!req.satisfied_by(3.49));
    }

    #[test]
    fn test_above_is_exclusive() {
        let req = GpaRequirement::Above(3.5);
        assert!(!req.satisfied_by(3.5));
        assert!(req.satisfied_by(3.51));
    }

    #[test]
    fn test_upper_bounds() {
        assert!(GpaRequirement::AtMost(3.0).satisfied_by(3.0));
        assert!(!GpaRequirement::AtMost(3.0).satisfied_by(3.01));
        assert!(!GpaRequirement::Below(3.0).satisfied_by(3.0));
        assert!(GpaRequirement::Below(3.0).satisfied_by(2.99));
    }

    #[test]
    fn test_between_inclusive_ends() {
        let req = GpaRequirement::Between(2.5, 3.5);
        assert!(req.satisfied_by(2.5));
        assert!(req.satisfied_by(3.0));
        assert!(req.satisfied_by(3.5));
        assert!(!req.satisfied_by(2.49));
        assert!(!req.satisfied_by(3.51));
    }
}
