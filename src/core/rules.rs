use crate::core::gpa::{number_field, GpaRequirement};
use crate::models::{AcademicProfile, EligibilityRule, RuleOperator, RuleType};
use serde_json::Value;

/// Outcome of checking one rule against a profile.
///
/// `Unverified` marks rules whose `(rule_type, operator)` pair has no
/// comparator, or whose payload could not be read. Under the default
/// permissive policy it lands on the pass side, but it is kept distinct so
/// callers can audit how much of a verdict rests on unchecked rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Matched,
    Failed,
    Unverified,
}

/// Typed view of a rule's `(rule_type, operator, value)` triple.
///
/// Parsing never fails: anything outside the comparator vocabulary
/// collapses into `Unverified`, so one malformed rule can never poison a
/// whole catalog evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    /// `nationality in {countries}` — case-sensitive exact match, no alias
    /// or diacritic normalization (known limitation, kept as-is).
    NationalityIn(Vec<String>),
    /// `degree in {degrees}` — exact match on the credential label.
    DegreeIn(Vec<String>),
    /// Any GPA comparison; the profile side resolves a literal GPA or the
    /// band midpoint.
    Gpa(GpaRequirement),
    /// `work_experience >= {years}`.
    ExperienceAtLeast(f64),
    /// No comparator for this rule shape.
    Unverified,
}

impl RuleCheck {
    /// Build the typed view of a rule.
    pub fn parse(rule: &EligibilityRule) -> RuleCheck {
        match (rule.rule_type, rule.operator) {
            (RuleType::Nationality, RuleOperator::In) => string_list(&rule.value, "countries")
                .map(RuleCheck::NationalityIn)
                .unwrap_or(RuleCheck::Unverified),
            (RuleType::Degree, RuleOperator::In) => string_list(&rule.value, "degrees")
                .map(RuleCheck::DegreeIn)
                .unwrap_or(RuleCheck::Unverified),
            (RuleType::Gpa, operator) => GpaRequirement::parse(operator, &rule.value)
                .map(RuleCheck::Gpa)
                .unwrap_or(RuleCheck::Unverified),
            (RuleType::WorkExperience, RuleOperator::GreaterOrEqual) => {
                number_field(&rule.value, "years")
                    .map(RuleCheck::ExperienceAtLeast)
                    .unwrap_or(RuleCheck::Unverified)
            }
            _ => RuleCheck::Unverified,
        }
    }

    /// Evaluate this check against a profile.
    ///
    /// Absent profile fields fail the comparator rather than erroring: a
    /// student who never stated their nationality cannot match a
    /// nationality rule.
    #[inline]
    pub fn outcome(&self, profile: &AcademicProfile) -> RuleOutcome {
        let passed = match self {
            RuleCheck::NationalityIn(countries) => match profile.nationality.as_deref() {
                Some(nationality) => countries.iter().any(|c| c == nationality),
                None => false,
            },
            RuleCheck::DegreeIn(degrees) => match profile.degree.as_deref() {
                Some(degree) => degrees.iter().any(|d| d == degree),
                None => false,
            },
            RuleCheck::Gpa(requirement) => match profile.gpa_value() {
                Some(gpa) => requirement.satisfied_by(gpa),
                None => false,
            },
            RuleCheck::ExperienceAtLeast(years) => match profile.work_experience_years {
                Some(experience) => f64::from(experience) >= *years,
                None => false,
            },
            RuleCheck::Unverified => return RuleOutcome::Unverified,
        };

        if passed {
            RuleOutcome::Matched
        } else {
            RuleOutcome::Failed
        }
    }
}

/// Check one rule against a profile.
#[inline]
pub fn evaluate_rule(profile: &AcademicProfile, rule: &EligibilityRule) -> RuleOutcome {
    RuleCheck::parse(rule).outcome(profile)
}

/// Read a list of strings out of a rule payload object. Non-string items
/// are skipped; a missing or non-array field means the payload cannot be
/// evaluated.
fn string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    let items = value.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GpaBand, RuleConfidence};
    use serde_json::json;

    fn rule(rule_type: RuleType, operator: RuleOperator, value: Value) -> EligibilityRule {
        EligibilityRule {
            id: String::new(),
            program_id: String::new(),
            rule_type,
            operator,
            value,
            confidence: RuleConfidence::High,
        }
    }

    fn profile() -> AcademicProfile {
        AcademicProfile {
            user_id: "student".to_string(),
            nationality: Some("Ghana".to_string()),
            degree: Some("BSc".to_string()),
            gpa_band: Some(GpaBand::From35To40),
            gpa: None,
            field: Some("Computer Science".to_string()),
            work_experience_years: Some(2),
            updated_at: None,
        }
    }

    #[test]
    fn test_nationality_in_pass() {
        let r = rule(
            RuleType::Nationality,
            RuleOperator::In,
            json!({"countries": ["Ghana", "Nigeria"]}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Matched);
    }

    #[test]
    fn test_nationality_in_fail() {
        let r = rule(
            RuleType::Nationality,
            RuleOperator::In,
            json!({"countries": ["Kenya"]}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_nationality_match_is_case_sensitive() {
        let r = rule(
            RuleType::Nationality,
            RuleOperator::In,
            json!({"countries": ["ghana"]}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_missing_nationality_fails() {
        let mut p = profile();
        p.nationality = None;
        let r = rule(
            RuleType::Nationality,
            RuleOperator::In,
            json!({"countries": ["Ghana"]}),
        );
        assert_eq!(evaluate_rule(&p, &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_empty_country_list_fails() {
        let r = rule(RuleType::Nationality, RuleOperator::In, json!({"countries": []}));
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_degree_in() {
        let r = rule(
            RuleType::Degree,
            RuleOperator::In,
            json!({"degrees": ["BSc", "BA"]}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Matched);

        let r = rule(RuleType::Degree, RuleOperator::In, json!({"degrees": ["MSc"]}));
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_gpa_band_midpoint_comparison() {
        // Band 3.5_4.0 resolves to midpoint 3.75
        let r = rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.5}));
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Matched);

        let r = rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.8}));
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_literal_gpa_takes_precedence_over_band() {
        let mut p = profile();
        p.gpa = Some(2.9);
        // Band midpoint would pass a 3.0 minimum; the literal 2.9 must not
        let r = rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.0}));
        assert_eq!(evaluate_rule(&p, &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_gpa_between() {
        let r = rule(
            RuleType::Gpa,
            RuleOperator::Between,
            json!({"min": 3.0, "max": 3.8}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Matched);
    }

    #[test]
    fn test_work_experience_at_least() {
        let r = rule(
            RuleType::WorkExperience,
            RuleOperator::GreaterOrEqual,
            json!({"years": 2}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Matched);

        let r = rule(
            RuleType::WorkExperience,
            RuleOperator::GreaterOrEqual,
            json!({"years": 5}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Failed);
    }

    #[test]
    fn test_unknown_rule_type_is_unverified() {
        let r = rule(
            RuleType::Language,
            RuleOperator::GreaterOrEqual,
            json!({"min": 6.5}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Unverified);
    }

    #[test]
    fn test_unknown_operator_combination_is_unverified() {
        // nationality only has an `in` comparator
        let r = rule(
            RuleType::Nationality,
            RuleOperator::NotIn,
            json!({"countries": ["Ghana"]}),
        );
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Unverified);

        let r = rule(RuleType::Age, RuleOperator::LessOrEqual, json!({"max": 30}));
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Unverified);
    }

    #[test]
    fn test_malformed_payload_is_unverified() {
        // countries is not an array
        let r = rule(
            RuleType::Nationality,
            RuleOperator::In,
            json!({"countries": "Ghana"}),
        );
        assert_eq!(RuleCheck::parse(&r), RuleCheck::Unverified);

        // gpa payload missing its threshold
        let r = rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({}));
        assert_eq!(RuleCheck::parse(&r), RuleCheck::Unverified);

        // payload is not an object at all
        let r = rule(RuleType::WorkExperience, RuleOperator::GreaterOrEqual, json!(null));
        assert_eq!(RuleCheck::parse(&r), RuleCheck::Unverified);
    }

    #[test]
    fn test_non_string_list_items_are_skipped() {
        let r = rule(
            RuleType::Nationality,
            RuleOperator::In,
            json!({"countries": [42, "Ghana", null]}),
        );
        assert_eq!(RuleCheck::parse(&r), RuleCheck::NationalityIn(vec!["Ghana".to_string()]));
        assert_eq!(evaluate_rule(&profile(), &r), RuleOutcome::Matched);
    }
}
