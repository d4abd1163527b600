use crate::core::rules::{evaluate_rule, RuleOutcome};
use crate::models::{AcademicProfile, Program, UnknownRulePolicy};

/// Per-program tally of rule outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleTally {
    pub matched: usize,
    pub failed: usize,
    pub unverified: usize,
}

impl RuleTally {
    /// Rules counting toward the pass side under the given policy.
    pub fn passes(&self, policy: UnknownRulePolicy) -> usize {
        match policy {
            UnknownRulePolicy::Permissive => self.matched + self.unverified,
            UnknownRulePolicy::Strict => self.matched,
        }
    }

    /// Rules counting toward the fail side under the given policy.
    pub fn failures(&self, policy: UnknownRulePolicy) -> usize {
        match policy {
            UnknownRulePolicy::Permissive => self.failed,
            UnknownRulePolicy::Strict => self.failed + self.unverified,
        }
    }

    pub fn total(&self) -> usize {
        self.matched + self.failed + self.unverified
    }
}

/// Three-way classification of a single program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    Maybe,
    NotEligible,
}

/// Result of evaluating a catalog slice: every input program lands in
/// exactly one bucket.
#[derive(Debug, Default)]
pub struct EligibilityBuckets {
    pub eligible: Vec<Program>,
    pub maybe: Vec<Program>,
    pub not_eligible: Vec<Program>,
}

impl EligibilityBuckets {
    pub fn total(&self) -> usize {
        self.eligible.len() + self.maybe.len() + self.not_eligible.len()
    }
}

/// Rule-based eligibility evaluator — the offline fallback for the agent's
/// AI scoring path.
///
/// # Bucket assignment
/// 1. A program with no attached rules is always `maybe`: there is not
///    enough information to assert eligibility either way.
/// 2. Otherwise every rule is checked; no failures and at least one pass
///    means `eligible`, a mix means `maybe`, zero passes means
///    `not_eligible`.
///
/// Pure and synchronous: no I/O, no shared state, callers may evaluate
/// catalog slices concurrently without coordination. Callers are expected
/// to pre-filter programs to active status.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    policy: UnknownRulePolicy,
}

impl Evaluator {
    pub fn new(policy: UnknownRulePolicy) -> Self {
        Self { policy }
    }

    pub fn with_default_policy() -> Self {
        Self {
            policy: UnknownRulePolicy::default(),
        }
    }

    pub fn policy(&self) -> UnknownRulePolicy {
        self.policy
    }

    /// Classify one program against a profile.
    ///
    /// Returns the verdict together with the rule tally so callers can
    /// explain it ("matched 2 of 3 requirement checks").
    pub fn classify(&self, profile: &AcademicProfile, program: &Program) -> (Verdict, RuleTally) {
        if program.rules.is_empty() {
            return (Verdict::Maybe, RuleTally::default());
        }

        let mut tally = RuleTally::default();
        for rule in &program.rules {
            match evaluate_rule(profile, rule) {
                RuleOutcome::Matched => tally.matched += 1,
                RuleOutcome::Failed => tally.failed += 1,
                RuleOutcome::Unverified => tally.unverified += 1,
            }
        }

        let passes = tally.passes(self.policy);
        let failures = tally.failures(self.policy);

        let verdict = if failures == 0 && passes > 0 {
            Verdict::Eligible
        } else if failures > 0 && passes > 0 {
            Verdict::Maybe
        } else {
            Verdict::NotEligible
        };

        (verdict, tally)
    }

    /// Classify every program in the slice into exactly one bucket.
    pub fn evaluate(&self, profile: &AcademicProfile, programs: Vec<Program>) -> EligibilityBuckets {
        let mut buckets = EligibilityBuckets::default();

        for program in programs {
            let (verdict, _) = self.classify(profile, &program);
            match verdict {
                Verdict::Eligible => buckets.eligible.push(program),
                Verdict::Maybe => buckets.maybe.push(program),
                Verdict::NotEligible => buckets.not_eligible.push(program),
            }
        }

        buckets
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::with_default_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EligibilityRule, GpaBand, RuleConfidence, RuleOperator, RuleType};
    use serde_json::json;

    fn rule(rule_type: RuleType, operator: RuleOperator, value: serde_json::Value) -> EligibilityRule {
        EligibilityRule {
            id: String::new(),
            program_id: String::new(),
            rule_type,
            operator,
            value,
            confidence: RuleConfidence::High,
        }
    }

    fn program(id: &str, rules: Vec<EligibilityRule>) -> Program {
        Program {
            id: id.to_string(),
            name: format!("Program {}", id),
            provider: "Test Foundation".to_string(),
            description: None,
            country: None,
            funding_amount: None,
            currency: None,
            application_url: None,
            status: Default::default(),
            created_at: None,
            rules,
        }
    }

    fn ghana_profile() -> AcademicProfile {
        AcademicProfile {
            user_id: "student".to_string(),
            nationality: Some("Ghana".to_string()),
            degree: Some("BSc".to_string()),
            gpa_band: Some(GpaBand::From35To40),
            gpa: None,
            field: None,
            work_experience_years: Some(2),
            updated_at: None,
        }
    }

    #[test]
    fn test_all_rules_pass_is_eligible() {
        let evaluator = Evaluator::with_default_policy();
        let p = program(
            "a",
            vec![
                rule(
                    RuleType::Nationality,
                    RuleOperator::In,
                    json!({"countries": ["Ghana", "Nigeria"]}),
                ),
                rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.5})),
            ],
        );

        let buckets = evaluator.evaluate(&ghana_profile(), vec![p]);
        assert_eq!(buckets.eligible.len(), 1);
        assert!(buckets.maybe.is_empty());
        assert!(buckets.not_eligible.is_empty());
    }

    #[test]
    fn test_every_rule_failing_is_not_eligible() {
        let evaluator = Evaluator::with_default_policy();
        let p = program(
            "b",
            vec![rule(
                RuleType::Nationality,
                RuleOperator::In,
                json!({"countries": ["Kenya"]}),
            )],
        );

        let buckets = evaluator.evaluate(&ghana_profile(), vec![p]);
        assert_eq!(buckets.not_eligible.len(), 1);
    }

    #[test]
    fn test_mixed_outcomes_are_maybe() {
        let evaluator = Evaluator::with_default_policy();
        let p = program(
            "c",
            vec![
                rule(
                    RuleType::Nationality,
                    RuleOperator::In,
                    json!({"countries": ["Ghana"]}),
                ),
                rule(
                    RuleType::WorkExperience,
                    RuleOperator::GreaterOrEqual,
                    json!({"years": 5}),
                ),
            ],
        );

        let (verdict, tally) = evaluator.classify(&ghana_profile(), &p);
        assert_eq!(verdict, Verdict::Maybe);
        assert_eq!(tally.matched, 1);
        assert_eq!(tally.failed, 1);
    }

    #[test]
    fn test_no_rules_is_always_maybe() {
        let evaluator = Evaluator::with_default_policy();
        let buckets = evaluator.evaluate(&ghana_profile(), vec![program("d", vec![])]);
        assert_eq!(buckets.maybe.len(), 1);

        // Holds regardless of how empty the profile is
        let buckets = evaluator.evaluate(&AcademicProfile::default(), vec![program("d", vec![])]);
        assert_eq!(buckets.maybe.len(), 1);
    }

    #[test]
    fn test_lone_unsupported_rule_is_eligible_under_permissive() {
        let evaluator = Evaluator::with_default_policy();
        let p = program(
            "e",
            vec![rule(
                RuleType::Language,
                RuleOperator::GreaterOrEqual,
                json!({"min": 6.5}),
            )],
        );

        let (verdict, tally) = evaluator.classify(&ghana_profile(), &p);
        assert_eq!(verdict, Verdict::Eligible);
        assert_eq!(tally.unverified, 1);
    }

    #[test]
    fn test_strict_policy_fails_unverified_rules() {
        let evaluator = Evaluator::new(UnknownRulePolicy::Strict);
        let p = program(
            "e",
            vec![rule(
                RuleType::Language,
                RuleOperator::GreaterOrEqual,
                json!({"min": 6.5}),
            )],
        );

        let (verdict, _) = evaluator.classify(&ghana_profile(), &p);
        assert_eq!(verdict, Verdict::NotEligible);
    }

    #[test]
    fn test_totality() {
        let evaluator = Evaluator::with_default_policy();
        let programs = vec![
            program("a", vec![rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.5}))]),
            program("b", vec![rule(
                RuleType::Nationality,
                RuleOperator::In,
                json!({"countries": ["Kenya"]}),
            )]),
            program("c", vec![]),
            program("d", vec![rule(RuleType::Language, RuleOperator::Exists, json!({}))]),
        ];
        let total = programs.len();

        let buckets = evaluator.evaluate(&ghana_profile(), programs);
        assert_eq!(buckets.total(), total);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = Evaluator::with_default_policy();
        let programs: Vec<Program> = (0..20)
            .map(|i| {
                program(
                    &i.to_string(),
                    vec![rule(
                        RuleType::Gpa,
                        RuleOperator::GreaterOrEqual,
                        json!({"min": 2.0 + (i as f64) * 0.1}),
                    )],
                )
            })
            .collect();

        let first = evaluator.evaluate(&ghana_profile(), programs.clone());
        let second = evaluator.evaluate(&ghana_profile(), programs);

        let ids = |bucket: &[Program]| bucket.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first.eligible), ids(&second.eligible));
        assert_eq!(ids(&first.maybe), ids(&second.maybe));
        assert_eq!(ids(&first.not_eligible), ids(&second.not_eligible));
    }

    #[test]
    fn test_reevaluating_a_bucket_is_idempotent() {
        let evaluator = Evaluator::with_default_policy();
        let programs = vec![
            program("a", vec![rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.0}))]),
            program("b", vec![rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.9}))]),
            program("c", vec![]),
        ];

        let buckets = evaluator.evaluate(&ghana_profile(), programs);
        let eligible_count = buckets.eligible.len();
        assert!(eligible_count > 0);

        let again = evaluator.evaluate(&ghana_profile(), buckets.eligible);
        assert_eq!(again.eligible.len(), eligible_count);
        assert!(again.maybe.is_empty());
        assert!(again.not_eligible.is_empty());
    }
}
