// Integration tests for ScholarMatch

use scholarmatch::core::{Evaluator, Verdict};
use scholarmatch::models::{
    AcademicProfile, EligibilityRule, GpaBand, Program, QualifyResponse, RuleConfidence,
    RuleOperator, RuleType, UnknownRulePolicy,
};
use serde_json::json;

fn create_rule(
    rule_type: RuleType,
    operator: RuleOperator,
    value: serde_json::Value,
) -> EligibilityRule {
    EligibilityRule {
        id: "r".to_string(),
        program_id: "p".to_string(),
        rule_type,
        operator,
        value,
        confidence: RuleConfidence::High,
    }
}

fn create_program(id: &str, rules: Vec<EligibilityRule>) -> Program {
    Program {
        id: id.to_string(),
        name: format!("Scholarship {}", id),
        provider: "Foundation".to_string(),
        description: None,
        country: Some("Ghana".to_string()),
        funding_amount: Some(10_000.0),
        currency: Some("USD".to_string()),
        application_url: None,
        status: Default::default(),
        created_at: None,
        rules,
    }
}

fn ghana_bsc_profile() -> AcademicProfile {
    AcademicProfile {
        user_id: "student-1".to_string(),
        nationality: Some("Ghana".to_string()),
        degree: Some("BSc".to_string()),
        gpa_band: Some(GpaBand::From35To40),
        gpa: None,
        field: Some("Engineering".to_string()),
        work_experience_years: Some(2),
        updated_at: None,
    }
}

#[test]
fn test_integration_catalog_bucketing() {
    let evaluator = Evaluator::with_default_policy();
    let profile = ghana_bsc_profile();

    let catalog = vec![
        // All rules pass: nationality + GPA threshold
        create_program(
            "all-pass",
            vec![
                create_rule(
                    RuleType::Nationality,
                    RuleOperator::In,
                    json!({"countries": ["Ghana", "Nigeria"]}),
                ),
                create_rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.5})),
            ],
        ),
        // Nationality outside the list
        create_program(
            "wrong-country",
            vec![create_rule(
                RuleType::Nationality,
                RuleOperator::In,
                json!({"countries": ["Kenya"]}),
            )],
        ),
        // One pass, one fail: nationality ok, experience short
        create_program(
            "mixed",
            vec![
                create_rule(
                    RuleType::Nationality,
                    RuleOperator::In,
                    json!({"countries": ["Ghana"]}),
                ),
                create_rule(
                    RuleType::WorkExperience,
                    RuleOperator::GreaterOrEqual,
                    json!({"years": 5}),
                ),
            ],
        ),
        // No rules attached
        create_program("unrated", vec![]),
        // Single rule nothing can check
        create_program(
            "language-only",
            vec![create_rule(
                RuleType::Language,
                RuleOperator::GreaterOrEqual,
                json!({"min": 6.5}),
            )],
        ),
    ];

    let buckets = evaluator.evaluate(&profile, catalog);

    let ids = |bucket: &[Program]| -> Vec<String> { bucket.iter().map(|p| p.id.clone()).collect() };

    assert_eq!(ids(&buckets.eligible), vec!["all-pass", "language-only"]);
    assert_eq!(ids(&buckets.maybe), vec!["mixed", "unrated"]);
    assert_eq!(ids(&buckets.not_eligible), vec!["wrong-country"]);
    assert_eq!(buckets.total(), 5);
}

#[test]
fn test_integration_every_program_lands_in_one_bucket() {
    let evaluator = Evaluator::with_default_policy();
    let profile = ghana_bsc_profile();

    let catalog: Vec<Program> = (0..60)
        .map(|i| {
            let rules = match i % 4 {
                0 => vec![create_rule(
                    RuleType::Gpa,
                    RuleOperator::GreaterOrEqual,
                    json!({"min": 2.0 + (i % 20) as f64 * 0.1}),
                )],
                1 => vec![create_rule(
                    RuleType::Nationality,
                    RuleOperator::In,
                    json!({"countries": [if i % 8 == 1 { "Ghana" } else { "Kenya" }]}),
                )],
                2 => vec![],
                _ => vec![create_rule(RuleType::Other, RuleOperator::Exists, json!({}))],
            };
            create_program(&format!("p{}", i), rules)
        })
        .collect();
    let total = catalog.len();

    let buckets = evaluator.evaluate(&profile, catalog);

    assert_eq!(
        buckets.eligible.len() + buckets.maybe.len() + buckets.not_eligible.len(),
        total
    );
}

#[test]
fn test_integration_determinism() {
    let evaluator = Evaluator::with_default_policy();
    let profile = ghana_bsc_profile();

    let catalog: Vec<Program> = (0..30)
        .map(|i| {
            create_program(
                &format!("p{}", i),
                vec![create_rule(
                    RuleType::Gpa,
                    RuleOperator::GreaterOrEqual,
                    json!({"min": 3.0 + (i as f64) * 0.05}),
                )],
            )
        })
        .collect();

    let first = evaluator.evaluate(&profile, catalog.clone());
    let second = evaluator.evaluate(&profile, catalog);

    let ids = |bucket: &[Program]| -> Vec<String> { bucket.iter().map(|p| p.id.clone()).collect() };
    assert_eq!(ids(&first.eligible), ids(&second.eligible));
    assert_eq!(ids(&first.maybe), ids(&second.maybe));
    assert_eq!(ids(&first.not_eligible), ids(&second.not_eligible));
}

#[test]
fn test_integration_idempotence_of_buckets() {
    let evaluator = Evaluator::with_default_policy();
    let profile = ghana_bsc_profile();

    let catalog = vec![
        create_program(
            "a",
            vec![create_rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.0}))],
        ),
        create_program(
            "b",
            vec![create_rule(RuleType::Gpa, RuleOperator::GreaterOrEqual, json!({"min": 3.9}))],
        ),
        create_program("c", vec![]),
    ];

    let first = evaluator.evaluate(&profile, catalog);
    assert_eq!(first.eligible.len(), 1);

    // Re-running a bucket keeps its members in place
    let eligible_again = evaluator.evaluate(&profile, first.eligible);
    assert_eq!(eligible_again.eligible.len(), 1);
    assert!(eligible_again.not_eligible.is_empty());

    let not_eligible_again = evaluator.evaluate(&profile, first.not_eligible);
    assert!(not_eligible_again.eligible.is_empty());
    assert_eq!(not_eligible_again.not_eligible.len(), 1);
}

#[test]
fn test_integration_strict_policy_flips_unverified_only() {
    let profile = ghana_bsc_profile();
    let catalog = || {
        vec![
            create_program(
                "checkable",
                vec![create_rule(
                    RuleType::Nationality,
                    RuleOperator::In,
                    json!({"countries": ["Ghana"]}),
                )],
            ),
            create_program(
                "uncheckable",
                vec![create_rule(
                    RuleType::Language,
                    RuleOperator::GreaterOrEqual,
                    json!({"min": 7.0}),
                )],
            ),
        ]
    };

    let permissive = Evaluator::new(UnknownRulePolicy::Permissive).evaluate(&profile, catalog());
    assert_eq!(permissive.eligible.len(), 2);

    let strict = Evaluator::new(UnknownRulePolicy::Strict).evaluate(&profile, catalog());
    assert_eq!(strict.eligible.len(), 1);
    assert_eq!(strict.eligible[0].id, "checkable");
    assert_eq!(strict.not_eligible.len(), 1);
    assert_eq!(strict.not_eligible[0].id, "uncheckable");
}

#[test]
fn test_program_row_deserializes_from_store_shape() {
    // Shape produced by the store's embedded select, rules included
    let row = json!({
        "id": "prog-1",
        "name": "Mastercard Foundation Scholars",
        "provider": "Mastercard Foundation",
        "country": "Ghana",
        "funding_amount": 25000.0,
        "currency": "USD",
        "status": "active",
        "eligibility_rules": [
            {
                "id": "rule-1",
                "program_id": "prog-1",
                "rule_type": "nationality",
                "operator": "in",
                "value": {"countries": ["Ghana", "Nigeria"]},
                "confidence": "high"
            },
            {
                "id": "rule-2",
                "program_id": "prog-1",
                "rule_type": "gpa",
                "operator": ">=",
                "value": {"min": 3.5},
                "confidence": "medium"
            }
        ]
    });

    let program: Program = serde_json::from_value(row).unwrap();
    assert_eq!(program.rules.len(), 2);
    assert_eq!(program.rules[0].rule_type, RuleType::Nationality);
    assert_eq!(program.rules[1].operator, RuleOperator::GreaterOrEqual);
    assert!(program.is_active());

    let evaluator = Evaluator::with_default_policy();
    let (verdict, tally) = evaluator.classify(&ghana_bsc_profile(), &program);
    assert_eq!(verdict, Verdict::Eligible);
    assert_eq!(tally.matched, 2);
}

#[test]
fn test_program_row_tolerates_missing_rule_array() {
    let row = json!({
        "id": "prog-2",
        "name": "Unannotated Grant"
    });

    let program: Program = serde_json::from_value(row).unwrap();
    assert!(program.rules.is_empty());

    let (verdict, _) = Evaluator::with_default_policy().classify(&ghana_bsc_profile(), &program);
    assert_eq!(verdict, Verdict::Maybe);
}

#[test]
fn test_qualify_response_wire_keys() {
    let response = QualifyResponse {
        eligible: vec![],
        maybe: vec![],
        not_eligible: vec![],
        total_programs: 0,
    };

    let value = serde_json::to_value(&response).unwrap();
    assert!(value.get("eligible").is_some());
    assert!(value.get("maybe").is_some());
    assert!(value.get("not_eligible").is_some());
    assert_eq!(value["total_programs"], 0);
}
