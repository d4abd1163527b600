//! ScholarMatch - Scholarship discovery backend
//!
//! This library powers the ScholarMatch app: a rule-based eligibility
//! evaluator buckets scholarship programs against a student's academic
//! profile, and an AI agent layers conversational onboarding and tiered
//! scoring on top of it.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{evaluate_rule, EligibilityBuckets, Evaluator, RuleOutcome, Verdict};
pub use models::{
    AcademicProfile, EligibilityRule, GpaBand, Program, QualifyRequest, QualifyResponse,
    UnknownRulePolicy,
};
