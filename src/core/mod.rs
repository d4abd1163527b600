// Core evaluation exports
pub mod evaluator;
pub mod gpa;
pub mod rules;

pub use evaluator::{EligibilityBuckets, Evaluator, RuleTally, Verdict};
pub use gpa::GpaRequirement;
pub use rules::{evaluate_rule, RuleCheck, RuleOutcome};
