use serde::{Deserialize, Serialize};

/// Self-reported GPA band from the conversational onboarding flow.
///
/// Wire names follow the store's column vocabulary ("below_2.5", "2.5_3.0", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpaBand {
    #[serde(rename = "below_2.5")]
    Below25,
    #[serde(rename = "2.5_3.0")]
    From25To30,
    #[serde(rename = "3.0_3.5")]
    From30To35,
    #[serde(rename = "3.5_4.0")]
    From35To40,
    #[serde(rename = "above_4.0")]
    Above40,
}

impl GpaBand {
    /// Representative numeric midpoint used when comparing a band against a
    /// rule threshold. Fixed lookup, no interpolation.
    pub fn midpoint(self) -> f64 {
        match self {
            GpaBand::Below25 => 2.0,
            GpaBand::From25To30 => 2.75,
            GpaBand::From30To35 => 3.25,
            GpaBand::From35To40 => 3.75,
            GpaBand::Above40 => 4.0,
        }
    }
}

/// A student's academic profile.
///
/// This is both the row shape of the `academic_profiles` table and the inline
/// payload accepted from anonymous qualify requests, so every field the user
/// may not have answered yet is optional. `user_id` defaults to empty for
/// pre-signup profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcademicProfile {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub gpa_band: Option<GpaBand>,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub work_experience_years: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AcademicProfile {
    /// Resolve the GPA used for rule comparisons. A literal value from the
    /// form-based flow wins over the coarse band midpoint.
    pub fn gpa_value(&self) -> Option<f64> {
        self.gpa.or_else(|| self.gpa_band.map(GpaBand::midpoint))
    }

    /// Fold fields extracted by the onboarding agent into this profile.
    /// Only fields the extraction actually produced are overwritten.
    pub fn absorb(&mut self, update: &AcademicProfile) {
        if update.nationality.is_some() {
            self.nationality = update.nationality.clone();
        }
        if update.degree.is_some() {
            self.degree = update.degree.clone();
        }
        if update.gpa_band.is_some() {
            self.gpa_band = update.gpa_band;
        }
        if update.gpa.is_some() {
            self.gpa = update.gpa;
        }
        if update.field.is_some() {
            self.field = update.field.clone();
        }
        if update.work_experience_years.is_some() {
            self.work_experience_years = update.work_experience_years;
        }
    }

    /// True once every field the onboarding flow asks about is filled.
    pub fn is_complete(&self) -> bool {
        self.nationality.is_some()
            && self.degree.is_some()
            && self.gpa_value().is_some()
            && self.field.is_some()
            && self.work_experience_years.is_some()
    }
}

/// Catalog lifecycle state of a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramStatus {
    #[default]
    Active,
    Draft,
    Archived,
}

/// A scholarship/funding opportunity with its attached eligibility rules.
///
/// Rules arrive embedded under the store's `eligibility_rules` key and
/// default to empty when a program has none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub funding_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub status: ProgramStatus,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "eligibility_rules", default)]
    pub rules: Vec<EligibilityRule>,
}

impl Program {
    pub fn is_active(&self) -> bool {
        self.status == ProgramStatus::Active
    }
}

/// Kind of constraint an eligibility rule expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Gpa,
    Degree,
    Nationality,
    Age,
    WorkExperience,
    Language,
    Other,
}

/// Comparison operator attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOperator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "between")]
    Between,
}

/// Provenance strength of an extracted rule. Advisory for display only;
/// never consulted when deciding match/fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleConfidence {
    High,
    Medium,
    #[default]
    Inferred,
}

/// One structured eligibility constraint on a program.
///
/// `value` stays an open JSON object because its shape is keyed by
/// `rule_type`/`operator` (e.g. `{"min": 3.5}`, `{"countries": [...]}`);
/// the typed view lives in `core::rules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub program_id: String,
    pub rule_type: RuleType,
    pub operator: RuleOperator,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub confidence: RuleConfidence,
}

/// Five-tier classification produced by the AI agent's scoring path.
/// The rule-based fallback only ever emits strong/possible/not_eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    PerfectMatch,
    StrongMatch,
    PossibleMatch,
    WeakMatch,
    NotEligible,
}

impl MatchTier {
    /// Sort rank, best tier first.
    pub fn rank(self) -> u8 {
        match self {
            MatchTier::PerfectMatch => 0,
            MatchTier::StrongMatch => 1,
            MatchTier::PossibleMatch => 2,
            MatchTier::WeakMatch => 3,
            MatchTier::NotEligible => 4,
        }
    }
}

/// Policy for rules the evaluator has no comparator for.
///
/// `Permissive` (the shipped default) counts them on the pass side so an
/// unrecognized rule never disqualifies a program; `Strict` fails closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRulePolicy {
    #[default]
    Permissive,
    Strict,
}

/// One turn of an onboarding conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub role: ConversationRole,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

/// Authenticated user as reported by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Session issued by the auth provider on sign-in/sign-up/code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// App-level row from the `users` table (distinct from the auth user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Premium subscription row; vocabulary owned by the billing provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub plan: String,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<chrono::DateTime<chrono::Utc>>,
}

/// Textual requirement attached to a program (essays, references, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub program_id: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// An application deadline round for a program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deadline {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub program_id: String,
    pub label: String,
    pub due_date: chrono::NaiveDate,
}

/// Program with its requirements and deadlines embedded, as returned by the
/// detail fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub deadlines: Vec<Deadline>,
}

/// Display projection of a program for list/bucket responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub funding_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub application_url: Option<String>,
    pub rule_count: usize,
}

impl From<&Program> for ProgramSummary {
    fn from(program: &Program) -> Self {
        Self {
            id: program.id.clone(),
            name: program.name.clone(),
            provider: program.provider.clone(),
            country: program.country.clone(),
            funding_amount: program.funding_amount,
            currency: program.currency.clone(),
            application_url: program.application_url.clone(),
            rule_count: program.rules.len(),
        }
    }
}
