use serde::{Deserialize, Serialize};

use crate::models::domain::{AuthUser, MatchTier, ProgramDetail, ProgramSummary, Session};

/// Response for the qualification endpoint: every catalog program lands in
/// exactly one of the three buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifyResponse {
    pub eligible: Vec<ProgramSummary>,
    pub maybe: Vec<ProgramSummary>,
    pub not_eligible: Vec<ProgramSummary>,
    pub total_programs: usize,
}

/// Where a set of match scores came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Agent,
    RulesFallback,
}

/// One scored program in a tiered match listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredProgramMatch {
    pub program: ProgramSummary,
    pub tier: MatchTier,
    pub reason: Option<String>,
}

/// Response for tiered match scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreMatchesResponse {
    pub matches: Vec<ScoredProgramMatch>,
    pub source: MatchSource,
    pub total_programs: usize,
}

/// Response for one onboarding conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingMessageResponse {
    pub reply: String,
    pub profile_complete: bool,
    pub extracted_fields: Vec<String>,
}

/// Program catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramListResponse {
    pub programs: Vec<ProgramSummary>,
    pub total_results: usize,
}

/// Single program with its requirements and deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDetailResponse {
    #[serde(flatten)]
    pub detail: ProgramDetail,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub agent_reachable: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Admin ingestion kickoff acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub accepted: usize,
    pub rejected: Vec<String>,
    pub job_id: String,
}

/// Session establishment response (signup, signin, callback).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: Session,
    pub user: AuthUser,
}

/// Current-user response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: AuthUser,
    pub plan: String,
    pub profile_complete: bool,
}
