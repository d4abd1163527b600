// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AcademicProfile, AuthUser, ConversationRole, ConversationTurn, Deadline, EligibilityRule,
    GpaBand, MatchTier, Program, ProgramDetail, ProgramStatus, ProgramSummary, Requirement,
    RuleConfidence, RuleOperator, RuleType, Session, Subscription, UnknownRulePolicy, UserRecord,
};
pub use requests::{
    AuthCallbackRequest, IngestRequest, OnboardingMessageRequest, QualifyRequest,
    ScoreMatchesRequest, SignInRequest, SignUpRequest,
};
pub use responses::{
    ErrorResponse, HealthResponse, IngestResponse, MeResponse, OnboardingMessageResponse,
    ProgramDetailResponse, ProgramListResponse, QualifyResponse, ScoreMatchesResponse,
    ScoredProgramMatch, SessionResponse,
};
