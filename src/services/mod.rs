// Service exports
pub mod agent;
pub mod cache;
pub mod postgres;
pub mod session;
pub mod supabase;

pub use agent::{AgentChatReply, AgentClient, AgentError, AgentIngestAck, AgentScoredProgram};
pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use postgres::{EvalSource, EvaluationRun, PostgresClient, PostgresError, RunStats};
pub use session::{bearer_token, SessionClaims, SessionError, SessionVerifier};
pub use supabase::{SupabaseClient, SupabaseError, SupabaseTables};
