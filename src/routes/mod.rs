// Route exports
pub mod auth;
pub mod onboarding;
pub mod programs;
pub mod qualify;

use actix_web::web;
use std::sync::Arc;

use crate::config::MatchingSettings;
use crate::core::Evaluator;
use crate::services::{AgentClient, CacheManager, PostgresClient, SessionVerifier, SupabaseClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub supabase: Arc<SupabaseClient>,
    pub agent: Arc<AgentClient>,
    pub cache: Arc<CacheManager>,
    pub postgres: Arc<PostgresClient>,
    pub sessions: Arc<SessionVerifier>,
    pub evaluator: Evaluator,
    pub matching: MatchingSettings,
    pub admin_api_key: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(qualify::configure)
            .configure(programs::configure)
            .configure(onboarding::configure)
            .configure(auth::configure),
    );
}
