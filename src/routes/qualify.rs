use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AcademicProfile, ErrorResponse, HealthResponse, MatchTier, Program, ProgramSummary,
    QualifyRequest, QualifyResponse, ScoreMatchesRequest, ScoreMatchesResponse, ScoredProgramMatch,
};
use crate::models::responses::MatchSource;
use crate::routes::AppState;
use crate::services::{CacheKey, EvalSource, SupabaseError};

/// Configure qualification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/qualify", web::post().to(qualify))
        .route("/qualify/history", web::get().to(qualify_history))
        .route("/matches/score", web::post().to(score_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);
    let agent_healthy = state.agent.health().await;

    // The agent being down only degrades scoring; rules still work
    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        agent_reachable: agent_healthy,
        timestamp: chrono::Utc::now(),
    })
}

/// Load the active catalog, preferring cache over the store.
pub(crate) async fn load_catalog(state: &AppState) -> Result<Vec<Program>, SupabaseError> {
    let cache_key = CacheKey::active_programs();

    if let Ok(programs) = state.cache.get::<Vec<Program>>(&cache_key).await {
        return Ok(programs);
    }

    let programs = state.supabase.list_active_programs().await?;

    if let Err(e) = state.cache.set(&cache_key, &programs).await {
        tracing::warn!("Failed to cache program catalog: {}", e);
    }

    Ok(programs)
}

/// Resolve the profile to evaluate: stored fields when a user id is given,
/// with inline request fields overriding them.
async fn resolve_profile(
    state: &AppState,
    req: &QualifyRequest,
) -> Result<AcademicProfile, SupabaseError> {
    let mut profile = match &req.user_id {
        Some(user_id) => {
            let cache_key = CacheKey::profile(user_id);
            if let Ok(stored) = state.cache.get::<AcademicProfile>(&cache_key).await {
                stored
            } else {
                match state.supabase.get_academic_profile(user_id).await {
                    Ok(stored) => {
                        if let Err(e) = state.cache.set(&cache_key, &stored).await {
                            tracing::warn!("Failed to cache profile for {}: {}", user_id, e);
                        }
                        stored
                    }
                    // A known user without a saved profile can still send
                    // fields inline
                    Err(SupabaseError::NotFound(_)) => AcademicProfile {
                        user_id: user_id.clone(),
                        ..AcademicProfile::default()
                    },
                    Err(e) => return Err(e),
                }
            }
        }
        None => AcademicProfile::default(),
    };

    if req.has_inline_fields() {
        profile.absorb(&req.profile_fragment());
    }

    Ok(profile)
}

/// Qualification endpoint
///
/// POST /api/v1/qualify
///
/// Request body:
/// ```json
/// {
///   "userId": "string (optional)",
///   "nationality": "Ghana",
///   "degree": "BSc",
///   "gpaBand": "3.5_4.0",
///   "workExperienceYears": 2
/// }
/// ```
///
/// Buckets every active program into eligible / maybe / not_eligible.
async fn qualify(
    state: web::Data<AppState>,
    req: web::Json<QualifyRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for qualify request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let profile = match resolve_profile(&state, &req).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("Failed to resolve profile: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to resolve profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let programs = match load_catalog(&state).await {
        Ok(programs) => programs,
        Err(e) => {
            tracing::error!("Failed to load program catalog: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load programs".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let total_programs = programs.len();
    tracing::info!(
        "Evaluating {} programs for user {:?}",
        total_programs,
        req.user_id
    );

    let buckets = state.evaluator.evaluate(&profile, programs);

    // Audit trail is best-effort; evaluation results never depend on it
    if let Some(user_id) = &req.user_id {
        if let Err(e) = state
            .postgres
            .record_run(
                user_id,
                EvalSource::Rules,
                buckets.eligible.len(),
                buckets.maybe.len(),
                buckets.not_eligible.len(),
            )
            .await
        {
            tracing::warn!("Failed to record evaluation run for {}: {}", user_id, e);
        }
    }

    let summaries = |bucket: &[Program]| -> Vec<ProgramSummary> {
        bucket.iter().map(ProgramSummary::from).collect()
    };

    let response = QualifyResponse {
        eligible: summaries(&buckets.eligible),
        maybe: summaries(&buckets.maybe),
        not_eligible: summaries(&buckets.not_eligible),
        total_programs,
    };

    tracing::info!(
        "Qualification done: {} eligible, {} maybe, {} not eligible",
        response.eligible.len(),
        response.maybe.len(),
        response.not_eligible.len()
    );

    HttpResponse::Ok().json(response)
}

/// Evaluation run history for a user
///
/// GET /api/v1/qualify/history?userId={userId}&limit=20&offset=0
async fn qualify_history(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing userId parameter".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(20)
        .min(100);
    let offset = query
        .get("offset")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    match state.postgres.run_history(user_id, limit, offset).await {
        Ok(runs) => HttpResponse::Ok().json(serde_json::json!({
            "userId": user_id,
            "count": runs.len(),
            "runs": runs,
        })),
        Err(e) => {
            tracing::error!("Failed to fetch run history for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch run history".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

fn fallback_tier(verdict: crate::core::Verdict) -> MatchTier {
    match verdict {
        crate::core::Verdict::Eligible => MatchTier::StrongMatch,
        crate::core::Verdict::Maybe => MatchTier::PossibleMatch,
        crate::core::Verdict::NotEligible => MatchTier::NotEligible,
    }
}

/// Tiered match scoring endpoint
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "limit": 20
/// }
/// ```
///
/// Scores the catalog through the AI agent; when the agent is unreachable
/// the rule evaluator supplies coarser tiers instead.
async fn score_matches(
    state: web::Data<AppState>,
    req: web::Json<ScoreMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let user_id = &req.user_id;
    let limit = req.limit.min(state.matching.max_limit) as usize;

    // Scoring needs a saved profile; anonymous callers use /qualify
    let profile = match state.supabase.get_academic_profile(user_id).await {
        Ok(profile) => profile,
        Err(SupabaseError::NotFound(_)) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Profile not found".to_string(),
                message: format!("No academic profile saved for user {}", user_id),
                status_code: 404,
            });
        }
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let programs = match load_catalog(&state).await {
        Ok(programs) => programs,
        Err(e) => {
            tracing::error!("Failed to load program catalog: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load programs".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let total_programs = programs.len();

    let (mut matches, source) = match state.agent.score_programs(&profile, &programs).await {
        Ok(scored) => {
            let by_id: std::collections::HashMap<&str, &Program> =
                programs.iter().map(|p| (p.id.as_str(), p)).collect();

            let matches: Vec<ScoredProgramMatch> = scored
                .into_iter()
                .filter_map(|s| {
                    by_id.get(s.program_id.as_str()).map(|program| ScoredProgramMatch {
                        program: ProgramSummary::from(*program),
                        tier: s.tier,
                        reason: s.reason,
                    })
                })
                .collect();

            (matches, MatchSource::Agent)
        }
        Err(e) if e.is_unavailable() => {
            tracing::warn!("Agent unavailable, falling back to rule tiers: {}", e);

            let matches: Vec<ScoredProgramMatch> = programs
                .iter()
                .map(|program| {
                    let (verdict, tally) = state.evaluator.classify(&profile, program);
                    ScoredProgramMatch {
                        program: ProgramSummary::from(program),
                        tier: fallback_tier(verdict),
                        reason: Some(format!(
                            "Matched {} of {} requirement checks",
                            tally.matched,
                            tally.total()
                        )),
                    }
                })
                .collect();

            (matches, MatchSource::RulesFallback)
        }
        Err(e) => {
            tracing::error!("Agent scoring failed for {}: {}", user_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Scoring failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    matches.sort_by_key(|m| m.tier.rank());
    matches.truncate(limit);

    let run_source = match source {
        MatchSource::Agent => EvalSource::Agent,
        MatchSource::RulesFallback => EvalSource::Rules,
    };
    let eligible = matches
        .iter()
        .filter(|m| m.tier.rank() <= MatchTier::StrongMatch.rank())
        .count();
    let maybe = matches
        .iter()
        .filter(|m| {
            m.tier == MatchTier::PossibleMatch || m.tier == MatchTier::WeakMatch
        })
        .count();
    let not_eligible = matches
        .iter()
        .filter(|m| m.tier == MatchTier::NotEligible)
        .count();

    if let Err(e) = state
        .postgres
        .record_run(user_id, run_source, eligible, maybe, not_eligible)
        .await
    {
        tracing::warn!("Failed to record scoring run for {}: {}", user_id, e);
    }

    let response = ScoreMatchesResponse {
        matches,
        source,
        total_programs,
    };

    tracing::info!(
        "Returning {} scored matches for user {} (source: {:?})",
        response.matches.len(),
        user_id,
        response.source
    );

    HttpResponse::Ok().json(response)
}
