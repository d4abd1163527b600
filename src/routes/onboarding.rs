use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AcademicProfile, ConversationRole, ConversationTurn, ErrorResponse, OnboardingMessageRequest,
    OnboardingMessageResponse,
};
use crate::routes::AppState;
use crate::services::{CacheKey, SupabaseError};

/// Configure onboarding routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/onboarding/message", web::post().to(onboarding_message));
}

/// Conversational onboarding endpoint
///
/// POST /api/v1/onboarding/message
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "message": "I'm from Ghana, final year BSc, GPA around 3.6"
/// }
/// ```
///
/// Relays the message to the agent, folds extracted fields into the stored
/// profile, and reports whether the profile is complete.
async fn onboarding_message(
    state: web::Data<AppState>,
    req: web::Json<OnboardingMessageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let user_id = &req.user_id;

    let mut profile = match state.supabase.get_academic_profile(user_id).await {
        Ok(profile) => profile,
        Err(SupabaseError::NotFound(_)) => AcademicProfile {
            user_id: user_id.clone(),
            ..AcademicProfile::default()
        },
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let reply = match state.agent.chat(user_id, &req.message, &profile).await {
        Ok(reply) => reply,
        Err(e) if e.is_unavailable() => {
            tracing::warn!("Agent unavailable for onboarding turn: {}", e);
            return HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Assistant unavailable".to_string(),
                message: "The onboarding assistant is temporarily unavailable".to_string(),
                status_code: 503,
            });
        }
        Err(e) => {
            tracing::error!("Agent chat failed for {}: {}", user_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Chat failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    if let Some(updates) = &reply.profile_updates {
        profile.absorb(updates);
        profile.user_id = user_id.clone();
        profile.updated_at = Some(chrono::Utc::now());

        if let Err(e) = state.supabase.upsert_academic_profile(&profile).await {
            tracing::error!("Failed to persist profile for {}: {}", user_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to save profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }

        if let Err(e) = state.cache.delete(&CacheKey::profile(user_id)).await {
            tracing::warn!("Failed to invalidate profile cache for {}: {}", user_id, e);
        }
    }

    let profile_complete = profile.is_complete();
    if profile_complete {
        if let Err(e) = state.supabase.mark_onboarding_complete(user_id).await {
            tracing::warn!("Failed to flag onboarding complete for {}: {}", user_id, e);
        }
    }

    // Transcript recording is best-effort; the conversation continues
    // from the client's local history either way
    let now = chrono::Utc::now();
    let turns = [
        ConversationTurn {
            user_id: user_id.clone(),
            role: ConversationRole::User,
            content: req.message.clone(),
            created_at: now,
        },
        ConversationTurn {
            user_id: user_id.clone(),
            role: ConversationRole::Assistant,
            content: reply.reply.clone(),
            created_at: now,
        },
    ];
    if let Err(e) = state.supabase.record_conversation_turns(&turns).await {
        tracing::warn!("Failed to record conversation turns for {}: {}", user_id, e);
    }

    tracing::info!(
        "Onboarding turn for {}: {} fields extracted, complete: {}",
        user_id,
        reply.extracted_fields.len(),
        profile_complete
    );

    HttpResponse::Ok().json(OnboardingMessageResponse {
        reply: reply.reply,
        profile_complete,
        extracted_fields: reply.extracted_fields,
    })
}
