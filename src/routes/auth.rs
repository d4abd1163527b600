use actix_web::{web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AuthCallbackRequest, ErrorResponse, MeResponse, Session, SessionResponse, SignInRequest,
    SignUpRequest, UserRecord,
};
use crate::routes::AppState;
use crate::services::{bearer_token, SupabaseError};

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/signup", web::post().to(sign_up))
        .route("/auth/signin", web::post().to(sign_in))
        .route("/auth/callback", web::post().to(auth_callback))
        .route("/auth/signout", web::post().to(sign_out))
        .route("/auth/me", web::get().to(me));
}

fn auth_error(e: SupabaseError, context: &str) -> HttpResponse {
    match e {
        SupabaseError::Unauthorized => HttpResponse::Unauthorized().json(ErrorResponse {
            error: "Unauthorized".to_string(),
            message: "Invalid credentials".to_string(),
            status_code: 401,
        }),
        SupabaseError::ApiError(message) => HttpResponse::BadRequest().json(ErrorResponse {
            error: context.to_string(),
            message,
            status_code: 400,
        }),
        e => {
            tracing::error!("{}: {}", context, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: context.to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

fn session_response(session: Session, context: &str) -> HttpResponse {
    match session.user.clone() {
        Some(user) => HttpResponse::Ok().json(SessionResponse { session, user }),
        None => {
            tracing::error!("{}: session issued without embedded user", context);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: context.to_string(),
                message: "Auth provider returned no user".to_string(),
                status_code: 500,
            })
        }
    }
}

/// Registration endpoint
///
/// POST /api/v1/auth/signup
///
/// Request body:
/// ```json
/// {
///   "email": "student@example.com",
///   "password": "at least 8 chars",
///   "displayName": "optional"
/// }
/// ```
async fn sign_up(state: web::Data<AppState>, req: web::Json<SignUpRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let session = match state
        .supabase
        .sign_up(&req.email, &req.password, req.display_name.as_deref())
        .await
    {
        Ok(session) => session,
        Err(e) => return auth_error(e, "Signup failed"),
    };

    // The app-level row is created eagerly so onboarding state has a home.
    // Failure here is recoverable: /auth/me backfills missing rows.
    if let Some(user) = &session.user {
        let record = UserRecord {
            id: user.id.clone(),
            display_name: req.display_name.clone(),
            onboarding_completed: false,
            created_at: None,
        };
        if let Err(e) = state.supabase.create_user_record(&record).await {
            tracing::warn!("Failed to create user record for {}: {}", user.id, e);
        }
    }

    session_response(session, "Signup failed")
}

/// Sign-in endpoint
///
/// POST /api/v1/auth/signin
async fn sign_in(state: web::Data<AppState>, req: web::Json<SignInRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match state.supabase.sign_in(&req.email, &req.password).await {
        Ok(session) => session_response(session, "Sign-in failed"),
        Err(e) => auth_error(e, "Sign-in failed"),
    }
}

/// OAuth/PKCE callback endpoint
///
/// POST /api/v1/auth/callback
///
/// Exchanges the provider's authorization code for a session. First-time
/// OAuth users get their app-level row created here.
async fn auth_callback(
    state: web::Data<AppState>,
    req: web::Json<AuthCallbackRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let session = match state.supabase.exchange_code(&req.code).await {
        Ok(session) => session,
        Err(e) => return auth_error(e, "Code exchange failed"),
    };

    if let Some(user) = &session.user {
        match state.supabase.get_user_record(&user.id).await {
            Ok(None) => {
                let record = UserRecord {
                    id: user.id.clone(),
                    display_name: None,
                    onboarding_completed: false,
                    created_at: None,
                };
                if let Err(e) = state.supabase.create_user_record(&record).await {
                    tracing::warn!("Failed to create user record for {}: {}", user.id, e);
                }
            }
            Ok(Some(_)) => {}
            Err(e) => {
                tracing::warn!("Failed to look up user record for {}: {}", user.id, e);
            }
        }
    }

    session_response(session, "Code exchange failed")
}

/// Sign-out endpoint
///
/// POST /api/v1/auth/signout
///
/// Revokes the session behind the bearer token.
async fn sign_out(state: web::Data<AppState>, http_req: HttpRequest) -> impl Responder {
    let header = http_req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match bearer_token(header) {
        Ok(token) => token,
        Err(e) => {
            return HttpResponse::Unauthorized().json(ErrorResponse {
                error: "Unauthorized".to_string(),
                message: e.to_string(),
                status_code: 401,
            });
        }
    };

    match state.supabase.sign_out(token).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => auth_error(e, "Sign-out failed"),
    }
}

/// Current-user endpoint
///
/// GET /api/v1/auth/me
///
/// Verifies the bearer token locally, then reports the user's plan and
/// onboarding state.
async fn me(state: web::Data<AppState>, http_req: HttpRequest) -> impl Responder {
    let header = http_req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = match bearer_token(header).and_then(|token| state.sessions.verify(token)) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Session verification failed: {}", e);
            return HttpResponse::Unauthorized().json(ErrorResponse {
                error: "Unauthorized".to_string(),
                message: "Invalid or missing bearer token".to_string(),
                status_code: 401,
            });
        }
    };

    let record = match state.supabase.get_user_record(&claims.sub).await {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            // OAuth users can reach here before their row exists; backfill
            let record = UserRecord {
                id: claims.sub.clone(),
                display_name: None,
                onboarding_completed: false,
                created_at: None,
            };
            if let Err(e) = state.supabase.create_user_record(&record).await {
                tracing::warn!("Failed to backfill user record for {}: {}", claims.sub, e);
            }
            Some(record)
        }
        Err(e) => {
            tracing::warn!("Failed to fetch user record for {}: {}", claims.sub, e);
            None
        }
    };

    let plan = match state.supabase.get_subscription(&claims.sub).await {
        Ok(Some(subscription)) => subscription.plan,
        Ok(None) => "free".to_string(),
        Err(e) => {
            tracing::warn!("Failed to fetch subscription for {}: {}", claims.sub, e);
            "free".to_string()
        }
    };

    HttpResponse::Ok().json(MeResponse {
        user: crate::models::AuthUser {
            id: claims.sub,
            email: claims.email,
            created_at: None,
        },
        plan,
        profile_complete: record.map(|r| r.onboarding_completed).unwrap_or(false),
    })
}
