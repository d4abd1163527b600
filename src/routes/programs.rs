use actix_web::{web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    ErrorResponse, IngestRequest, IngestResponse, ProgramDetail, ProgramDetailResponse,
    ProgramListResponse, ProgramSummary,
};
use crate::routes::AppState;
use crate::services::{CacheKey, SupabaseError};

/// Configure program catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/programs", web::get().to(list_programs))
        .route("/programs/{id}", web::get().to(get_program))
        .route("/admin/ingest", web::post().to(ingest));
}

/// Program catalog listing
///
/// GET /api/v1/programs?country=Ghana&search=engineering&limit=20&offset=0
///
/// Lists active programs, optionally filtered by country and by a
/// case-insensitive substring of the name or provider.
async fn list_programs(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let programs = match super::qualify::load_catalog(&state).await {
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

    let country_filter = query.get("country").map(|c| c.to_lowercase());
    let search_filter = query.get("search").map(|s| s.to_lowercase());
    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(state.matching.default_limit as usize)
        .min(state.matching.max_limit as usize);
    let offset = query
        .get("offset")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let filtered: Vec<ProgramSummary> = programs
        .iter()
        .filter(|p| match &country_filter {
            Some(country) => p
                .country
                .as_ref()
                .map(|c| c.to_lowercase() == *country)
                .unwrap_or(false),
            None => true,
        })
        .filter(|p| match &search_filter {
            Some(needle) => {
                p.name.to_lowercase().contains(needle)
                    || p.provider.to_lowercase().contains(needle)
            }
            None => true,
        })
        .map(ProgramSummary::from)
        .collect();

    let total_results = filtered.len();
    let page: Vec<ProgramSummary> = filtered.into_iter().skip(offset).take(limit).collect();

    HttpResponse::Ok().json(ProgramListResponse {
        programs: page,
        total_results,
    })
}

/// Program detail
///
/// GET /api/v1/programs/{id}
///
/// Returns one program with its rules, requirements and deadlines.
async fn get_program(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let program_id = path.into_inner();
    let cache_key = CacheKey::program_detail(&program_id);

    if let Ok(detail) = state.cache.get::<ProgramDetail>(&cache_key).await {
        return HttpResponse::Ok().json(ProgramDetailResponse { detail });
    }

    match state.supabase.get_program(&program_id).await {
        Ok(detail) => {
            if let Err(e) = state.cache.set(&cache_key, &detail).await {
                tracing::warn!("Failed to cache program {}: {}", program_id, e);
            }
            HttpResponse::Ok().json(ProgramDetailResponse { detail })
        }
        Err(SupabaseError::NotFound(_)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Program not found".to_string(),
            message: format!("No program with id {}", program_id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch program {}: {}", program_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch program".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Admin ingestion endpoint
///
/// POST /api/v1/admin/ingest
///
/// Request body:
/// ```json
/// {
///   "urls": ["https://example.org/scholarship"]
/// }
/// ```
///
/// Forwards scholarship page URLs to the agent's extraction pipeline.
/// Guarded by the X-Admin-Key header.
async fn ingest(
    state: web::Data<AppState>,
    req: web::Json<IngestRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let provided_key = http_req
        .headers()
        .get("X-Admin-Key")
        .and_then(|v| v.to_str().ok());

    let authorized = match (&state.admin_api_key, provided_key) {
        (Some(expected), Some(provided)) => expected == provided,
        _ => false,
    };
    if !authorized {
        return HttpResponse::Forbidden().json(ErrorResponse {
            error: "Forbidden".to_string(),
            message: "Valid X-Admin-Key header required".to_string(),
            status_code: 403,
        });
    }

    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let (accepted, rejected): (Vec<String>, Vec<String>) = req
        .urls
        .iter()
        .cloned()
        .partition(|url| url.starts_with("https://") || url.starts_with("http://"));

    if accepted.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "No usable URLs".to_string(),
            message: "Every submitted URL was rejected".to_string(),
            status_code: 400,
        });
    }

    match state.agent.ingest_urls(&accepted).await {
        Ok(ack) => {
            // New programs land asynchronously; stale catalog entries age out
            // with the TTL, the explicit invalidation just shortens the wait
            for pattern in ["programs:*", "detail:*"] {
                if let Err(e) = state.cache.invalidate_pattern(pattern).await {
                    tracing::warn!("Failed to invalidate cache pattern {}: {}", pattern, e);
                }
            }

            tracing::info!("Ingestion job {} accepted {} URLs", ack.job_id, ack.accepted);

            HttpResponse::Accepted().json(IngestResponse {
                accepted: ack.accepted,
                rejected,
                job_id: ack.job_id,
            })
        }
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Ingestion failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
