use actix_web::{web, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::core::{MatchError, Matcher};
use crate::models::{
    ErrorResponse, HealthResponse, MatchDonorsRequest, MatchRequestsRequest, MatchResponse,
    SuggestionsRequest, SuggestionsResponse,
};
use crate::services::{intake, prepare_donors, prepare_requests, AddressResolver};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: Matcher,
    pub resolver: Arc<dyn AddressResolver>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/donors", web::post().to(match_donors))
        .route("/matches/requests", web::post().to(match_requests))
        .route("/suggestions", web::post().to(suggestions));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Rank donors for a blood request
///
/// POST /api/v1/matches/donors
///
/// Request body:
/// ```json
/// {
///   "request": { "id": "req-1", "bloodGroup": "A+", "hospitalAddress": "...", "urgency": "high",
///                "unitsNeeded": 2, "requiredDate": "2024-03-20" },
///   "donors": [{ "id": "d-1", "bloodGroup": "O-", "latitude": 19.0, "longitude": 72.8,
///                "availableDate": "2024-03-01" }]
/// }
/// ```
async fn match_donors(
    state: web::Data<AppState>,
    req: web::Json<MatchDonorsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let MatchDonorsRequest { request, donors } = req.into_inner();

    let request = match intake::prepare_request(request, state.resolver.as_ref()).await {
        Ok(request) => request,
        Err(skipped) => {
            return HttpResponse::UnprocessableEntity().json(ErrorResponse {
                error: "Invalid blood request".to_string(),
                message: format!("{}: {}", skipped.id, skipped.reason),
                status_code: 422,
            });
        }
    };

    let prepared = prepare_donors(donors, state.resolver.as_ref()).await;

    tracing::info!(
        "Matching donors for request {} ({} accepted, {} skipped at intake)",
        request.id,
        prepared.accepted.len(),
        prepared.skipped.len()
    );

    let report = match state.matcher.donors_for_request(&request, &prepared.accepted) {
        Ok(report) => report,
        Err(e) => return matching_failed(e),
    };

    let total_candidates = report.total_candidates + prepared.skipped.len();
    let mut skipped = prepared.skipped;
    skipped.extend(report.skipped);

    HttpResponse::Ok().json(MatchResponse {
        matches: report.matches,
        skipped,
        total_eligible: report.total_eligible,
        total_candidates,
    })
}

/// Rank open requests for a donor
///
/// POST /api/v1/matches/requests
async fn match_requests(
    state: web::Data<AppState>,
    req: web::Json<MatchRequestsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let MatchRequestsRequest { donor, requests, as_of } = req.into_inner();
    let as_of = reference_date(as_of);

    let donor = match intake::prepare_donor(donor, state.resolver.as_ref()).await {
        Ok(donor) => donor,
        Err(skipped) => {
            return HttpResponse::UnprocessableEntity().json(ErrorResponse {
                error: "Invalid donor".to_string(),
                message: format!("{}: {}", skipped.id, skipped.reason),
                status_code: 422,
            });
        }
    };

    let prepared = prepare_requests(requests, state.resolver.as_ref()).await;

    tracing::info!(
        "Matching requests for donor {} as of {} ({} accepted, {} skipped at intake)",
        donor.id,
        as_of,
        prepared.accepted.len(),
        prepared.skipped.len()
    );

    let report = match state.matcher.requests_for_donor(&donor, &prepared.accepted, as_of) {
        Ok(report) => report,
        Err(e) => return matching_failed(e),
    };

    let total_candidates = report.total_candidates + prepared.skipped.len();
    let mut skipped = prepared.skipped;
    skipped.extend(report.skipped);

    HttpResponse::Ok().json(MatchResponse {
        matches: report.matches,
        skipped,
        total_eligible: report.total_eligible,
        total_candidates,
    })
}

/// Suggest nearby requests for every donor in a snapshot
///
/// POST /api/v1/suggestions
async fn suggestions(
    state: web::Data<AppState>,
    req: web::Json<SuggestionsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let SuggestionsRequest { donors, requests, as_of } = req.into_inner();
    let as_of = reference_date(as_of);

    let (donors, requests) = futures::join!(
        prepare_donors(donors, state.resolver.as_ref()),
        prepare_requests(requests, state.resolver.as_ref()),
    );

    let suggestions = match state
        .matcher
        .suggest_requests_for_donors(&donors.accepted, &requests.accepted, as_of)
    {
        Ok(suggestions) => suggestions,
        Err(e) => return matching_failed(e),
    };

    tracing::info!(
        "Built suggestions for {} donors against {} requests",
        suggestions.len(),
        requests.accepted.len()
    );

    let mut skipped = donors.skipped;
    skipped.extend(requests.skipped);

    HttpResponse::Ok().json(SuggestionsResponse { suggestions, skipped })
}

fn reference_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed: field_errors={:?}", errors);
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn matching_failed(err: MatchError) -> HttpResponse {
    tracing::error!("Matching failed: {}", err);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Matching configuration error".to_string(),
        message: err.to_string(),
        status_code: 500,
    })
}
