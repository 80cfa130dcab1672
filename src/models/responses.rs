use serde::{Deserialize, Serialize};

use crate::models::domain::{MatchResult, Skipped};

/// Ranked results for a single donor or request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
    pub skipped: Vec<Skipped>,
    #[serde(rename = "totalEligible")]
    pub total_eligible: usize,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Ranked requests suggested to one donor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorSuggestions {
    #[serde(rename = "donorId")]
    pub donor_id: String,
    pub matches: Vec<MatchResult>,
}

/// Response for the batch suggestions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<DonorSuggestions>,
    pub skipped: Vec<Skipped>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
