// Model exports
pub mod domain;
pub mod records;
pub mod requests;
pub mod responses;

pub use domain::{
    AvailabilityWindow, BloodRequest, BloodType, BoundingBox, Coordinates, Donor, MatchConstraints,
    MatchResult, ScoreBreakdown, ScoringPolicy, SkipReason, Skipped, Urgency,
};
pub use records::{DonorRecord, NumberOrText, RequestRecord};
pub use requests::{MatchDonorsRequest, MatchRequestsRequest, SuggestionsRequest};
pub use responses::{DonorSuggestions, ErrorResponse, HealthResponse, MatchResponse, SuggestionsResponse};
