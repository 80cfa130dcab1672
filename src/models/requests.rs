use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::records::{DonorRecord, RequestRecord};

/// Request to rank candidate donors for one blood request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchDonorsRequest {
    pub request: RequestRecord,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub donors: Vec<DonorRecord>,
}

/// Request to rank open blood requests for one donor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequestsRequest {
    pub donor: DonorRecord,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
    /// Reference date for expiry checks, defaults to today (UTC)
    #[serde(rename = "asOf", alias = "as_of", default)]
    pub as_of: Option<NaiveDate>,
}

/// Request to suggest nearby requests for every donor in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SuggestionsRequest {
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub donors: Vec<DonorRecord>,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
    #[serde(rename = "asOf", alias = "as_of", default)]
    pub as_of: Option<NaiveDate>,
}
