use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// ABO/Rh blood type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "AB+")]
    AbPositive,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::ONegative,
        BloodType::OPositive,
        BloodType::ANegative,
        BloodType::APositive,
        BloodType::BNegative,
        BloodType::BPositive,
        BloodType::AbNegative,
        BloodType::AbPositive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BloodType::ONegative => "O-",
            BloodType::OPositive => "O+",
            BloodType::ANegative => "A-",
            BloodType::APositive => "A+",
            BloodType::BNegative => "B-",
            BloodType::BPositive => "B+",
            BloodType::AbNegative => "AB-",
            BloodType::AbPositive => "AB+",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BloodType {
    type Err = SkipReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        BloodType::ALL
            .into_iter()
            .find(|t| t.label() == normalized)
            .ok_or_else(|| SkipReason::UnknownBloodType(s.to_string()))
    }
}

/// Request urgency tier, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    High,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Normal => "normal",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        };
        f.write_str(label)
    }
}

impl FromStr for Urgency {
    type Err = SkipReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Urgency::Normal),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            other => Err(SkipReason::MalformedRecord(format!(
                "unknown urgency level '{}'",
                other
            ))),
        }
    }
}

/// A resolved geographic position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Display only, never used in computation
    #[serde(rename = "formattedAddress", default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            formatted_address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.formatted_address = Some(address.into());
        self
    }

    /// Finite and within the latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Date (and optional time range) a donor can give blood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub date: NaiveDate,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<NaiveTime>,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<NaiveTime>,
}

impl AvailabilityWindow {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: None,
            end_time: None,
        }
    }
}

/// Validated donor snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub id: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "bloodType")]
    pub blood_type: BloodType,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Free-text location used when coordinates still need resolving
    #[serde(default)]
    pub location: Option<String>,
    pub availability: AvailabilityWindow,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "lastDonationDate", default)]
    pub last_donation_date: Option<NaiveDate>,
}

/// Validated blood request snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodRequest {
    pub id: String,
    #[serde(rename = "patientName", default)]
    pub patient_name: Option<String>,
    #[serde(rename = "hospitalName", default)]
    pub hospital_name: Option<String>,
    #[serde(rename = "contactEmail", default)]
    pub contact_email: Option<String>,
    #[serde(rename = "contactPhone", default)]
    pub contact_phone: Option<String>,
    #[serde(rename = "bloodType")]
    pub blood_type: BloodType,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(rename = "hospitalAddress", default)]
    pub hospital_address: Option<String>,
    pub urgency: Urgency,
    #[serde(rename = "unitsNeeded")]
    pub units_needed: u32,
    #[serde(rename = "requiredDate")]
    pub required_date: NaiveDate,
    #[serde(rename = "requiredTime", default)]
    pub required_time: Option<NaiveTime>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

/// Sub-scores behind a match score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub proximity: f64,
    pub urgency: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.proximity + self.urgency
    }
}

/// A scored (donor, request) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "donorId")]
    pub donor_id: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Why a record was left out of a result set
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("record is inactive")]
    Inactive,

    #[error("blood type is not compatible")]
    IncompatibleBloodType,

    #[error("donor is not available before the required date")]
    NotAvailableInTime,

    #[error("request required date has passed")]
    RequestExpired,

    #[error("donor donated too recently")]
    RecentDonation,

    #[error("coordinates unavailable")]
    CoordinatesUnavailable,

    #[error("coordinates out of range")]
    InvalidCoordinates,

    #[error("beyond the maximum matching distance")]
    OutOfRange,

    #[error("unknown blood type '{0}'")]
    UnknownBloodType(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("address resolution failed: {0}")]
    ResolutionFailed(String),
}

/// A record excluded from matching, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skipped {
    pub id: String,
    pub reason: SkipReason,
}

impl Skipped {
    pub fn new(id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            id: id.into(),
            reason,
        }
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Tunable scoring policy
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    /// Distance at which the proximity component reaches zero
    pub proximity_decay_km: f64,
    pub urgency_bonus: BTreeMap<Urgency, f64>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            proximity_decay_km: 100.0,
            urgency_bonus: BTreeMap::from([
                (Urgency::Normal, 20.0),
                (Urgency::High, 50.0),
                (Urgency::Critical, 80.0),
            ]),
        }
    }
}

/// Optional hard limits applied on top of the scoring policy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchConstraints {
    pub max_distance_km: Option<f64>,
    pub min_donation_interval_days: Option<u32>,
}
