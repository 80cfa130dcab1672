use chrono::NaiveDate;
use thiserror::Error;

use crate::core::{
    distance::{calculate_bounding_box, distance_km, is_within_bounding_box},
    filters::{check_donor_for_request, check_request_for_donor},
    scoring::{calculate_score, PolicyError},
};
use crate::models::{
    BloodRequest, Coordinates, Donor, DonorSuggestions, MatchConstraints, MatchResult,
    ScoringPolicy, SkipReason, Skipped,
};

/// Call-level matching failures. Record-level problems never surface here;
/// they end up in [`MatchReport::skipped`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("scoring policy error: {0}")]
    Policy(#[from] PolicyError),
}

/// Outcome of one matching call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    /// Ranked results, best first
    pub matches: Vec<MatchResult>,
    /// Candidates excluded from ranking, in input order
    pub skipped: Vec<Skipped>,
    /// Set when the donor/request driving the query could not be matched at all
    pub anchor_skip: Option<SkipReason>,
    /// Candidates that passed every filter, before any top-K cut
    pub total_eligible: usize,
    pub total_candidates: usize,
}

/// Matching orchestrator - runs the filter, score and rank pipeline
///
/// # Pipeline Stages
/// 1. Activity flag
/// 2. Blood-type compatibility
/// 3. Date eligibility
/// 4. Distance and scoring, only for pairs that survived 1-3
/// 5. Stable ranking by score, ties keep input order
#[derive(Debug, Clone)]
pub struct Matcher {
    policy: ScoringPolicy,
    constraints: MatchConstraints,
}

impl Matcher {
    pub fn new(policy: ScoringPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            policy,
            constraints: MatchConstraints::default(),
        })
    }

    pub fn with_default_policy() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            constraints: MatchConstraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: MatchConstraints) -> Result<Self, PolicyError> {
        if let Some(max) = constraints.max_distance_km {
            if !max.is_finite() || max <= 0.0 {
                return Err(PolicyError::InvalidMaxDistance(max));
            }
        }
        self.constraints = constraints;
        Ok(self)
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn constraints(&self) -> &MatchConstraints {
        &self.constraints
    }

    /// Rank donors for one request and keep the best `units_needed`
    pub fn match_donors_for_request(
        &self,
        request: &BloodRequest,
        donors: &[Donor],
    ) -> Result<Vec<MatchResult>, MatchError> {
        Ok(self.donors_for_request(request, donors)?.matches)
    }

    /// Rank open requests a donor could serve
    pub fn match_requests_for_donor(
        &self,
        donor: &Donor,
        requests: &[BloodRequest],
        as_of: NaiveDate,
    ) -> Result<Vec<MatchResult>, MatchError> {
        Ok(self.requests_for_donor(donor, requests, as_of)?.matches)
    }

    /// Request → donors, with the reason every excluded donor was dropped
    pub fn donors_for_request(
        &self,
        request: &BloodRequest,
        donors: &[Donor],
    ) -> Result<MatchReport, MatchError> {
        let mut report = MatchReport {
            total_candidates: donors.len(),
            ..MatchReport::default()
        };

        if !request.is_active {
            report.anchor_skip = Some(SkipReason::Inactive);
            return Ok(report);
        }

        // Configuration problems fail the call even when nothing would score
        self.policy.urgency_bonus(request.urgency)?;

        let hospital = match anchor_coordinates(request.coordinates.as_ref()) {
            Ok(coordinates) => coordinates,
            Err(reason) => {
                tracing::debug!("Request {} cannot be matched: {}", request.id, reason);
                report.anchor_skip = Some(reason);
                return Ok(report);
            }
        };

        for donor in donors {
            let outcome = check_donor_for_request(donor, request, &self.constraints)
                .map_err(ScoreFailure::from)
                .and_then(|()| self.score_pair(donor, request, hospital, donor.coordinates.as_ref()));

            match outcome {
                Ok(result) => report.matches.push(result),
                Err(ScoreFailure::Skip(reason)) => {
                    report.skipped.push(Skipped::new(donor.id.clone(), reason))
                }
                Err(ScoreFailure::Policy(err)) => return Err(err.into()),
            }
        }

        report.total_eligible = report.matches.len();
        rank(&mut report.matches);
        report.matches.truncate(request.units_needed as usize);

        tracing::debug!(
            "Request {}: {} of {} donors eligible, returning {}",
            request.id,
            report.total_eligible,
            report.total_candidates,
            report.matches.len()
        );

        Ok(report)
    }

    /// Donor → requests, with the reason every excluded request was dropped
    pub fn requests_for_donor(
        &self,
        donor: &Donor,
        requests: &[BloodRequest],
        as_of: NaiveDate,
    ) -> Result<MatchReport, MatchError> {
        let mut report = MatchReport {
            total_candidates: requests.len(),
            ..MatchReport::default()
        };

        // Every active request must have a bonus, regardless of what this donor can serve
        for request in requests.iter().filter(|r| r.is_active) {
            self.policy.urgency_bonus(request.urgency)?;
        }

        if !donor.is_active {
            report.anchor_skip = Some(SkipReason::Inactive);
            return Ok(report);
        }

        let donor_position = match anchor_coordinates(donor.coordinates.as_ref()) {
            Ok(coordinates) => coordinates,
            Err(reason) => {
                tracing::debug!("Donor {} cannot be matched: {}", donor.id, reason);
                report.anchor_skip = Some(reason);
                return Ok(report);
            }
        };

        for request in requests {
            let outcome = check_request_for_donor(request, donor, as_of, &self.constraints)
                .map_err(ScoreFailure::from)
                .and_then(|()| {
                    self.score_pair(donor, request, donor_position, request.coordinates.as_ref())
                });

            match outcome {
                Ok(result) => report.matches.push(result),
                Err(ScoreFailure::Skip(reason)) => {
                    report.skipped.push(Skipped::new(request.id.clone(), reason))
                }
                Err(ScoreFailure::Policy(err)) => return Err(err.into()),
            }
        }

        report.total_eligible = report.matches.len();
        rank(&mut report.matches);

        Ok(report)
    }

    /// Run the donor → requests direction for every donor in a snapshot
    pub fn suggest_requests_for_donors(
        &self,
        donors: &[Donor],
        requests: &[BloodRequest],
        as_of: NaiveDate,
    ) -> Result<Vec<DonorSuggestions>, MatchError> {
        donors
            .iter()
            .map(|donor| {
                Ok(DonorSuggestions {
                    donor_id: donor.id.clone(),
                    matches: self.match_requests_for_donor(donor, requests, as_of)?,
                })
            })
            .collect()
    }

    /// Stage (d): distance and score for a pair that passed the filters.
    /// `anchor` has already been validated; `other` is the candidate's side.
    fn score_pair(
        &self,
        donor: &Donor,
        request: &BloodRequest,
        anchor: &Coordinates,
        other: Option<&Coordinates>,
    ) -> Result<MatchResult, ScoreFailure> {
        let other = other.ok_or(SkipReason::CoordinatesUnavailable)?;
        if !other.is_valid() {
            return Err(SkipReason::InvalidCoordinates.into());
        }

        if let Some(max) = self.constraints.max_distance_km {
            let bbox = calculate_bounding_box(anchor.latitude, anchor.longitude, max);
            if !is_within_bounding_box(other.latitude, other.longitude, &bbox) {
                return Err(SkipReason::OutOfRange.into());
            }
        }

        let distance = distance_km(anchor, other);
        if matches!(self.constraints.max_distance_km, Some(max) if distance > max) {
            return Err(SkipReason::OutOfRange.into());
        }

        let breakdown = calculate_score(distance, request.urgency, &self.policy)
            .map_err(ScoreFailure::Policy)?;

        Ok(MatchResult {
            donor_id: donor.id.clone(),
            request_id: request.id.clone(),
            distance_km: distance,
            score: breakdown.total(),
            breakdown,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_policy()
    }
}

enum ScoreFailure {
    Skip(SkipReason),
    Policy(PolicyError),
}

impl From<SkipReason> for ScoreFailure {
    fn from(reason: SkipReason) -> Self {
        ScoreFailure::Skip(reason)
    }
}

fn anchor_coordinates(coordinates: Option<&Coordinates>) -> Result<&Coordinates, SkipReason> {
    let coordinates = coordinates.ok_or(SkipReason::CoordinatesUnavailable)?;
    if !coordinates.is_valid() {
        return Err(SkipReason::InvalidCoordinates);
    }
    Ok(coordinates)
}

/// Sort by score descending. `sort_by` is stable, so equal scores keep
/// their input order.
fn rank(matches: &mut [MatchResult]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
}
