use thiserror::Error;

use crate::models::{ScoreBreakdown, ScoringPolicy, Urgency};

/// Problems with the configured scoring policy
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("no urgency bonus configured for '{0}' urgency")]
    MissingUrgencyBonus(Urgency),

    #[error("unknown urgency level '{0}' in bonus table")]
    UnknownUrgency(String),

    #[error("urgency level '{0}' appears more than once in bonus table")]
    DuplicateUrgency(Urgency),

    #[error("urgency bonus for '{urgency}' must be finite and non-negative, got {value}")]
    InvalidBonus { urgency: Urgency, value: f64 },

    #[error("urgency bonus for '{higher}' is lower than for '{lower}'")]
    NonMonotonicBonus { lower: Urgency, higher: Urgency },

    #[error("proximity decay distance must be finite and positive, got {0}")]
    InvalidDecayDistance(f64),

    #[error("maximum matching distance must be finite and positive, got {0}")]
    InvalidMaxDistance(f64),
}

impl ScoringPolicy {
    /// Look up the flat bonus for an urgency tier
    pub fn urgency_bonus(&self, urgency: Urgency) -> Result<f64, PolicyError> {
        self.urgency_bonus
            .get(&urgency)
            .copied()
            .ok_or(PolicyError::MissingUrgencyBonus(urgency))
    }

    /// Reject tables that would make scores negative, non-finite, or rank a
    /// more urgent tier below a less urgent one
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.proximity_decay_km.is_finite() || self.proximity_decay_km <= 0.0 {
            return Err(PolicyError::InvalidDecayDistance(self.proximity_decay_km));
        }

        for (&urgency, &value) in &self.urgency_bonus {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidBonus { urgency, value });
            }
        }

        // BTreeMap iterates in tier order
        let tiers: Vec<(Urgency, f64)> = self.urgency_bonus.iter().map(|(u, v)| (*u, *v)).collect();
        for pair in tiers.windows(2) {
            let (lower, lower_bonus) = pair[0];
            let (higher, higher_bonus) = pair[1];
            if higher_bonus < lower_bonus {
                return Err(PolicyError::NonMonotonicBonus { lower, higher });
            }
        }

        Ok(())
    }
}

/// Proximity component: decays linearly to zero at `decay_km`, never negative
#[inline]
pub fn proximity_score(distance_km: f64, decay_km: f64) -> f64 {
    (decay_km - distance_km).max(0.0)
}

/// Score a (donor, request) pair.
///
/// score = max(0, decay_km - distance_km) + urgency_bonus[urgency]
pub fn calculate_score(
    distance_km: f64,
    urgency: Urgency,
    policy: &ScoringPolicy,
) -> Result<ScoreBreakdown, PolicyError> {
    Ok(ScoreBreakdown {
        proximity: proximity_score(distance_km, policy.proximity_decay_km),
        urgency: policy.urgency_bonus(urgency)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proximity_score() {
        assert_eq!(proximity_score(0.0, 100.0), 100.0);
        assert!((proximity_score(13.0, 100.0) - 87.0).abs() < 1e-9);
        assert_eq!(proximity_score(100.0, 100.0), 0.0);
        // Beyond the decay distance the floor is zero, not negative
        assert_eq!(proximity_score(1150.0, 100.0), 0.0);
    }

    #[test]
    fn test_calculate_score() {
        let policy = ScoringPolicy::default();
        let breakdown = calculate_score(20.0, Urgency::High, &policy).unwrap();

        assert_eq!(breakdown.proximity, 80.0);
        assert_eq!(breakdown.urgency, 50.0);
        assert_eq!(breakdown.total(), 130.0);
    }

    #[test]
    fn test_score_monotonic_in_distance() {
        let policy = ScoringPolicy::default();
        let mut previous = f64::INFINITY;
        for step in 0..300 {
            let distance = step as f64 * 0.5;
            let score = calculate_score(distance, Urgency::Normal, &policy).unwrap().total();
            assert!(score <= previous, "score rose at {} km", distance);
            assert!(score >= 0.0);
            previous = score;
        }
    }

    #[test]
    fn test_score_monotonic_in_urgency() {
        let policy = ScoringPolicy::default();
        for distance in [0.0, 42.0, 99.9, 500.0] {
            let normal = calculate_score(distance, Urgency::Normal, &policy).unwrap().total();
            let high = calculate_score(distance, Urgency::High, &policy).unwrap().total();
            let critical = calculate_score(distance, Urgency::Critical, &policy).unwrap().total();
            assert!(normal <= high && high <= critical);
        }
    }

    #[test]
    fn test_missing_bonus_is_an_error() {
        let mut policy = ScoringPolicy::default();
        policy.urgency_bonus.remove(&Urgency::Critical);

        assert_eq!(
            calculate_score(5.0, Urgency::Critical, &policy),
            Err(PolicyError::MissingUrgencyBonus(Urgency::Critical))
        );
        assert!(calculate_score(5.0, Urgency::High, &policy).is_ok());
    }

    #[test]
    fn test_policy_validation() {
        assert_eq!(ScoringPolicy::default().validate(), Ok(()));

        let mut inverted = ScoringPolicy::default();
        inverted.urgency_bonus.insert(Urgency::High, 10.0);
        assert_eq!(
            inverted.validate(),
            Err(PolicyError::NonMonotonicBonus {
                lower: Urgency::Normal,
                higher: Urgency::High
            })
        );

        let mut negative = ScoringPolicy::default();
        negative.urgency_bonus.insert(Urgency::Normal, -1.0);
        assert!(matches!(negative.validate(), Err(PolicyError::InvalidBonus { .. })));

        let zero_decay = ScoringPolicy {
            proximity_decay_km: 0.0,
            ..ScoringPolicy::default()
        };
        assert_eq!(zero_decay.validate(), Err(PolicyError::InvalidDecayDistance(0.0)));
    }
}
