use chrono::{Duration, NaiveDate};

use crate::core::compatibility::is_compatible;
use crate::models::{BloodRequest, Donor, MatchConstraints, SkipReason};

/// Stages (a)-(c) for ranking donors against one request: activity,
/// blood-type compatibility, then dates.
///
/// Runs before any distance work so ineligible pairs stay cheap.
#[inline]
pub fn check_donor_for_request(
    donor: &Donor,
    request: &BloodRequest,
    constraints: &MatchConstraints,
) -> Result<(), SkipReason> {
    if !donor.is_active {
        return Err(SkipReason::Inactive);
    }

    if !is_compatible(donor.blood_type, request.blood_type) {
        return Err(SkipReason::IncompatibleBloodType);
    }

    check_dates(donor, request, constraints)
}

/// Stages (a)-(c) for ranking requests for one donor. A request whose
/// required date is before `as_of` has expired.
#[inline]
pub fn check_request_for_donor(
    request: &BloodRequest,
    donor: &Donor,
    as_of: NaiveDate,
    constraints: &MatchConstraints,
) -> Result<(), SkipReason> {
    if !request.is_active {
        return Err(SkipReason::Inactive);
    }

    if !is_compatible(donor.blood_type, request.blood_type) {
        return Err(SkipReason::IncompatibleBloodType);
    }

    if request.required_date < as_of {
        return Err(SkipReason::RequestExpired);
    }

    check_dates(donor, request, constraints)
}

fn check_dates(
    donor: &Donor,
    request: &BloodRequest,
    constraints: &MatchConstraints,
) -> Result<(), SkipReason> {
    if donor.availability.date > request.required_date {
        return Err(SkipReason::NotAvailableInTime);
    }

    if let (Some(interval), Some(last)) = (
        constraints.min_donation_interval_days,
        donor.last_donation_date,
    ) {
        let eligible_from = last.checked_add_signed(Duration::days(i64::from(interval)));
        if eligible_from.map_or(true, |from| from > request.required_date) {
            return Err(SkipReason::RecentDonation);
        }
    }

    Ok(())
}
