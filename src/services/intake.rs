//! Turns raw records into matchable snapshots: validates each row once and
//! resolves missing coordinates concurrently, before the engine runs.

use futures::future::join_all;

use crate::models::{BloodRequest, Donor, DonorRecord, RequestRecord, SkipReason, Skipped};
use crate::services::geocoding::AddressResolver;

/// Records that passed intake, and the ones that did not
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared<T> {
    pub accepted: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for Prepared<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> FromIterator<Result<T, Skipped>> for Prepared<T> {
    fn from_iter<I: IntoIterator<Item = Result<T, Skipped>>>(iter: I) -> Self {
        let mut prepared = Prepared::default();
        for outcome in iter {
            match outcome {
                Ok(record) => prepared.accepted.push(record),
                Err(skipped) => prepared.skipped.push(skipped),
            }
        }
        prepared
    }
}

/// Validate donor rows and resolve the ones without stored coordinates
pub async fn prepare_donors(
    records: Vec<DonorRecord>,
    resolver: &dyn AddressResolver,
) -> Prepared<Donor> {
    join_all(records.into_iter().map(|record| prepare_donor(record, resolver)))
        .await
        .into_iter()
        .collect()
}

/// Validate request rows and resolve the ones without stored coordinates
pub async fn prepare_requests(
    records: Vec<RequestRecord>,
    resolver: &dyn AddressResolver,
) -> Prepared<BloodRequest> {
    join_all(records.into_iter().map(|record| prepare_request(record, resolver)))
        .await
        .into_iter()
        .collect()
}

pub async fn prepare_donor(
    record: DonorRecord,
    resolver: &dyn AddressResolver,
) -> Result<Donor, Skipped> {
    let id = record.display_id();
    let mut donor = record.into_donor().map_err(|reason| skip(&id, reason))?;

    // Inactive donors never match, so don't spend a lookup on them
    if donor.is_active && donor.coordinates.is_none() {
        if let Some(location) = donor.location.as_deref() {
            let resolved = resolver
                .resolve(location)
                .await
                .map_err(|e| skip(&id, SkipReason::ResolutionFailed(e.to_string())))?;
            donor.coordinates = Some(resolved.into());
        }
    }

    Ok(donor)
}

pub async fn prepare_request(
    record: RequestRecord,
    resolver: &dyn AddressResolver,
) -> Result<BloodRequest, Skipped> {
    let id = record.display_id();
    let mut request = record.into_request().map_err(|reason| skip(&id, reason))?;

    if request.is_active && request.coordinates.is_none() {
        if let Some(address) = request.hospital_address.as_deref() {
            let resolved = resolver
                .resolve(address)
                .await
                .map_err(|e| skip(&id, SkipReason::ResolutionFailed(e.to_string())))?;
            request.coordinates = Some(resolved.into());
        }
    }

    Ok(request)
}

fn skip(id: &str, reason: SkipReason) -> Skipped {
    tracing::warn!("Skipping record {}: {}", id, reason);
    Skipped::new(id, reason)
}
