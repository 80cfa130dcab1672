// Integration tests for Donor Match

use chrono::NaiveDate;
use donor_match::core::{is_compatible, MatchError, Matcher, PolicyError};
use donor_match::models::{
    AvailabilityWindow, BloodRequest, BloodType, Coordinates, Donor, MatchConstraints,
    ScoringPolicy, SkipReason, Urgency,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_test_donor(
    id: &str,
    blood_type: BloodType,
    lat: f64,
    lon: f64,
    available: NaiveDate,
) -> Donor {
    Donor {
        id: id.to_string(),
        full_name: Some(format!("Donor {}", id)),
        email: Some(format!("{}@example.org", id)),
        phone: None,
        blood_type,
        coordinates: Some(Coordinates::new(lat, lon)),
        location: None,
        availability: AvailabilityWindow::on(available),
        is_active: true,
        last_donation_date: None,
    }
}

fn create_test_request(
    id: &str,
    blood_type: BloodType,
    urgency: Urgency,
    units_needed: u32,
    required: NaiveDate,
) -> BloodRequest {
    BloodRequest {
        id: id.to_string(),
        patient_name: Some("Patient".to_string()),
        hospital_name: Some("Lilavati Hospital".to_string()),
        contact_email: None,
        contact_phone: None,
        blood_type,
        coordinates: Some(Coordinates::new(19.1, 72.9)),
        hospital_address: None,
        urgency,
        units_needed,
        required_date: required,
        required_time: None,
        is_active: true,
    }
}

/// Deterministic mixed population: every blood type, a spread of positions
/// and availability dates, some inactive donors.
fn donor_population(count: usize) -> Vec<Donor> {
    (0..count)
        .map(|i| {
            let lat = 18.6 + ((i * 37) % 100) as f64 * 0.01;
            let lon = 72.4 + ((i * 53) % 100) as f64 * 0.01;
            let available = date(2024, 3, 1) + chrono::Duration::days((i % 30) as i64);
            let mut donor = create_test_donor(&format!("d{}", i), BloodType::ALL[i % 8], lat, lon, available);
            donor.is_active = i % 7 != 3;
            donor
        })
        .collect()
}

#[test]
fn test_scenario_universal_donor_for_a_positive() {
    let matcher = Matcher::with_default_policy();
    let donor = create_test_donor("donor-1", BloodType::ONegative, 19.0, 72.8, date(2024, 3, 1));
    let request = create_test_request("req-1", BloodType::APositive, Urgency::High, 1, date(2024, 3, 20));

    let results = matcher.match_donors_for_request(&request, &[donor]).unwrap();

    assert_eq!(results.len(), 1);
    let top = &results[0];
    assert_eq!(top.donor_id, "donor-1");
    assert_eq!(top.request_id, "req-1");
    assert!(top.distance_km > 10.0 && top.distance_km < 20.0, "got {}", top.distance_km);
    assert!((top.breakdown.proximity - (100.0 - top.distance_km)).abs() < 1e-9);
    assert_eq!(top.breakdown.urgency, 50.0);
    assert!((top.score - (top.breakdown.proximity + 50.0)).abs() < 1e-9);
}

#[test]
fn test_filtering_correctness() {
    let matcher = Matcher::with_default_policy();
    let donors = donor_population(200);

    for recipient in BloodType::ALL {
        let request = create_test_request("req", recipient, Urgency::Normal, 500, date(2024, 3, 15));
        let results = matcher.match_donors_for_request(&request, &donors).unwrap();

        for result in &results {
            let donor = donors.iter().find(|d| d.id == result.donor_id).unwrap();
            assert!(donor.is_active);
            assert!(is_compatible(donor.blood_type, recipient));
            assert!(donor.availability.date <= request.required_date);
        }
    }
}

#[test]
fn test_every_candidate_is_accounted_for() {
    let matcher = Matcher::with_default_policy();
    let donors = donor_population(120);
    let request = create_test_request("req", BloodType::BPositive, Urgency::High, 3, date(2024, 3, 10));

    let report = matcher.donors_for_request(&request, &donors).unwrap();

    assert_eq!(report.total_candidates, donors.len());
    assert_eq!(report.total_eligible + report.skipped.len(), donors.len());
    for skipped in &report.skipped {
        assert!(matches!(
            skipped.reason,
            SkipReason::Inactive | SkipReason::IncompatibleBloodType | SkipReason::NotAvailableInTime
        ));
    }
}

#[test]
fn test_top_k_is_exactly_the_best_eligible() {
    let matcher = Matcher::with_default_policy();
    let donors = donor_population(150);

    for units in [1, 2, 5, 17, 1000] {
        let request = create_test_request("req", BloodType::AbPositive, Urgency::Critical, units, date(2024, 3, 20));
        let report = matcher.donors_for_request(&request, &donors).unwrap();

        assert!(report.matches.len() <= units as usize);
        assert_eq!(report.matches.len(), report.total_eligible.min(units as usize));

        // Everything eligible, untruncated
        let everything = create_test_request("req", BloodType::AbPositive, Urgency::Critical, u32::MAX, date(2024, 3, 20));
        let all = matcher.match_donors_for_request(&everything, &donors).unwrap();
        assert_eq!(all.len(), report.total_eligible);

        let kept: Vec<&str> = report.matches.iter().map(|m| m.donor_id.as_str()).collect();
        let lowest_kept = report.matches.last().map(|m| m.score).unwrap_or(f64::INFINITY);
        for candidate in all.iter().filter(|m| !kept.contains(&m.donor_id.as_str())) {
            assert!(candidate.score <= lowest_kept, "{} outscores a kept donor", candidate.donor_id);
        }
    }
}

#[test]
fn test_results_sorted_by_score() {
    let matcher = Matcher::with_default_policy();
    let donors = donor_population(80);
    let request = create_test_request("req", BloodType::AbPositive, Urgency::Normal, 80, date(2024, 3, 31));

    let results = matcher.match_donors_for_request(&request, &donors).unwrap();

    for i in 1..results.len() {
        assert!(results[i - 1].score >= results[i].score, "Matches not sorted by score");
    }
}

#[test]
fn test_determinism_including_ties() {
    let matcher = Matcher::with_default_policy();
    let mut donors = donor_population(60);
    // Several donors sharing one spot produce equal scores
    for donor in donors.iter_mut().step_by(5) {
        donor.coordinates = Some(Coordinates::new(19.05, 72.85));
    }
    let request = create_test_request("req", BloodType::AbPositive, Urgency::High, 25, date(2024, 3, 31));

    let first = matcher.match_donors_for_request(&request, &donors).unwrap();
    let second = matcher.match_donors_for_request(&request, &donors).unwrap();
    assert_eq!(first, second);

    // Tied donors keep input order
    let tied: Vec<&str> = first
        .iter()
        .filter(|m| m.score == first[0].score)
        .map(|m| m.donor_id.as_str())
        .collect();
    let input_order: Vec<&str> = donors
        .iter()
        .map(|d| d.id.as_str())
        .filter(|id| tied.contains(id))
        .collect();
    assert_eq!(tied, input_order);

    let donor = create_test_donor("anchor", BloodType::ONegative, 19.0, 72.8, date(2024, 3, 1));
    let requests: Vec<BloodRequest> = (0..20)
        .map(|i| create_test_request(&format!("r{}", i), BloodType::ALL[i % 8], Urgency::Normal, 1, date(2024, 4, 1)))
        .collect();
    let a = matcher.match_requests_for_donor(&donor, &requests, date(2024, 3, 1)).unwrap();
    let b = matcher.match_requests_for_donor(&donor, &requests, date(2024, 3, 1)).unwrap();
    assert_eq!(a, b);
    // All requests sit at the same hospital with the same urgency: input order
    let ids: Vec<String> = a.into_iter().map(|m| m.request_id).collect();
    let expected: Vec<String> = (0..20).map(|i| format!("r{}", i)).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_empty_inputs() {
    let matcher = Matcher::with_default_policy();
    let request = create_test_request("req", BloodType::APositive, Urgency::High, 2, date(2024, 3, 20));
    let donor = create_test_donor("d", BloodType::APositive, 19.0, 72.8, date(2024, 3, 1));

    assert!(matcher.match_donors_for_request(&request, &[]).unwrap().is_empty());
    assert!(matcher.match_requests_for_donor(&donor, &[], date(2024, 3, 1)).unwrap().is_empty());
    assert!(matcher.suggest_requests_for_donors(&[], &[request], date(2024, 3, 1)).unwrap().is_empty());
}

#[test]
fn test_far_donor_keeps_floor_score() {
    let matcher = Matcher::with_default_policy();
    let request = create_test_request("req", BloodType::APositive, Urgency::High, 2, date(2024, 3, 20));
    // Delhi, over 1000 km from the hospital
    let far = create_test_donor("far", BloodType::APositive, 28.6139, 77.2090, date(2024, 3, 1));

    let results = matcher.match_donors_for_request(&request, &[far]).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].breakdown.proximity, 0.0);
    assert_eq!(results[0].score, 50.0);
}

#[test]
fn test_urgency_surfaces_requests_for_donor() {
    let matcher = Matcher::with_default_policy();
    let donor = create_test_donor("d", BloodType::ONegative, 19.1, 72.9, date(2024, 3, 1));

    let mut near_normal = create_test_request("near-normal", BloodType::APositive, Urgency::Normal, 1, date(2024, 3, 20));
    near_normal.coordinates = Some(Coordinates::new(19.1, 72.9));
    let mut farther_critical = create_test_request("farther-critical", BloodType::APositive, Urgency::Critical, 1, date(2024, 3, 20));
    farther_critical.coordinates = Some(Coordinates::new(19.3, 72.9));

    let results = matcher
        .match_requests_for_donor(&donor, &[near_normal, farther_critical], date(2024, 3, 5))
        .unwrap();

    // ~22 km costs 22 proximity points but critical adds 60 more than normal
    assert_eq!(results[0].request_id, "farther-critical");
    assert_eq!(results[1].request_id, "near-normal");
}

#[test]
fn test_configuration_error_is_surfaced() {
    let policy = ScoringPolicy {
        urgency_bonus: [(Urgency::Normal, 20.0)].into_iter().collect(),
        ..ScoringPolicy::default()
    };
    let matcher = Matcher::new(policy).unwrap();
    let donor = create_test_donor("d", BloodType::ONegative, 19.0, 72.8, date(2024, 3, 1));
    let requests = vec![
        create_test_request("ok", BloodType::APositive, Urgency::Normal, 1, date(2024, 3, 20)),
        create_test_request("unconfigured", BloodType::APositive, Urgency::High, 1, date(2024, 3, 20)),
    ];

    assert_eq!(
        matcher.match_requests_for_donor(&donor, &requests, date(2024, 3, 1)),
        Err(MatchError::Policy(PolicyError::MissingUrgencyBonus(Urgency::High)))
    );
}

#[test]
fn test_invalid_constraints_rejected() {
    let result = Matcher::with_default_policy().with_constraints(MatchConstraints {
        max_distance_km: Some(f64::NAN),
        min_donation_interval_days: None,
    });

    assert!(matches!(result, Err(PolicyError::InvalidMaxDistance(_))));
}

#[test]
fn test_malformed_coordinates_excluded() {
    let matcher = Matcher::with_default_policy();
    let request = create_test_request("req", BloodType::APositive, Urgency::High, 5, date(2024, 3, 20));

    let mut nan = create_test_donor("nan", BloodType::APositive, 19.0, 72.8, date(2024, 3, 1));
    nan.coordinates = Some(Coordinates::new(f64::NAN, 72.8));
    let fine = create_test_donor("fine", BloodType::APositive, 19.0, 72.8, date(2024, 3, 1));

    let report = matcher.donors_for_request(&request, &[nan, fine]).unwrap();

    assert_eq!(report.matches.len(), 1);
    assert!(report.matches[0].score.is_finite());
    assert_eq!(report.skipped[0].reason, SkipReason::InvalidCoordinates);
}
