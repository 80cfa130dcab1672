// Core algorithm exports
pub mod compatibility;
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use compatibility::{is_compatible, is_compatible_label, recipients_of};
pub use distance::{calculate_bounding_box, distance_km, haversine_distance, is_within_bounding_box};
pub use filters::{check_donor_for_request, check_request_for_donor};
pub use matcher::{MatchError, MatchReport, Matcher};
pub use scoring::{calculate_score, proximity_score, PolicyError};
