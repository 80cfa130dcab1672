//! Donor Match - blood donor to blood request matching service
//!
//! The core of this library is a pure ranking engine: blood-type
//! compatibility, haversine distance, additive proximity + urgency scoring,
//! and a filter → score → rank pipeline that runs in both directions
//! (donors for a request, requests for a donor). Record intake, address
//! resolution and the HTTP surface are layered around it.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{distance::{distance_km, haversine_distance}, is_compatible, MatchError, MatchReport, Matcher};
pub use models::{BloodRequest, BloodType, Coordinates, Donor, MatchResult, ScoringPolicy, SkipReason, Urgency};
