//! PawMatch - Pet matching and lost-dog reconciliation service
//!
//! This library provides the two engines behind the PawMatch platform:
//! compatibility ranking with mutual-match detection for pet play dates, and
//! reconciliation of lost-dog notices against stray sightings using a
//! spatiotemporal pre-filter and a vision oracle.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{calculate_compatibility, CoreError, DogMatcher, Matcher};
pub use crate::models::{
    LostDogNotice, PetProfile, ReconcileOutcome, ReconcileThresholds, ScoredPet, StrayDogReport,
};
