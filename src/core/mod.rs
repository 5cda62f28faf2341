// Core algorithm exports
pub mod analysis;
pub mod distance;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod media;
pub mod normalize;
pub mod prompts;
pub mod reconcile;
pub mod scoring;
pub mod swipe;

pub use analysis::{PhotoAnalyzer, VideoAnalyzer};
pub use distance::{calculate_bounding_box, distance_between, haversine_distance, is_within_bounding_box};
pub use error::CoreError;
pub use filters::{
    filter_lost_for_map, filter_stray_for_map, is_candidate_eligible, passes_spatiotemporal_filter,
    MapWindow,
};
pub use matcher::{Matcher, RankResult};
pub use prompts::Prompts;
pub use reconcile::{merge_candidates, DogMatcher};
pub use scoring::calculate_compatibility;
pub use swipe::{list_matches, record_swipe, SwipeOutcome};
