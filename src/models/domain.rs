use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size class of a pet, ordered small < medium < large
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// Position on the ordinal size scale
    pub fn ordinal(self) -> i32 {
        match self {
            SizeClass::Small => 0,
            SizeClass::Medium => 1,
            SizeClass::Large => 2,
        }
    }

    /// Map free-form input onto a size class, falling back to medium
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "small" | "toy" | "mini" => SizeClass::Small,
            "large" | "giant" => SizeClass::Large,
            _ => SizeClass::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }
}

/// Age group as inferred from a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Puppy,
    Adult,
    Senior,
}

impl AgeGroup {
    /// Map free-form input onto an age group, falling back to adult
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "puppy" | "young" => AgeGroup::Puppy,
            "senior" | "old" => AgeGroup::Senior,
            _ => AgeGroup::Adult,
        }
    }
}

/// Preferred play style as inferred from a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayPreference {
    Chase,
    Wrestle,
    Mixed,
}

impl PlayPreference {
    /// Map free-form input onto a play preference, falling back to mixed
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "chase" | "chasing" => PlayPreference::Chase,
            "wrestle" | "wrestling" => PlayPreference::Wrestle,
            _ => PlayPreference::Mixed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayPreference::Chase => "chase",
            PlayPreference::Wrestle => "wrestle",
            PlayPreference::Mixed => "mixed",
        }
    }
}

/// Pet profile used for compatibility scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetProfile {
    #[serde(rename = "petId")]
    pub pet_id: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub name: String,
    pub size: SizeClass,
    #[serde(rename = "ageMonths")]
    pub age_months: u16,
    pub vaccinated: bool,
    pub neutered: bool,
    pub sociability: f64,
    pub playfulness: f64,
    #[serde(rename = "emotionalStability")]
    pub emotional_stability: f64,
    #[serde(rename = "activityLevel")]
    pub activity_level: f64,
    #[serde(rename = "aiTags", default)]
    pub ai_tags: Option<PhotoAnalysis>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDecision {
    Like,
    Pass,
}

impl SwipeDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            SwipeDecision::Like => "like",
            SwipeDecision::Pass => "pass",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "like" => Some(SwipeDecision::Like),
            "pass" => Some(SwipeDecision::Pass),
            _ => None,
        }
    }
}

/// Append-only swipe log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeAction {
    #[serde(rename = "actorPetId")]
    pub actor_pet_id: String,
    #[serde(rename = "actorOwnerId")]
    pub actor_owner_id: String,
    #[serde(rename = "targetPetId")]
    pub target_pet_id: String,
    pub decision: SwipeDecision,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Unordered pet pair, stored as (low, high)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PetPair {
    low: String,
    high: String,
}

impl PetPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self { low: a.to_string(), high: b.to_string() }
        } else {
            Self { low: b.to_string(), high: a.to_string() }
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }

    pub fn contains(&self, pet_id: &str) -> bool {
        self.low == pet_id || self.high == pet_id
    }
}

/// Mutual match between two pets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "matchId")]
    pub match_id: String,
    #[serde(rename = "pet1Id")]
    pub pet1_id: String,
    #[serde(rename = "pet2Id")]
    pub pet2_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// The pet on the other side of the match
    pub fn other_pet(&self, pet_id: &str) -> &str {
        if self.pet1_id == pet_id {
            &self.pet2_id
        } else {
            &self.pet1_id
        }
    }
}

/// Ranked candidate with its compatibility score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPet {
    #[serde(flatten)]
    pub pet: PetProfile,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
}

/// WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Errors raised while building an image reference
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageSourceError {
    #[error("Provide exactly one of image_base64 or image_path.")]
    Ambiguous,

    #[error("Invalid base64 image payload.")]
    InvalidBase64,
}

/// Where the bytes of an image come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Path(String),
    Inline(Vec<u8>),
}

impl ImageRef {
    /// Build a reference from the two optional request fields.
    ///
    /// Empty strings count as absent. A `data:<mime>;base64,` prefix and
    /// embedded whitespace are accepted on inline payloads.
    pub fn from_sources(
        image_path: Option<&str>,
        image_base64: Option<&str>,
    ) -> Result<Self, ImageSourceError> {
        let path = image_path.filter(|p| !p.trim().is_empty());
        let inline = image_base64.filter(|b| !b.trim().is_empty());

        match (path, inline) {
            (Some(path), None) => Ok(ImageRef::Path(path.to_string())),
            (None, Some(payload)) => decode_base64_payload(payload).map(ImageRef::Inline),
            _ => Err(ImageSourceError::Ambiguous),
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            ImageRef::Path(path) => Some(path),
            ImageRef::Inline(_) => None,
        }
    }

    /// Inline bytes re-encoded as standard base64
    pub fn to_base64(&self) -> Option<String> {
        match self {
            ImageRef::Path(_) => None,
            ImageRef::Inline(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
        }
    }
}

/// Decode a base64 image payload, tolerating data URLs and whitespace
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, ImageSourceError> {
    let trimmed = payload.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(trimmed),
        None => trimmed,
    };
    let cleaned: String = body.chars().filter(|c| !c.is_whitespace()).collect();

    base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| ImageSourceError::InvalidBase64)
}

/// Lost-dog notice submitted by an owner
#[derive(Debug, Clone)]
pub struct LostDogNotice {
    pub image: ImageRef,
    pub lost_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

/// Stray-dog sighting report, upsertable by report id
#[derive(Debug, Clone)]
pub struct StrayDogReport {
    pub report_id: String,
    pub image: ImageRef,
    pub reported_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

/// Owner notification emitted after a positive reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchNotification {
    pub id: i64,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "matchedReportIds")]
    pub matched_report_ids: Vec<String>,
    #[serde(rename = "similarityScore")]
    pub similarity_score: f64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Gates applied during lost/stray reconciliation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileThresholds {
    pub similarity_threshold: f64,
    pub max_distance_km: f64,
    pub max_time_gap_hours: i64,
}

impl Default for ReconcileThresholds {
    fn default() -> Self {
        Self {
            similarity_threshold: 70.0,
            max_distance_km: 5.0,
            max_time_gap_hours: 72,
        }
    }
}

/// Aggregated result of a reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    #[serde(rename = "isMatch")]
    pub is_match: bool,
    #[serde(rename = "similarityScore")]
    pub similarity_score: f64,
    #[serde(rename = "matchedReportIds")]
    pub matched_report_ids: Vec<String>,
}

impl ReconcileOutcome {
    pub fn no_match() -> Self {
        Self {
            is_match: false,
            similarity_score: 0.0,
            matched_report_ids: Vec::new(),
        }
    }
}

/// Normalized photo tagging result, persisted as a pet's AI tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAnalysis {
    pub breed: String,
    pub size: SizeClass,
    #[serde(rename = "ageGroup")]
    pub age_group: AgeGroup,
    #[serde(rename = "appearanceTags")]
    pub appearance_tags: Vec<String>,
    #[serde(rename = "personalityGuess")]
    pub personality_guess: String,
}

/// Normalized behaviour scores derived from a video, each in [0, 10]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    #[serde(rename = "activityLevel")]
    pub activity_level: f64,
    #[serde(rename = "approachSpeed")]
    pub approach_speed: f64,
    #[serde(rename = "emotionalStability")]
    pub emotional_stability: f64,
    #[serde(rename = "playPreference")]
    pub play_preference: PlayPreference,
    #[serde(rename = "bodyLanguageScore")]
    pub body_language_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Pending,
    Found,
}

impl PostingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostingStatus::Pending => "pending",
            PostingStatus::Found => "found",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(PostingStatus::Pending),
            "found" => Some(PostingStatus::Found),
            _ => None,
        }
    }
}

/// Public lost-dog posting shown on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostDogPosting {
    pub id: String,
    pub breed: String,
    pub description: String,
    #[serde(rename = "lostAt")]
    pub lost_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub address: String,
    pub contact: String,
    #[serde(rename = "photoPath")]
    pub photo_path: Option<String>,
    pub status: PostingStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}
