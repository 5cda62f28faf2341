use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{
    GeoPoint, ImageRef, ImageSourceError, LostDogNotice, PetProfile, SizeClass, StrayDogReport,
};

/// Request to register a pet profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePetRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(alias = "age_months", rename = "ageMonths", default)]
    pub age_months: u16,
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default)]
    pub neutered: bool,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default = "default_trait_score")]
    pub sociability: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default = "default_trait_score")]
    pub playfulness: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(alias = "emotional_stability", rename = "emotionalStability", default = "default_trait_score")]
    pub emotional_stability: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(alias = "activity_level", rename = "activityLevel", default = "default_trait_score")]
    pub activity_level: f64,
}

fn default_trait_score() -> f64 {
    50.0
}

impl CreatePetRequest {
    pub fn into_profile(self, pet_id: String) -> PetProfile {
        PetProfile {
            pet_id,
            owner_id: self.owner_id,
            name: self.name,
            size: SizeClass::parse_lenient(&self.size),
            age_months: self.age_months,
            vaccinated: self.vaccinated,
            neutered: self.neutered,
            sociability: self.sociability,
            playfulness: self.playfulness,
            emotional_stability: self.emotional_stability,
            activity_level: self.activity_level,
            ai_tags: None,
            created_at: Some(Utc::now()),
        }
    }
}

/// Query for ranked swipe candidates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindCandidatesQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "pet_id", rename = "petId")]
    pub pet_id: String,
    /// Falls back to `matching.default_limit` when absent
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Query identifying a single pet
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PetQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "pet_id", rename = "petId")]
    pub pet_id: String,
}

/// Request to record a swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "pet_id", rename = "petId")]
    pub pet_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_pet_id", rename = "targetPetId")]
    pub target_pet_id: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl From<LocationInput> for GeoPoint {
    fn from(value: LocationInput) -> Self {
        GeoPoint {
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

/// Request to tag a pet photo
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyzePhotoRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "pet_id", rename = "petId")]
    pub pet_id: String,
    #[serde(alias = "image_base64", rename = "imageBase64", default)]
    pub image_base64: Option<String>,
    #[serde(alias = "image_path", rename = "imagePath", default)]
    pub image_path: Option<String>,
}

impl AnalyzePhotoRequest {
    pub fn image(&self) -> Result<ImageRef, ImageSourceError> {
        ImageRef::from_sources(self.image_path.as_deref(), self.image_base64.as_deref())
    }
}

/// Request to extract behaviour scores from a pet video
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyzeVideoRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "pet_id", rename = "petId")]
    pub pet_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "video_path", rename = "videoPath")]
    pub video_path: String,
}

/// Stray sighting, used both for upserts and inline reconciliation candidates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StrayReportRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "report_id", rename = "reportId")]
    pub report_id: String,
    #[serde(alias = "image_base64", rename = "imageBase64", default)]
    pub image_base64: Option<String>,
    #[serde(alias = "image_path", rename = "imagePath", default)]
    pub image_path: Option<String>,
    #[serde(alias = "reported_at", rename = "reportedAt", default)]
    pub reported_at: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub location: Option<LocationInput>,
}

impl StrayReportRequest {
    pub fn into_report(self) -> Result<StrayDogReport, ImageSourceError> {
        let image = ImageRef::from_sources(self.image_path.as_deref(), self.image_base64.as_deref())?;
        Ok(StrayDogReport {
            report_id: self.report_id,
            image,
            reported_at: self.reported_at,
            location: self.location.map(GeoPoint::from),
        })
    }
}

/// Request to reconcile a lost-dog notice against stray reports
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchLostDogRequest {
    #[serde(alias = "owner_id", rename = "ownerId", default)]
    pub owner_id: Option<String>,
    #[serde(alias = "notice_image_base64", rename = "noticeImageBase64", default)]
    pub notice_image_base64: Option<String>,
    #[serde(alias = "notice_image_path", rename = "noticeImagePath", default)]
    pub notice_image_path: Option<String>,
    #[serde(alias = "lost_at", rename = "lostAt", default)]
    pub lost_at: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub location: Option<LocationInput>,
    #[serde(
        alias = "use_stored_reports",
        alias = "use_db_reports",
        rename = "useStoredReports",
        default = "default_true"
    )]
    pub use_stored_reports: bool,
    #[validate(nested)]
    #[serde(alias = "candidate_reports", rename = "candidateReports", default)]
    pub candidate_reports: Vec<StrayReportRequest>,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(alias = "similarity_threshold", rename = "similarityThreshold", default)]
    pub similarity_threshold: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(alias = "max_distance_km", rename = "maxDistanceKm", default)]
    pub max_distance_km: Option<f64>,
    #[validate(range(min = 0))]
    #[serde(alias = "max_time_gap_hours", rename = "maxTimeGapHours", default)]
    pub max_time_gap_hours: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl MatchLostDogRequest {
    pub fn notice(&self) -> Result<LostDogNotice, ImageSourceError> {
        let image = ImageRef::from_sources(
            self.notice_image_path.as_deref(),
            self.notice_image_base64.as_deref(),
        )?;
        Ok(LostDogNotice {
            image,
            lost_at: self.lost_at,
            location: self.location.map(GeoPoint::from),
        })
    }
}

/// Request to publish a lost-dog posting
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLostPostingRequest {
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "lost_at", rename = "lostAt", default)]
    pub lost_at: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub location: Option<LocationInput>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact: String,
    #[serde(alias = "photo_path", rename = "photoPath", default)]
    pub photo_path: Option<String>,
}

/// Optional owner filter for the notification listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsQuery {
    #[serde(alias = "owner_id", rename = "ownerId", default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusQuery {
    pub status: String,
}

/// Map query: centre point with radius in metres, and/or the last N days
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub days: Option<i64>,
}
