use serde::{Deserialize, Serialize};
use crate::models::domain::{
    GeoPoint, PetProfile, ReconcileOutcome, ScoredPet, StrayDogReport,
};

/// Response for the candidate ranking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindCandidatesResponse {
    pub matches: Vec<ScoredPet>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Response for a recorded swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(rename = "matchId")]
    pub match_id: Option<String>,
    pub message: String,
}

/// One entry of a pet's match list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "matchId")]
    pub match_id: String,
    pub pet: PetProfile,
    #[serde(rename = "otherPet")]
    pub other_pet: PetProfile,
    pub score: f64,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Reconciliation result plus the size of the candidate set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchLostDogResponse {
    #[serde(flatten)]
    pub outcome: ReconcileOutcome,
    #[serde(rename = "candidateCount")]
    pub candidate_count: usize,
}

/// Stray report as listed back to clients; inline bytes are not echoed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrayReportView {
    #[serde(rename = "reportId")]
    pub report_id: String,
    #[serde(rename = "imagePath")]
    pub image_path: Option<String>,
    #[serde(rename = "hasImageBase64")]
    pub has_image_base64: bool,
    #[serde(rename = "reportedAt")]
    pub reported_at: Option<chrono::DateTime<chrono::Utc>>,
    pub location: Option<GeoPoint>,
}

impl From<&StrayDogReport> for StrayReportView {
    fn from(report: &StrayDogReport) -> Self {
        Self {
            report_id: report.report_id.clone(),
            image_path: report.image.path().map(str::to_string),
            has_image_base64: report.image.path().is_none(),
            reported_at: report.reported_at,
            location: report.location,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
