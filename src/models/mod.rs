// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AgeGroup, BoundingBox, GeoPoint, ImageRef, ImageSourceError, LostDogNotice, LostDogPosting,
    MatchNotification, MatchRecord, PetPair, PetProfile, PhotoAnalysis, PlayPreference,
    PostingStatus, ReconcileOutcome, ReconcileThresholds, ScoredPet, SizeClass, StrayDogReport,
    SwipeAction, SwipeDecision, VideoAnalysis,
};
pub use requests::{
    AnalyzePhotoRequest, AnalyzeVideoRequest, CreateLostPostingRequest, CreatePetRequest,
    FindCandidatesQuery, LocationInput, MapQuery, MatchLostDogRequest, NotificationsQuery, PetQuery,
    StrayReportRequest, SwipeRequest, UpdateStatusQuery,
};
pub use responses::{
    ErrorResponse, FindCandidatesResponse, HealthResponse, MatchLostDogResponse, MatchSummary,
    StrayReportView, SwipeResponse,
};
