use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    LostDogPosting, MatchNotification, MatchRecord, PetPair, PetProfile, PhotoAnalysis,
    PostingStatus, StrayDogReport, SwipeAction, VideoAnalysis,
};

/// Errors that can occur when interacting with a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[async_trait]
pub trait PetStore: Send + Sync {
    async fn get_pet(&self, pet_id: &str) -> Result<Option<PetProfile>, StoreError>;

    async fn create_pet(&self, pet: &PetProfile) -> Result<(), StoreError>;

    /// All pets except the given ids and the given owner's pets
    async fn list_candidates(
        &self,
        exclude_ids: &[String],
        exclude_owner: &str,
    ) -> Result<Vec<PetProfile>, StoreError>;

    async fn update_ai_tags(&self, pet_id: &str, tags: &PhotoAnalysis) -> Result<(), StoreError>;

    async fn append_dynamic_info(
        &self,
        pet_id: &str,
        video_path: &str,
        analysis: &VideoAnalysis,
    ) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[async_trait]
pub trait SwipeStore: Send + Sync {
    async fn append_swipe(&self, swipe: &SwipeAction) -> Result<(), StoreError>;

    /// Whether any pet of `actor_owner_id` liked `target_pet_id`
    async fn has_like(&self, actor_owner_id: &str, target_pet_id: &str)
        -> Result<bool, StoreError>;

    async fn swiped_target_ids(&self, actor_pet_id: &str) -> Result<Vec<String>, StoreError>;

    /// Insert a match for the pair unless one exists.
    ///
    /// Returns the new record, or `None` when the pair was already matched.
    /// Concurrent calls for the same pair create at most one record.
    async fn create_match_if_absent(
        &self,
        pair: &PetPair,
    ) -> Result<Option<MatchRecord>, StoreError>;

    async fn list_matches(&self, pet_id: &str) -> Result<Vec<MatchRecord>, StoreError>;
}

#[async_trait]
pub trait StrayReportStore: Send + Sync {
    async fn upsert_report(&self, report: &StrayDogReport) -> Result<(), StoreError>;

    /// Most recently updated first
    async fn list_reports(&self) -> Result<Vec<StrayDogReport>, StoreError>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_possible_match(
        &self,
        owner_id: &str,
        matched_report_ids: &[String],
        similarity_score: f64,
    ) -> Result<MatchNotification, StoreError>;

    /// Newest first, optionally for one owner
    async fn list_notifications(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<MatchNotification>, StoreError>;
}

#[async_trait]
pub trait LostPostingStore: Send + Sync {
    async fn create_posting(&self, posting: &LostDogPosting) -> Result<(), StoreError>;

    /// Newest first
    async fn list_postings(&self) -> Result<Vec<LostDogPosting>, StoreError>;

    async fn update_status(
        &self,
        posting_id: &str,
        status: PostingStatus,
    ) -> Result<Option<LostDogPosting>, StoreError>;
}

/// Handles to every persistence port, usually backed by one adapter
#[derive(Clone)]
pub struct Stores {
    pub pets: Arc<dyn PetStore>,
    pub swipes: Arc<dyn SwipeStore>,
    pub strays: Arc<dyn StrayReportStore>,
    pub notifications: Arc<dyn NotificationSink>,
    pub lost: Arc<dyn LostPostingStore>,
    pub backend: &'static str,
}

impl Stores {
    pub fn from_backend<T>(store: Arc<T>, backend: &'static str) -> Self
    where
        T: PetStore + SwipeStore + StrayReportStore + NotificationSink + LostPostingStore + 'static,
    {
        Self {
            pets: store.clone(),
            swipes: store.clone(),
            strays: store.clone(),
            notifications: store.clone(),
            lost: store,
            backend,
        }
    }
}
