use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    LostDogPosting, MatchNotification, MatchRecord, PetPair, PetProfile, PhotoAnalysis,
    PostingStatus, StrayDogReport, SwipeAction, SwipeDecision, VideoAnalysis,
};
use crate::services::store::{
    LostPostingStore, NotificationSink, PetStore, StoreError, StrayReportStore, SwipeStore,
};

#[derive(Default)]
struct MemoryState {
    pets: Vec<PetProfile>,
    dynamic_info: Vec<(String, String, VideoAnalysis)>,
    swipes: Vec<SwipeAction>,
    matches: HashMap<PetPair, MatchRecord>,
    match_order: Vec<PetPair>,
    // (report, update sequence)
    reports: HashMap<String, (StrayDogReport, u64)>,
    report_seq: u64,
    notifications: Vec<MatchNotification>,
    postings: Vec<LostDogPosting>,
}

/// Process-local store backing every persistence port
///
/// One lock guards the whole state, so check-then-insert sequences such as
/// `create_match_if_absent` are atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dynamic info rows recorded for a pet, oldest first
    pub async fn dynamic_info(&self, pet_id: &str) -> Vec<VideoAnalysis> {
        let state = self.state.lock().await;
        state
            .dynamic_info
            .iter()
            .filter(|(id, _, _)| id == pet_id)
            .map(|(_, _, analysis)| analysis.clone())
            .collect()
    }

    pub async fn swipe_count(&self) -> usize {
        self.state.lock().await.swipes.len()
    }
}

#[async_trait]
impl PetStore for MemoryStore {
    async fn get_pet(&self, pet_id: &str) -> Result<Option<PetProfile>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.pets.iter().find(|p| p.pet_id == pet_id).cloned())
    }

    async fn create_pet(&self, pet: &PetProfile) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.pets.iter().any(|p| p.pet_id == pet.pet_id) {
            return Err(StoreError::Conflict(format!("pet {} already exists", pet.pet_id)));
        }
        state.pets.push(pet.clone());
        Ok(())
    }

    async fn list_candidates(
        &self,
        exclude_ids: &[String],
        exclude_owner: &str,
    ) -> Result<Vec<PetProfile>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .pets
            .iter()
            .filter(|p| p.owner_id != exclude_owner && !exclude_ids.contains(&p.pet_id))
            .cloned()
            .collect())
    }

    async fn update_ai_tags(&self, pet_id: &str, tags: &PhotoAnalysis) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let pet = state
            .pets
            .iter_mut()
            .find(|p| p.pet_id == pet_id)
            .ok_or_else(|| StoreError::NotFound(format!("pet {}", pet_id)))?;
        pet.ai_tags = Some(tags.clone());
        Ok(())
    }

    async fn append_dynamic_info(
        &self,
        pet_id: &str,
        video_path: &str,
        analysis: &VideoAnalysis,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .dynamic_info
            .push((pet_id.to_string(), video_path.to_string(), analysis.clone()));
        Ok(())
    }
}

#[async_trait]
impl SwipeStore for MemoryStore {
    async fn append_swipe(&self, swipe: &SwipeAction) -> Result<(), StoreError> {
        self.state.lock().await.swipes.push(swipe.clone());
        Ok(())
    }

    async fn has_like(
        &self,
        actor_owner_id: &str,
        target_pet_id: &str,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state.swipes.iter().any(|s| {
            s.actor_owner_id == actor_owner_id
                && s.target_pet_id == target_pet_id
                && s.decision == SwipeDecision::Like
        }))
    }

    async fn swiped_target_ids(&self, actor_pet_id: &str) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock().await;
        let mut ids: Vec<String> = Vec::new();
        for swipe in state.swipes.iter().filter(|s| s.actor_pet_id == actor_pet_id) {
            if !ids.contains(&swipe.target_pet_id) {
                ids.push(swipe.target_pet_id.clone());
            }
        }
        Ok(ids)
    }

    async fn create_match_if_absent(
        &self,
        pair: &PetPair,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let mut state = self.state.lock().await;
        if state.matches.contains_key(pair) {
            return Ok(None);
        }

        let record = MatchRecord {
            match_id: Uuid::new_v4().to_string(),
            pet1_id: pair.low().to_string(),
            pet2_id: pair.high().to_string(),
            created_at: Utc::now(),
        };
        state.matches.insert(pair.clone(), record.clone());
        state.match_order.push(pair.clone());
        Ok(Some(record))
    }

    async fn list_matches(&self, pet_id: &str) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .match_order
            .iter()
            .rev()
            .filter(|pair| pair.contains(pet_id))
            .filter_map(|pair| state.matches.get(pair).cloned())
            .collect())
    }
}

#[async_trait]
impl StrayReportStore for MemoryStore {
    async fn upsert_report(&self, report: &StrayDogReport) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.report_seq += 1;
        let seq = state.report_seq;
        state
            .reports
            .insert(report.report_id.clone(), (report.clone(), seq));
        Ok(())
    }

    async fn list_reports(&self) -> Result<Vec<StrayDogReport>, StoreError> {
        let state = self.state.lock().await;
        let mut reports: Vec<&(StrayDogReport, u64)> = state.reports.values().collect();
        reports.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(reports.into_iter().map(|(r, _)| r.clone()).collect())
    }
}

#[async_trait]
impl NotificationSink for MemoryStore {
    async fn notify_possible_match(
        &self,
        owner_id: &str,
        matched_report_ids: &[String],
        similarity_score: f64,
    ) -> Result<MatchNotification, StoreError> {
        let mut state = self.state.lock().await;
        let notification = MatchNotification {
            id: state.notifications.len() as i64 + 1,
            owner_id: owner_id.to_string(),
            matched_report_ids: matched_report_ids.to_vec(),
            similarity_score,
            created_at: Utc::now(),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<MatchNotification>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| owner_id.map_or(true, |owner| n.owner_id == owner))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LostPostingStore for MemoryStore {
    async fn create_posting(&self, posting: &LostDogPosting) -> Result<(), StoreError> {
        self.state.lock().await.postings.push(posting.clone());
        Ok(())
    }

    async fn list_postings(&self) -> Result<Vec<LostDogPosting>, StoreError> {
        let state = self.state.lock().await;
        let mut postings = state.postings.clone();
        // Stable sort keeps insertion order reversed for equal timestamps
        postings.reverse();
        postings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(postings)
    }

    async fn update_status(
        &self,
        posting_id: &str,
        status: PostingStatus,
    ) -> Result<Option<LostDogPosting>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state
            .postings
            .iter_mut()
            .find(|p| p.id == posting_id)
            .map(|posting| {
                posting.status = status;
                posting.clone()
            }))
    }
}
