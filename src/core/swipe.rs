use chrono::Utc;

use crate::core::error::CoreError;
use crate::core::scoring::calculate_compatibility;
use crate::models::{MatchSummary, PetPair, PetProfile, SwipeAction, SwipeDecision};
use crate::services::{PetStore, SwipeStore};

/// Result of recording a swipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeOutcome {
    /// True only when this swipe created a new match
    pub matched: bool,
    pub match_id: Option<String>,
}

impl SwipeOutcome {
    fn no_match() -> Self {
        Self {
            matched: false,
            match_id: None,
        }
    }
}

async fn require_pet(pets: &dyn PetStore, pet_id: &str) -> Result<PetProfile, CoreError> {
    pets.get_pet(pet_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Pet not found: {}", pet_id)))
}

/// Record a swipe and detect a mutual match
///
/// The swipe is always appended. A like creates a match when any pet of the
/// target's owner already liked the actor; the store guarantees at most one
/// record per unordered pair.
pub async fn record_swipe(
    pets: &dyn PetStore,
    swipes: &dyn SwipeStore,
    pet_id: &str,
    target_pet_id: &str,
    decision: SwipeDecision,
) -> Result<SwipeOutcome, CoreError> {
    if pet_id == target_pet_id {
        return Err(CoreError::Validation("A pet cannot swipe on itself".to_string()));
    }

    let actor = require_pet(pets, pet_id).await?;
    let target = require_pet(pets, target_pet_id).await?;

    if actor.owner_id == target.owner_id {
        return Err(CoreError::Validation(
            "Cannot swipe on a pet of the same owner".to_string(),
        ));
    }

    swipes
        .append_swipe(&SwipeAction {
            actor_pet_id: actor.pet_id.clone(),
            actor_owner_id: actor.owner_id.clone(),
            target_pet_id: target.pet_id.clone(),
            decision,
            created_at: Utc::now(),
        })
        .await?;

    if decision == SwipeDecision::Pass {
        return Ok(SwipeOutcome::no_match());
    }

    if !swipes.has_like(&target.owner_id, &actor.pet_id).await? {
        return Ok(SwipeOutcome::no_match());
    }

    match swipes
        .create_match_if_absent(&PetPair::new(&actor.pet_id, &target.pet_id))
        .await?
    {
        Some(record) => {
            tracing::info!(
                "Mutual match {} between {} and {}",
                record.match_id,
                record.pet1_id,
                record.pet2_id
            );
            Ok(SwipeOutcome {
                matched: true,
                match_id: Some(record.match_id),
            })
        }
        None => {
            tracing::debug!("Pair {}/{} already matched", actor.pet_id, target.pet_id);
            Ok(SwipeOutcome::no_match())
        }
    }
}

/// Every match of a pet, with the other pet and their compatibility score
///
/// Matches whose other pet no longer exists are skipped.
pub async fn list_matches(
    pets: &dyn PetStore,
    swipes: &dyn SwipeStore,
    pet_id: &str,
) -> Result<Vec<MatchSummary>, CoreError> {
    let pet = require_pet(pets, pet_id).await?;
    let records = swipes.list_matches(pet_id).await?;

    let mut summaries = Vec::with_capacity(records.len());
    for record in records {
        let Some(other_pet) = pets.get_pet(record.other_pet(pet_id)).await? else {
            tracing::warn!("Match {} references a missing pet", record.match_id);
            continue;
        };

        summaries.push(MatchSummary {
            match_id: record.match_id,
            score: calculate_compatibility(&pet, &other_pet),
            pet: pet.clone(),
            other_pet,
            created_at: record.created_at,
        });
    }

    Ok(summaries)
}
