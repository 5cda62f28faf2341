use crate::core::{filters::is_candidate_eligible, scoring::calculate_compatibility};
use crate::models::{PetProfile, ScoredPet};

/// Result of ranking a candidate pool
#[derive(Debug)]
pub struct RankResult {
    pub matches: Vec<ScoredPet>,
    pub total_candidates: usize,
}

/// Candidate ranking for the swipe deck
///
/// # Pipeline Stages
/// 1. Candidate pool filtering (self, same owner, already swiped)
/// 2. Pairwise compatibility scoring
/// 3. Stable sort by score and truncation
#[derive(Debug, Clone)]
pub struct Matcher {
    max_limit: usize,
}

impl Matcher {
    pub fn new(max_limit: usize) -> Self {
        Self {
            max_limit: max_limit.max(1),
        }
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Rank candidates for a focal pet
    ///
    /// # Arguments
    /// * `focal` - The pet the deck is built for
    /// * `candidates` - Potential candidates from the store
    /// * `excluded_ids` - Pets the focal pet already swiped on
    /// * `limit` - Maximum number of matches to return (capped at `max_limit`)
    ///
    /// Equal scores keep their input order.
    pub fn rank(
        &self,
        focal: &PetProfile,
        candidates: Vec<PetProfile>,
        excluded_ids: &[String],
        limit: usize,
    ) -> RankResult {
        let total_candidates = candidates.len();
        let limit = limit.clamp(1, self.max_limit);

        let mut scored: Vec<ScoredPet> = candidates
            .into_iter()
            .filter(|candidate| is_candidate_eligible(focal, candidate, excluded_ids))
            .map(|candidate| {
                let match_score = calculate_compatibility(focal, &candidate);
                ScoredPet {
                    pet: candidate,
                    match_score,
                }
            })
            .collect();

        // sort_by is stable, so ties keep the store's order
        scored.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        RankResult {
            matches: scored,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SizeClass;

    fn create_candidate(id: &str, owner: &str, activity_level: f64) -> PetProfile {
        PetProfile {
            pet_id: id.to_string(),
            owner_id: owner.to_string(),
            name: format!("Pet {}", id),
            size: SizeClass::Medium,
            age_months: 24,
            vaccinated: true,
            neutered: true,
            sociability: 50.0,
            playfulness: 50.0,
            emotional_stability: 50.0,
            activity_level,
            ai_tags: None,
            created_at: None,
        }
    }

    #[test]
    fn test_rank_excludes_self_owner_and_swiped() {
        let matcher = Matcher::default();
        let focal = create_candidate("focal", "me", 50.0);
        let candidates = vec![
            focal.clone(),
            create_candidate("mine", "me", 50.0),
            create_candidate("swiped", "other", 50.0),
            create_candidate("fresh", "other", 50.0),
        ];

        let result = matcher.rank(&focal, candidates, &["swiped".to_string()], 10);

        assert_eq!(result.total_candidates, 4);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].pet.pet_id, "fresh");
    }

    #[test]
    fn test_rank_sorted_descending() {
        let matcher = Matcher::default();
        let focal = create_candidate("focal", "me", 50.0);
        let candidates = vec![
            create_candidate("far", "o1", 0.0),
            create_candidate("close", "o2", 50.0),
            create_candidate("mid", "o3", 30.0),
        ];

        let result = matcher.rank(&focal, candidates, &[], 10);
        let ids: Vec<&str> = result.matches.iter().map(|m| m.pet.pet_id.as_str()).collect();

        assert_eq!(ids, vec!["close", "mid", "far"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let matcher = Matcher::default();
        let focal = create_candidate("focal", "me", 50.0);
        let candidates = vec![
            create_candidate("b", "o1", 40.0),
            create_candidate("a", "o2", 60.0),
            create_candidate("c", "o3", 40.0),
        ];

        let result = matcher.rank(&focal, candidates, &[], 10);
        let ids: Vec<&str> = result.matches.iter().map(|m| m.pet.pet_id.as_str()).collect();

        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_respects_limit_and_cap() {
        let matcher = Matcher::new(3);
        let focal = create_candidate("focal", "me", 50.0);
        let candidates: Vec<PetProfile> = (0..20)
            .map(|i| create_candidate(&i.to_string(), "other", i as f64))
            .collect();

        assert_eq!(matcher.rank(&focal, candidates.clone(), &[], 2).matches.len(), 2);
        assert_eq!(matcher.rank(&focal, candidates, &[], 100).matches.len(), 3);
    }
}
