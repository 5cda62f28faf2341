use crate::models::PetProfile;

/// Weight of the static-information sub-score
pub const STATIC_INFO_WEIGHT: f64 = 0.5;
/// Weight of the personality sub-score
pub const PERSONALITY_WEIGHT: f64 = 0.4;
/// Weight of the activity sub-score
pub const ACTIVITY_WEIGHT: f64 = 0.3;

/// Calculate the compatibility score (0-100) between two pets
///
/// Scoring formula:
/// score = (
///     static_score * 0.5 +         # size, age, vaccination, neutering
///     personality_score * 0.4 +    # similar temperament = higher
///     activity_score * 0.3         # similar energy = higher
/// ) / 1.2
///
/// The static sub-score is not perfectly symmetric once clamping kicks in,
/// so `score(a, b)` and `score(b, a)` may differ slightly.
pub fn calculate_compatibility(a: &PetProfile, b: &PetProfile) -> f64 {
    let static_score = calculate_static_score(a, b);
    let personality_score = calculate_personality_score(a, b);
    let activity_score = calculate_activity_score(a, b);

    let total = static_score * STATIC_INFO_WEIGHT
        + personality_score * PERSONALITY_WEIGHT
        + activity_score * ACTIVITY_WEIGHT;

    round2(total / (STATIC_INFO_WEIGHT + PERSONALITY_WEIGHT + ACTIVITY_WEIGHT))
}

/// Static-information sub-score (0-100)
pub fn calculate_static_score(a: &PetProfile, b: &PetProfile) -> f64 {
    let mut score = 100.0;

    if a.size == b.size {
        score += 20.0;
    } else {
        let steps = (a.size.ordinal() - b.size.ordinal()).abs();
        score -= f64::from(steps) * 10.0;
    }

    let age_gap = f64::from(a.age_months.abs_diff(b.age_months));
    if age_gap <= 6.0 {
        score += 20.0;
    } else if age_gap <= 12.0 {
        score += 10.0;
    } else {
        score -= age_gap.min(30.0);
    }

    if a.vaccinated && b.vaccinated {
        score += 15.0;
    }

    if a.neutered && b.neutered {
        score += 15.0;
    }

    clamp_score(score)
}

/// Personality sub-score (0-100): similar temperament scores higher
pub fn calculate_personality_score(a: &PetProfile, b: &PetProfile) -> f64 {
    let avg_diff = ((a.sociability - b.sociability).abs()
        + (a.playfulness - b.playfulness).abs()
        + (a.emotional_stability - b.emotional_stability).abs())
        / 3.0;

    clamp_score(100.0 - avg_diff)
}

/// Activity sub-score (0-100): similar activity levels score higher
pub fn calculate_activity_score(a: &PetProfile, b: &PetProfile) -> f64 {
    clamp_score(100.0 - (a.activity_level - b.activity_level).abs())
}

#[inline]
fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Round to two decimal places
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SizeClass;

    fn create_test_pet(size: SizeClass, age_months: u16) -> PetProfile {
        PetProfile {
            pet_id: "pet".to_string(),
            owner_id: "owner".to_string(),
            name: "Test Pet".to_string(),
            size,
            age_months,
            vaccinated: true,
            neutered: true,
            sociability: 60.0,
            playfulness: 70.0,
            emotional_stability: 80.0,
            activity_level: 50.0,
            ai_tags: None,
            created_at: None,
        }
    }

    #[test]
    fn test_size_distance_penalty_is_clamped_away() {
        let small = create_test_pet(SizeClass::Small, 24);
        let large = create_test_pet(SizeClass::Large, 24);

        // 100 - 20 + 20 + 15 + 15 = 130, clamped to 100
        assert_eq!(calculate_static_score(&small, &large), 100.0);
        assert_eq!(calculate_compatibility(&small, &large), 100.0);
    }

    #[test]
    fn test_static_score_age_brackets() {
        let mut a = create_test_pet(SizeClass::Small, 10);
        let mut b = create_test_pet(SizeClass::Large, 20);
        a.vaccinated = false;
        a.neutered = false;

        // 100 - 20 + 10 (gap 10)
        assert_eq!(calculate_static_score(&a, &b), 90.0);

        b.age_months = 50;
        // 100 - 20 - 30 (gap 40 capped at 30)
        assert_eq!(calculate_static_score(&a, &b), 50.0);

        b.age_months = 28;
        // 100 - 20 - 18
        assert_eq!(calculate_static_score(&a, &b), 62.0);
    }

    #[test]
    fn test_personality_score() {
        let a = create_test_pet(SizeClass::Medium, 12);
        let mut b = a.clone();
        assert_eq!(calculate_personality_score(&a, &b), 100.0);

        b.sociability = 90.0; // diff 30
        b.playfulness = 40.0; // diff 30
        b.emotional_stability = 50.0; // diff 30
        assert_eq!(calculate_personality_score(&a, &b), 70.0);
    }

    #[test]
    fn test_activity_score() {
        let a = create_test_pet(SizeClass::Medium, 12);
        let mut b = a.clone();
        b.activity_level = 0.0;
        assert_eq!(calculate_activity_score(&a, &b), 50.0);
    }

    #[test]
    fn test_weighted_mean() {
        let mut a = create_test_pet(SizeClass::Medium, 12);
        let mut b = a.clone();
        a.vaccinated = false;
        a.neutered = false;
        b.activity_level = 0.0;

        // static 100 (140 clamped), personality 100, activity 50
        // (50 + 40 + 15) / 1.2 = 87.5
        assert_eq!(calculate_compatibility(&a, &b), 87.5);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        let a = create_test_pet(SizeClass::Medium, 12);
        let mut b = a.clone();
        b.sociability = 61.0;

        // personality 100 - 1/3, total (50 + 39.8667 + 30) / 1.2
        assert_eq!(calculate_compatibility(&a, &b), 99.89);
    }
}
