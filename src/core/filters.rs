use chrono::{DateTime, Duration, Utc};

use crate::core::distance::{
    calculate_bounding_box, distance_between, is_within_bounding_box,
};
use crate::models::{
    GeoPoint, LostDogNotice, LostDogPosting, PetProfile, PostingStatus, ReconcileThresholds,
    StrayDogReport,
};

/// Check whether a pet belongs in the candidate pool of a focal pet
///
/// Excludes the focal pet itself, pets of the same owner and anything in
/// `excluded_ids` (typically the targets the focal pet already swiped on).
#[inline]
pub fn is_candidate_eligible(
    focal: &PetProfile,
    candidate: &PetProfile,
    excluded_ids: &[String],
) -> bool {
    candidate.pet_id != focal.pet_id
        && candidate.owner_id != focal.owner_id
        && !excluded_ids.contains(&candidate.pet_id)
}

/// Absolute gap between two instants in hours
#[inline]
pub fn hours_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (a - b).num_milliseconds().abs() as f64 / 3_600_000.0
}

/// Spatiotemporal gate applied before any oracle call
///
/// Each sub-filter only applies when both sides carry the data; a candidate
/// passes unless one of them rejects it.
pub fn passes_spatiotemporal_filter(
    notice: &LostDogNotice,
    report: &StrayDogReport,
    thresholds: &ReconcileThresholds,
) -> bool {
    if let (Some(lost_at), Some(reported_at)) = (notice.lost_at, report.reported_at) {
        if hours_between(reported_at, lost_at) > thresholds.max_time_gap_hours as f64 {
            return false;
        }
    }

    if let (Some(origin), Some(sighting)) = (&notice.location, &report.location) {
        if distance_between(origin, sighting) > thresholds.max_distance_km {
            return false;
        }
    }

    true
}

/// Radius / recency window for map queries
#[derive(Debug, Clone, Copy)]
pub struct MapWindow {
    /// Centre and radius in metres, only set when all three were given and radius > 0
    pub area: Option<(GeoPoint, f64)>,
    /// Earliest timestamp to keep, only set when days > 0
    pub since: Option<DateTime<Utc>>,
}

impl MapWindow {
    pub fn new(
        lat: Option<f64>,
        lng: Option<f64>,
        radius_m: Option<f64>,
        days: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        let area = match (lat, lng, radius_m) {
            (Some(latitude), Some(longitude), Some(radius)) if radius > 0.0 => {
                Some((GeoPoint { latitude, longitude }, radius))
            }
            _ => None,
        };
        // a span reaching past the representable range keeps every timestamp
        let since = days.filter(|d| *d > 0).map(|d| {
            Duration::try_days(d)
                .and_then(|span| now.checked_sub_signed(span))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });

        Self { area, since }
    }

    /// Check a point and timestamp against the window
    pub fn admits(&self, location: Option<&GeoPoint>, at: Option<DateTime<Utc>>) -> bool {
        if let Some(since) = self.since {
            match at {
                Some(at) if at >= since => {}
                _ => return false,
            }
        }

        if let Some((centre, radius_m)) = &self.area {
            let Some(point) = location else {
                return false;
            };
            let radius_km = radius_m / 1000.0;
            let bbox = calculate_bounding_box(centre.latitude, centre.longitude, radius_km);
            if !is_within_bounding_box(point.latitude, point.longitude, &bbox) {
                return false;
            }
            if distance_between(centre, point) > radius_km {
                return false;
            }
        }

        true
    }
}

/// Stray reports visible on the map for the given window
pub fn filter_stray_for_map<'a>(
    reports: &'a [StrayDogReport],
    window: &MapWindow,
) -> Vec<&'a StrayDogReport> {
    reports
        .iter()
        .filter(|r| window.admits(r.location.as_ref(), r.reported_at))
        .collect()
}

/// Lost postings visible on the map; found dogs are never shown
pub fn filter_lost_for_map<'a>(
    postings: &'a [LostDogPosting],
    window: &MapWindow,
) -> Vec<&'a LostDogPosting> {
    postings
        .iter()
        .filter(|p| p.status != PostingStatus::Found)
        .filter(|p| window.admits(p.location.as_ref(), Some(p.lost_at)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageRef, SizeClass};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn create_test_pet(pet_id: &str, owner_id: &str) -> PetProfile {
        PetProfile {
            pet_id: pet_id.to_string(),
            owner_id: owner_id.to_string(),
            name: "Test".to_string(),
            size: SizeClass::Medium,
            age_months: 12,
            vaccinated: true,
            neutered: true,
            sociability: 50.0,
            playfulness: 50.0,
            emotional_stability: 50.0,
            activity_level: 50.0,
            ai_tags: None,
            created_at: None,
        }
    }

    fn notice(lost_at: Option<DateTime<Utc>>, location: Option<GeoPoint>) -> LostDogNotice {
        LostDogNotice {
            image: ImageRef::Inline(vec![1, 2, 3]),
            lost_at,
            location,
        }
    }

    fn report(reported_at: Option<DateTime<Utc>>, location: Option<GeoPoint>) -> StrayDogReport {
        StrayDogReport {
            report_id: "r".to_string(),
            image: ImageRef::Inline(vec![4, 5, 6]),
            reported_at,
            location,
        }
    }

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude }
    }

    #[test]
    fn test_candidate_eligibility() {
        let focal = create_test_pet("p1", "o1");
        let excluded = vec!["p3".to_string()];

        assert!(!is_candidate_eligible(&focal, &focal, &excluded));
        assert!(!is_candidate_eligible(&focal, &create_test_pet("p2", "o1"), &excluded));
        assert!(!is_candidate_eligible(&focal, &create_test_pet("p3", "o2"), &excluded));
        assert!(is_candidate_eligible(&focal, &create_test_pet("p4", "o2"), &excluded));
    }

    #[test]
    fn test_time_gap_rejects_beyond_threshold() {
        let thresholds = ReconcileThresholds::default();
        let n = notice(Some(t0()), None);

        assert!(passes_spatiotemporal_filter(&n, &report(Some(t0() + Duration::hours(72)), None), &thresholds));
        assert!(!passes_spatiotemporal_filter(&n, &report(Some(t0() + Duration::hours(73)), None), &thresholds));
        // Reports before the loss count by absolute gap
        assert!(!passes_spatiotemporal_filter(&n, &report(Some(t0() - Duration::hours(80)), None), &thresholds));
    }

    #[test]
    fn test_missing_data_skips_sub_filters() {
        let thresholds = ReconcileThresholds::default();
        let n = notice(None, None);
        let far = report(Some(t0() + Duration::days(30)), Some(point(50.0, 50.0)));

        assert!(passes_spatiotemporal_filter(&n, &far, &thresholds));
    }

    #[test]
    fn test_distance_rejects_far_reports() {
        let thresholds = ReconcileThresholds::default();
        let n = notice(None, Some(point(1.0, 1.0)));

        assert!(passes_spatiotemporal_filter(&n, &report(None, Some(point(1.001, 1.001))), &thresholds));
        assert!(!passes_spatiotemporal_filter(&n, &report(None, Some(point(10.0, 10.0))), &thresholds));
    }

    #[test]
    fn test_map_window_radius_requires_all_parts() {
        let window = MapWindow::new(Some(1.0), Some(1.0), None, None, t0());
        assert!(window.area.is_none());
        assert!(window.admits(None, None));

        let window = MapWindow::new(Some(1.0), Some(1.0), Some(0.0), Some(0), t0());
        assert!(window.area.is_none());
        assert!(window.since.is_none());
    }

    #[test]
    fn test_map_window_radius_in_metres() {
        let window = MapWindow::new(Some(1.0), Some(1.0), Some(500.0), None, t0());

        // ~157 m away
        assert!(window.admits(Some(&point(1.001, 1.001)), None));
        // ~1.1 km away
        assert!(!window.admits(Some(&point(1.01, 1.0)), None));
        // No coordinates while radius filtering is active
        assert!(!window.admits(None, None));
    }

    #[test]
    fn test_map_window_days() {
        let window = MapWindow::new(None, None, None, Some(3), t0());

        assert!(window.admits(None, Some(t0() - Duration::days(2))));
        assert!(!window.admits(None, Some(t0() - Duration::days(4))));
        assert!(!window.admits(None, None));
    }

    #[test]
    fn test_map_window_huge_days_has_no_lower_bound() {
        for days in [i64::MAX, i64::MAX / 1000, 10_000_000_000] {
            let window = MapWindow::new(None, None, None, Some(days), t0());

            assert_eq!(window.since, Some(DateTime::<Utc>::MIN_UTC));
            assert!(window.admits(None, Some(t0() - Duration::days(365 * 500))));
            assert!(!window.admits(None, None));
        }
    }

    #[test]
    fn test_found_postings_hidden_from_map() {
        let posting = |id: &str, status| LostDogPosting {
            id: id.to_string(),
            breed: "beagle".to_string(),
            description: String::new(),
            lost_at: t0(),
            location: Some(point(1.0, 1.0)),
            address: String::new(),
            contact: String::new(),
            photo_path: None,
            status,
            created_at: t0(),
        };
        let postings = vec![posting("1", PostingStatus::Pending), posting("2", PostingStatus::Found)];
        let window = MapWindow::new(None, None, None, None, t0());

        let visible = filter_lost_for_map(&postings, &window);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "1");
    }
}
