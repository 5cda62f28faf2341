//! Great-circle geometry for sightings and map windows.

use crate::models::{BoundingBox, GeoPoint};

/// Mean Earth radius used for every sighting distance, in km.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres spanned by one degree of latitude.
const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance in km between two coordinates given in degrees.
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let half_dphi = (phi2 - phi1) / 2.0;
    let half_dlambda = (lon2 - lon1).to_radians() / 2.0;

    let h = half_dphi.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlambda.sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[inline]
pub fn distance_between(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Coarse square around `(lat, lon)` that contains every point within
/// `radius_km`. Map queries check it before the exact distance.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let dlat = radius_km / KM_PER_DEGREE;

    // longitude degrees shrink with cos(lat) and vanish at the poles
    let shrink = lat.to_radians().cos().abs();
    let dlon = if shrink < 1e-6 {
        180.0
    } else {
        dlat / shrink
    };

    BoundingBox {
        min_lat: lat - dlat,
        max_lat: lat + dlat,
        min_lon: lon - dlon,
        max_lon: lon + dlon,
    }
}

#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    (bbox.min_lat..=bbox.max_lat).contains(&lat) && (bbox.min_lon..=bbox.max_lon).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let berlin = point(52.52, 13.405);
        let hamburg = point(53.5511, 9.9937);

        let there = distance_between(&berlin, &hamburg);
        let back = distance_between(&hamburg, &berlin);

        assert!((there - back).abs() < 1e-9);
        // roughly 255 km by air
        assert!((there - 255.0).abs() < 10.0, "got {}", there);
    }

    #[test]
    fn test_nearby_sighting_is_well_under_five_km() {
        let distance = distance_between(&point(1.0, 1.0), &point(1.001, 1.001));
        assert!(distance > 0.1 && distance < 0.2, "got {}", distance);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let distance = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((distance - 111.19).abs() < 0.1, "got {}", distance);
    }

    #[test]
    fn test_box_widens_with_latitude() {
        let equator = calculate_bounding_box(0.0, 0.0, 25.0);
        let north = calculate_bounding_box(60.0, 0.0, 25.0);

        let equator_span = equator.max_lon - equator.min_lon;
        let north_span = north.max_lon - north.min_lon;
        assert!((north_span - 2.0 * equator_span).abs() < 0.01);
        assert!((north.max_lat - north.min_lat - 50.0 / 111.0).abs() < 1e-9);
    }

    #[test]
    fn test_box_edges_are_inclusive() {
        let bbox = calculate_bounding_box(52.52, 13.405, 5.0);

        assert!(is_within_bounding_box(bbox.max_lat, bbox.min_lon, &bbox));
        assert!(!is_within_bounding_box(bbox.max_lat + 1e-6, 13.405, &bbox));
    }

    #[test]
    fn test_box_at_pole_covers_all_longitudes() {
        let bbox = calculate_bounding_box(90.0, 0.0, 10.0);
        assert!(bbox.max_lon - bbox.min_lon >= 360.0);
    }
}
