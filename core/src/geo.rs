//! Great-circle distance between survey coordinates.

use crate::types::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two (lat, lng) points in degrees.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero_km() {
        let p = GeoPoint::new(-23.5505, -46.6333);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = haversine_km(a, b);
        assert!((d - 111.19).abs() < 0.1, "Expected ~111.19 km, got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let sao_paulo = GeoPoint::new(-23.5505, -46.6333);
        let campinas = GeoPoint::new(-22.9099, -47.0626);
        let there = haversine_km(sao_paulo, campinas);
        let back = haversine_km(campinas, sao_paulo);
        assert!((there - back).abs() < 1e-9);
        // ~84 km by great circle
        assert!(there > 75.0 && there < 95.0, "Unexpected distance {there}");
    }
}
