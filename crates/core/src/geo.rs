//! Great-circle distance

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distance between two points using the haversine formula, in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Validate a guessed coordinate pair.
pub fn valid_coordinates(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point() {
        let dist = haversine_distance(51.5074, -0.1278, 51.5074, -0.1278);
        assert!(dist < 0.001);
    }

    #[test]
    fn test_london_to_paris() {
        // London to Paris is approximately 344 km
        let dist = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((dist - 344_000.0).abs() < 5000.0);
    }

    #[test]
    fn test_paris_longitude_offset() {
        // Same latitude, ~0.65 degrees of longitude: roughly 47 km
        let dist = haversine_distance(48.8566, 2.3522, 48.8566, 3.0);
        assert!((46_000.0..49_000.0).contains(&dist), "got {dist}");
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(valid_coordinates(90.0, 180.0));
        assert!(valid_coordinates(-90.0, -180.0));
        assert!(!valid_coordinates(90.1, 0.0));
        assert!(!valid_coordinates(0.0, -180.5));
    }
}
