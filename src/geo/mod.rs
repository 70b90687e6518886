use crate::models::driver::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    EARTH_RADIUS_KM * 2.0 * haversine.sqrt().asin()
}

pub fn is_valid(point: &GeoPoint) -> bool {
    point.lat.is_finite()
        && point.lng.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lng)
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, is_valid};
    use crate::models::driver::GeoPoint;

    #[test]
    fn same_point_has_no_distance() {
        let cbd = GeoPoint {
            lat: -1.2864,
            lng: 36.8172,
        };
        assert!(haversine_km(&cbd, &cbd) < 1e-9);
    }

    #[test]
    fn nairobi_to_mombasa_is_around_440_km() {
        let nairobi = GeoPoint {
            lat: -1.2864,
            lng: 36.8172,
        };
        let mombasa = GeoPoint {
            lat: -4.0435,
            lng: 39.6682,
        };
        assert!((haversine_km(&nairobi, &mombasa) - 440.7).abs() < 2.0);
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(!is_valid(&GeoPoint { lat: 91.0, lng: 0.0 }));
        assert!(!is_valid(&GeoPoint { lat: 0.0, lng: f64::NAN }));
        assert!(is_valid(&GeoPoint { lat: -1.3, lng: 36.8 }));
    }
}
