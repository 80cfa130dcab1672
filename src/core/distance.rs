use crate::models::{BoundingBox, Coordinates};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two coordinates in kilometers
#[inline]
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Calculate a bounding box around a center point
///
/// Much cheaper than Haversine, used to reject far-away pairs early. The box
/// encloses the whole spherical cap, so it never rejects a point that is
/// within `radius_km`. When the cap reaches a pole the longitude span is
/// unbounded.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat_delta = angular.to_degrees();

    let ratio = angular.sin() / lat.to_radians().cos();
    let lon_delta = if angular >= std::f64::consts::FRAC_PI_2 || ratio.is_nan() || ratio >= 1.0 {
        f64::INFINITY
    } else {
        ratio.asin().to_degrees()
    };

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
///
/// Boxes that wrap the antimeridian only constrain latitude.
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    if lat < bbox.min_lat || lat > bbox.max_lat {
        return false;
    }
    if bbox.min_lon < -180.0 || bbox.max_lon > 180.0 {
        return true;
    }
    lon >= bbox.min_lon && lon <= bbox.max_lon
}
