//! Great-circle distance and bounding-box approximation.
//!
//! The bounding box is only a pre-filter; [`great_circle_distance_miles`] is
//! the authoritative cutoff. The box uses 69 miles per degree of latitude,
//! which is slightly less than the 69.1 implied by the Haversine radius, so
//! the box is a little larger than the circle it approximates.

const EARTH_RADIUS_MILES: f64 = 3959.0;
const MILES_PER_LAT_DEGREE: f64 = 69.0;

/// Floor for `cos(latitude)` in the longitude span. Keeps the box finite at
/// the poles; no effect anywhere a ZIP code can be.
const MIN_LON_COSINE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Inclusive on all four edges.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Haversine distance in miles, rounded to two decimal places.
#[must_use]
pub fn great_circle_distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let a = sin_lat * sin_lat
        + lat1.to_radians().cos() * lat2.to_radians().cos() * sin_lon * sin_lon;
    // Rounding can push `a` a hair above 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    round_to_hundredths(EARTH_RADIUS_MILES * c)
}

/// Rectangle in degrees around `(lat, lon)` covering `radius_miles`.
#[must_use]
pub fn bounding_box(lat: f64, lon: f64, radius_miles: f64) -> BoundingBox {
    let lat_degree_per_mile = 1.0 / MILES_PER_LAT_DEGREE;
    let lon_degree_per_mile =
        1.0 / (MILES_PER_LAT_DEGREE * lat.to_radians().cos().max(MIN_LON_COSINE));

    BoundingBox {
        min_lat: lat - radius_miles * lat_degree_per_mile,
        max_lat: lat + radius_miles * lat_degree_per_mile,
        min_lon: lon - radius_miles * lon_degree_per_mile,
        max_lon: lon + radius_miles * lon_degree_per_mile,
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
