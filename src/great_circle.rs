//! Coordinates on the WGS-84 ellipsoid and the distances between them.

use geo::{GeodesicDistance, Point};
use serde::Serialize;

use crate::errors::BackendError;

pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// A validated latitude/longitude pair, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Creates a new instance, rejecting values outside [-90, 90] and
    /// [-180, 180] respectively. The bounds themselves are accepted.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, BackendError> {
        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(BackendError::InvalidLatitude(latitude));
        }

        if !(-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(BackendError::InvalidLongitude(longitude));
        }

        Ok(Coordinates {
            latitude,
            longitude,
        })
    }

    /// Wraps values that were validated before being stored.
    pub(crate) fn unchecked(latitude: f64, longitude: f64) -> Self {
        Coordinates {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns the geodesic distance to `other` in meters.
    pub fn meters_to(&self, other: &Coordinates) -> f64 {
        self.as_point().geodesic_distance(&other.as_point())
    }

    fn as_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Returns the length in kilometers of the path through `points`, in
/// the order given.
pub fn path_kilometers(points: &[Coordinates]) -> f64 {
    let meters: f64 = points
        .windows(2)
        .map(|pair| pair[0].meters_to(&pair[1]))
        .sum();

    meters / 1000.0
}

/// Rounds `value` to the given number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);

    (value * factor).round() / factor
}
