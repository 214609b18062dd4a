//! Great-circle distances between geographic points.
//!
//! The distance is the spherical law of cosines on a mean Earth radius, in
//! the classic form published by
//! [GeoDataSource](https://www.geodatasource.com/developers): the arc in
//! degrees, times 60 minutes per degree, times 1.1515 statute miles per
//! arc minute. Good to a fraction of a percent, which is far below sensor
//! siting error at neighborhood scale.

use crate::{require_range, Error};

/// Kilometers per statute mile.
const KM_PER_MILE: f64 = 1.609344;

/// Nautical miles per statute mile.
const NM_PER_MILE: f64 = 0.8684;

/// A point on the Earth's surface, in decimal degrees.
///
/// South latitudes are negative, east longitudes are positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// Check that both coordinates are finite and in range: latitude in
    /// [-90, 90], longitude in [-180, 180].
    pub fn validate(&self) -> Result<(), Error> {
        require_range(self.latitude, -90.0, 90.0, "latitude")?;
        require_range(self.longitude, -180.0, 180.0, "longitude")?;
        Ok(())
    }
}

/// Units [`distance`] can report in.
///
/// Statute miles are the base unit of the underlying formula; the others
/// are fixed multiples of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    StatuteMiles,
    Kilometers,
    NauticalMiles,
}

/// Great-circle distance between `p1` and `p2`.
///
/// Out-of-range coordinates fail with [`Error::InvalidInput`] rather than
/// producing a sentinel distance. A caller that wants to keep going with a
/// bad point substitutes its own effectively-infinite distance, where the
/// substitution is visible; [`crate::sensors::select_nearby`] does exactly
/// that.
pub fn distance(p1: GeoPoint, p2: GeoPoint, unit: Unit) -> Result<f64, Error> {
    p1.validate()?;
    p2.validate()?;

    // Coincident points are exactly zero, with no trigonometry: rounding
    // through cos/acos could otherwise produce NaN for them.
    if p1 == p2 {
        return Ok(0.0);
    }

    let rad_lat1 = p1.latitude.to_radians();
    let rad_lat2 = p2.latitude.to_radians();
    let rad_theta = (p1.longitude - p2.longitude).to_radians();

    let cos_arc =
        rad_lat1.sin() * rad_lat2.sin() + rad_lat1.cos() * rad_lat2.cos() * rad_theta.cos();
    // Floating error can push the cosine just past +/-1, where acos is NaN.
    let arc = cos_arc.clamp(-1.0, 1.0).acos();

    // One arc minute is 1.1515 statute miles on the mean sphere.
    let miles = arc.to_degrees() * 60.0 * 1.1515;
    Ok(match unit {
        Unit::StatuteMiles => miles,
        Unit::Kilometers => miles * KM_PER_MILE,
        Unit::NauticalMiles => miles * NM_PER_MILE,
    })
}

/// [`distance`] in kilometers, the unit the rest of the crate reports.
pub fn distance_km(p1: GeoPoint, p2: GeoPoint) -> Result<f64, Error> {
    distance(p1, p2, Unit::Kilometers)
}
