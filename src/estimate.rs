//! The estimation pipeline: nearby readings to an AQI verdict.

use crate::aqi::AqiResult;
use crate::geo::GeoPoint;
use crate::interpolate::{self, ValuedPoint};
use crate::sensors::Neighbor;
use crate::Error;

/// What the pipeline concluded for one query point.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationResult {
    /// Index, category, and advisory text for the worst of the available
    /// concentration estimates.
    pub aqi: AqiResult,

    /// Concentration at the single nearest sensor.
    pub nearest_concentration: f64,

    /// Concentration interpolated at the query point itself, when some
    /// triangle of the nearby sensors encloses it.
    pub interpolated_concentration: Option<f64>,

    /// How far away the nearest sensor is.
    pub nearest_distance_km: f64,
}

impl EstimationResult {
    /// Smallest and largest of the available concentration estimates.
    pub fn concentration_range(&self) -> (f64, f64) {
        match self.interpolated_concentration {
            Some(interpolated) => (
                interpolated.min(self.nearest_concentration),
                interpolated.max(self.nearest_concentration),
            ),
            None => (self.nearest_concentration, self.nearest_concentration),
        }
    }
}

/// Estimate air quality at `query` from its nearby sensors, nearest first
/// (the order [`crate::sensors::select_nearby`] returns).
///
/// The nearest sensor's concentration always contributes. Interpolation
/// contributes when a triangle of the nearby sensors encloses the query
/// point; when none does, normal at the sparse edge of the network, the
/// estimate degrades to the nearest reading alone. The reported AQI comes
/// from the maximum of the available estimates: when the nearest sensor
/// and the interpolation disagree, the answer must not understate the
/// risk.
///
/// An empty `nearby` is [`Error::InsufficientData`], and so is one with
/// fewer than the three sensors interpolation needs; both mean selection
/// upstream was misconfigured, and neither is degraded around silently.
pub fn estimate(query: GeoPoint, nearby: &[Neighbor]) -> Result<EstimationResult, Error> {
    query.validate()?;
    let Some(nearest) = nearby.first() else {
        return Err(Error::InsufficientData("no nearby sensors to estimate from"));
    };
    for neighbor in nearby {
        let pm = neighbor.reading.concentration;
        if !pm.is_finite() || pm < 0.0 {
            return Err(Error::InvalidInput(format!(
                "sensor {} concentration {pm} is not a non-negative number",
                neighbor.reading.id
            )));
        }
    }

    let points: Vec<ValuedPoint> = nearby
        .iter()
        .map(|neighbor| {
            ValuedPoint::new(
                neighbor.reading.location.longitude,
                neighbor.reading.location.latitude,
                neighbor.reading.concentration,
            )
        })
        .collect();

    let interpolated = match interpolate::interpolate(query.longitude, query.latitude, &points) {
        Ok(value) => Some(value),
        Err(Error::NoEnclosingTriangle) => {
            tracing::debug!("no enclosing sensor triangle; using the nearest reading only");
            None
        }
        Err(err) => return Err(err),
    };

    let worst = match interpolated {
        Some(value) => value.max(nearest.reading.concentration),
        None => nearest.reading.concentration,
    };
    let aqi = AqiResult::from_concentration(worst)?;
    tracing::debug!(
        "nearest pm {} at {:.1} km, interpolated {:?}, aqi {}",
        nearest.reading.concentration,
        nearest.distance_km,
        interpolated,
        aqi
    );

    Ok(EstimationResult {
        aqi,
        nearest_concentration: nearest.reading.concentration,
        interpolated_concentration: interpolated,
        nearest_distance_km: nearest.distance_km,
    })
}
