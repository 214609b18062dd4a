//! Local air-quality estimation from a sparse sensor network.
//!
//! Answers "what is the air quality right here?" by combining the nearest
//! readings from a PurpleAir-style sensor feed around a query point:
//! rank sensors by great-circle distance, interpolate the PM2.5
//! concentration at the exact point from the smallest enclosing triangle of
//! sensors, and convert the worst available concentration into an Air
//! Quality Index category.
//!
//! The crate only computes. Fetching a feed, rendering the answer, and
//! asking a user for their location all belong to the caller; the seams are
//! [`sensors::SensorSource`] for records and [`cache::Cache`] for
//! freshness-checked storage, both trivially faked in tests.

pub mod aqi;
pub mod cache;
pub mod estimate;
pub mod geo;
pub mod interpolate;
pub mod sensors;

/// Errors from the estimation core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument was out of range or not a finite number.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Too little data to run the requested computation. This means the
    /// upstream selection step is misconfigured, so it is not degraded
    /// around silently.
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),

    /// No triangle of candidate sensors encloses the query point.
    ///
    /// Expected at the sparse edge of the network; callers either treat it
    /// as fatal or degrade to the nearest reading alone, as
    /// [`estimate::estimate`] does.
    #[error("no sensor triangle encloses the query point")]
    NoEnclosingTriangle,

    /// The sensor feed could not be decoded.
    #[error("malformed sensor feed: {0}")]
    Feed(String),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared range check: `value` must be finite and within `[min, max]`.
pub(crate) fn require_range(value: f64, min: f64, max: f64, what: &str) -> Result<(), Error> {
    if !value.is_finite() {
        return Err(Error::InvalidInput(format!(
            "{what} is not a finite number"
        )));
    }
    if value < min || value > max {
        return Err(Error::InvalidInput(format!(
            "{what} {value} out of range [{min}, {max}]"
        )));
    }
    Ok(())
}

/// Tunables for the end-to-end pipeline.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Settings {
    /// How many nearby sensors feed the estimate.
    ///
    /// Also bounds the O(n³) triangle enumeration in [`interpolate`]; keep
    /// it small.
    pub neighbors: usize,

    /// Readings older than this are not live.
    pub max_reading_age: chrono::Duration,

    /// Cached sensor records older than this get refreshed.
    pub cache_max_age: chrono::Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            neighbors: 10,
            max_reading_age: chrono::Duration::hours(1),
            cache_max_age: chrono::Duration::minutes(60),
        }
    }
}

/// Run the whole pipeline: pull records from `source`, keep the live ones,
/// rank them by distance from `query`, and estimate the AQI there.
pub fn estimate_at(
    query: geo::GeoPoint,
    source: &mut dyn sensors::SensorSource,
    settings: &Settings,
) -> Result<estimate::EstimationResult, Error> {
    query.validate()?;
    if settings.neighbors == 0 {
        return Err(Error::InvalidInput(
            "settings.neighbors must be at least 1".to_string(),
        ));
    }

    let records = source.records()?;
    tracing::info!("sensor records: {}", records.len());

    let readings: Vec<sensors::SensorReading> = records
        .iter()
        .filter(|r| r.is_live(settings.max_reading_age))
        .map(sensors::SensorReading::from)
        .collect();
    tracing::info!("live outdoor sensors: {}", readings.len());

    let nearby = sensors::select_nearby(query, &readings, settings.neighbors)?;
    tracing::debug!(
        "nearby sensor ids: {:?}",
        nearby.iter().map(|n| n.reading.id).collect::<Vec<_>>()
    );

    estimate::estimate(query, &nearby)
}
