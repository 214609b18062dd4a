//! Sensor records, liveness, and nearest-neighbor selection.
//!
//! A [`SensorSource`] produces raw records however the host arranges it: a
//! feed mirror on disk, a fixed set in memory, or either of those behind a
//! freshness-checked [`CachedSource`]. The caller filters the records it
//! trusts (see [`RawRecord::is_live`]) and [`select_nearby`] ranks the
//! survivors by great-circle distance from the query point.
//!
//! Record fields follow the PurpleAir public feed: sensor type 0 is an
//! outdoor unit, and `pm_1` style PM2.5 concentrations sit at zero when a
//! sensor is not reporting.

pub mod purpleair;

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::geo::{self, GeoPoint};
use crate::Error;

/// One raw record from a sensor source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// PM2.5 concentration in µg/m³.
    pub concentration: f64,
    /// 0 is an outdoor unit; anything else is indoor or unknown.
    pub sensor_type: u8,
    /// Seconds since the sensor last reported.
    pub age_seconds: u64,
}

impl RawRecord {
    /// The standard liveness filter: an outdoor sensor, actually reporting
    /// (concentration above zero), within `max_age` of its last report.
    ///
    /// Liveness is the caller's decision, applied before selection;
    /// [`select_nearby`] never filters on its own.
    pub fn is_live(&self, max_age: Duration) -> bool {
        let max_seconds = max_age.num_seconds().max(0) as u64;
        self.sensor_type == 0 && self.concentration > 0.0 && self.age_seconds <= max_seconds
    }
}

/// A usable reading: where it is and what it measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub id: u32,
    pub location: GeoPoint,
    pub concentration: f64,
}

impl From<&RawRecord> for SensorReading {
    fn from(record: &RawRecord) -> Self {
        SensorReading {
            id: record.id,
            location: GeoPoint::new(record.latitude, record.longitude),
            concentration: record.concentration,
        }
    }
}

/// A reading annotated with its distance from one query point.
///
/// The reading is copied, not mutated in place, so the same candidate set
/// can serve any number of query points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub reading: SensorReading,
    pub distance_km: f64,
}

/// The `k` candidates nearest to `query`, nearest first.
///
/// Returns fewer than `k` neighbors only when there are fewer candidates.
/// The sort is stable, so candidates at equal distance keep their input
/// order. A candidate whose coordinates fail validation is kept but ranked
/// at infinite distance, with a warning; one bad record must not sink the
/// whole query, and must not vanish silently either.
pub fn select_nearby(
    query: GeoPoint,
    candidates: &[SensorReading],
    k: usize,
) -> Result<Vec<Neighbor>, Error> {
    query.validate()?;
    if k == 0 {
        return Err(Error::InvalidInput("k must be at least 1".to_string()));
    }

    let mut neighbors: Vec<Neighbor> = candidates
        .iter()
        .map(|&reading| {
            let distance_km = match geo::distance_km(query, reading.location) {
                Ok(d) => d,
                Err(err) => {
                    tracing::warn!("sensor {}: {err}; ranking it last", reading.id);
                    f64::INFINITY
                }
            };
            Neighbor {
                reading,
                distance_km,
            }
        })
        .collect();
    neighbors.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    neighbors.truncate(k);
    Ok(neighbors)
}

/// A type that can produce the current set of sensor records.
///
/// Implementations decide where records come from and how stale they may
/// be; the pipeline treats them all alike.
pub trait SensorSource {
    /// Get the current records.
    fn records(&mut self) -> Result<Vec<RawRecord>, Error>;
}

/// Source with a fixed set of records: tests, and hosts that fetch
/// records on their own.
pub struct StaticSource {
    records: Vec<RawRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        StaticSource { records }
    }
}

impl SensorSource for StaticSource {
    fn records(&mut self) -> Result<Vec<RawRecord>, Error> {
        Ok(self.records.clone())
    }
}

/// Source reading a PurpleAir-format feed mirrored on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl SensorSource for FileSource {
    fn records(&mut self) -> Result<Vec<RawRecord>, Error> {
        let text = std::fs::read_to_string(&self.path)?;
        purpleair::decode_feed(&text)
    }
}

/// Wraps a source with a [`Cache`]: serve stored records while the entry
/// is fresh, refresh through the inner source otherwise.
///
/// An unreadable cache entry is discarded (with a warning) and refreshed
/// over. If the refresh itself fails, an expired entry is served as a last
/// resort before giving up.
pub struct CachedSource<S, C> {
    source: S,
    cache: C,
    max_age: Duration,
}

impl<S, C> CachedSource<S, C> {
    const KEY: &'static str = "sensors";

    pub fn new(source: S, cache: C, max_age: Duration) -> Self {
        CachedSource {
            source,
            cache,
            max_age,
        }
    }
}

impl<S, C> SensorSource for CachedSource<S, C>
where
    S: SensorSource,
    C: Cache,
{
    fn records(&mut self) -> Result<Vec<RawRecord>, Error> {
        let mut expired: Option<Vec<RawRecord>> = None;
        if let Some(entry) = self.cache.load(Self::KEY) {
            match serde_json::from_str::<Vec<RawRecord>>(&entry.value) {
                Ok(records) if entry.is_fresh(self.max_age) => {
                    tracing::debug!("reusing {} cached sensor records", records.len());
                    return Ok(records);
                }
                Ok(records) => expired = Some(records),
                Err(err) => tracing::warn!("discarding unreadable cache entry: {err}"),
            }
        }

        tracing::debug!("refreshing sensor records (slow)");
        match self.source.records() {
            Ok(records) => {
                self.cache
                    .store(Self::KEY, &serde_json::to_string(&records)?)?;
                Ok(records)
            }
            Err(err) => match expired {
                Some(records) => {
                    tracing::warn!("refresh failed ({err}); serving the expired cache");
                    Ok(records)
                }
                None => Err(err),
            },
        }
    }
}
