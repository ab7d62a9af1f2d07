//! # Vehicle Route Simulator - Domain Model
//!
//! Value types shared by the kinematic core and every publishing sink.
//! The simulator produces [`VehicleSnapshot`]s, sinks consume them through the
//! [`VehicleObserver`] contract and map them onto the stable [`VehicleUpdate`]
//! wire payload.

use chrono::Utc;
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// A 2D coordinate. Treated as a point in the plane by the kinematic model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Euclidean distance over (lat, lon) as planar coordinates.
    ///
    /// This is a flat-plane approximation, not a geodesic distance. Use
    /// [`DistanceMetric::Haversine`] where great-circle distances are wanted.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Distance metric used for waypoint proximity and route length.
///
/// Ramp-down radius and arrival threshold are expressed in the units of the
/// chosen metric: coordinate degrees for `Planar`, metres for `Haversine`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistanceMetric {
    /// Euclidean distance in the (lat, lon) plane
    #[default]
    Planar,
    /// Great-circle distance in metres
    Haversine,
}

impl DistanceMetric {
    #[must_use]
    pub fn distance(self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        match self {
            Self::Planar => a.distance_to(b),
            Self::Haversine => {
                Haversine::distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planar => "PLANAR",
            Self::Haversine => "HAVERSINE",
        }
    }
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// Read-only copy of a vehicle's state right after its tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: String,
    pub position: GeoPoint,
    /// Radians, 0 = north, clockwise-positive
    pub heading: f64,
    /// Units per second
    pub speed: f64,
    pub max_speed: f64,

    // Route progress
    pub waypoint_index: usize,
    pub waypoint_count: usize,
    pub route_completed: bool,

    /// Simulation clock at the end of the tick that produced this snapshot
    pub simulation_time: f64,
}

// =============================================================================
// PUBLISHED PAYLOAD
// =============================================================================

/// Wire payload written by every sink. Field names are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleUpdate {
    pub id: String,
    /// Wall-clock seconds at publish time, not simulation time
    pub timestamp: i64,
    pub position: GeoPoint,
    pub heading: f64,
    pub speed: f64,
}

impl VehicleUpdate {
    /// Map a snapshot onto the payload with an explicit timestamp.
    #[must_use]
    pub fn from_snapshot(snapshot: &VehicleSnapshot, timestamp: i64) -> Self {
        Self {
            id: snapshot.id.clone(),
            timestamp,
            position: snapshot.position,
            heading: snapshot.heading,
            speed: snapshot.speed,
        }
    }

    /// Map a snapshot onto the payload stamped with the current wall clock.
    #[must_use]
    pub fn now(snapshot: &VehicleSnapshot) -> Self {
        Self::from_snapshot(snapshot, Utc::now().timestamp())
    }

    /// Compact single-line JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// =============================================================================
// OBSERVER CONTRACT
// =============================================================================

/// Receives every vehicle's post-tick snapshot, synchronously and in
/// registration order.
///
/// Implementations must return quickly: the simulation loop stalls while
/// `notify` runs. A returned error is logged by the caller and otherwise
/// ignored.
pub trait VehicleObserver: Send {
    /// Short name used in log output
    fn name(&self) -> &str;

    fn notify(&mut self, snapshot: &VehicleSnapshot) -> Result<()>;
}

impl<F> VehicleObserver for F
where
    F: FnMut(&VehicleSnapshot) + Send,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn notify(&mut self, snapshot: &VehicleSnapshot) -> Result<()> {
        (self)(snapshot);
        Ok(())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failures reported by observers
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Observer closed: {0}")]
    Closed(String),
}

impl From<serde_json::Error> for ObserverError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ObserverError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ObserverError>;
