//! Core value types shared across the object model.

use serde::{Deserialize, Serialize};

/// Opaque reference to a native geodesy-engine resource.
///
/// A handle is move-only: exactly one wrapper owns a given handle at a time,
/// and ownership transfers into the wrapper at construction. The raw value is
/// only meaningful to the engine that issued it; zero is the null handle and
/// is rejected at every construction boundary.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RawHandle(u64);

impl RawHandle {
    pub fn new(raw: u64) -> Self {
        RawHandle(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Opaque reference to an engine-owned ordered candidate list.
///
/// Move-only for the same reason as [`RawHandle`]: the candidate aggregate
/// that receives it owns it and destroys it exactly once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ListHandle(u64);

impl ListHandle {
    pub fn new(raw: u64) -> Self {
        ListHandle(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Direction in which a coordinate operation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Inverse,
}

/// A coordinate with up to four ordinates (x, y, z, t).
///
/// The time ordinate defaults to infinity, which the engine reads as "any
/// epoch". Validity of a transform result is judged on the x ordinate alone:
/// engines report coverage failures by returning a non-finite x rather than
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Coordinate {
            x,
            y,
            z: 0.0,
            t: f64::INFINITY,
        }
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }

    pub fn with_t(mut self, t: f64) -> Self {
        self.t = t;
        self
    }

    /// The sentinel returned by engines for points outside every usable grid.
    pub fn non_finite() -> Self {
        Coordinate {
            x: f64::INFINITY,
            y: f64::INFINITY,
            z: f64::INFINITY,
            t: f64::INFINITY,
        }
    }

    /// Whether this coordinate is a usable transform result.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
    }
}

/// Geographic bounding box handed to the engine's candidate ranker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterest {
    pub west_lon_degree: f64,
    pub south_lat_degree: f64,
    pub east_lon_degree: f64,
    pub north_lat_degree: f64,
}

/// Options forwarded verbatim to the engine when ranking candidate
/// operations between two reference systems. This layer never interprets
/// them; it only carries them from configuration to the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOptions {
    /// Desired accuracy in meters, if the caller cares.
    #[serde(default)]
    pub desired_accuracy: Option<f64>,

    /// Restrict ranking to operations usable inside this area.
    #[serde(default)]
    pub area_of_interest: Option<AreaOfInterest>,

    /// Allow "ballpark" operations with unknown accuracy.
    #[serde(default = "default_allow_ballpark")]
    pub allow_ballpark: bool,
}

fn default_allow_ballpark() -> bool {
    true
}

impl Default for RankingOptions {
    fn default() -> Self {
        RankingOptions {
            desired_accuracy: None,
            area_of_interest: None,
            allow_ballpark: true,
        }
    }
}
