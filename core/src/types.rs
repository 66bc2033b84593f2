//! Wire DTOs for the cluster API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! the end-to-end test in `tests/lifecycle.rs` catches drift between the two.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-side identifier of a working area.
pub type AreaId = u64;

/// Coordinates of a single point. Points within one area share a dimension.
pub type Point = Vec<f64>;

/// Envelope statuses in this half-open range mean success.
pub const SUCCESS_STATUS: std::ops::Range<i64> = 100..200;

/// The `{status, message, data}` wrapper carried by every response.
///
/// `status` is an application code, independent of the HTTP status.
/// `data` is kept raw until the status says it is worth decoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    pub status: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        SUCCESS_STATUS.contains(&self.status)
    }
}

/// Distance metric selector for training.
///
/// The server accepts either a numeric id or a metric name, so both forms are
/// serialized verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistanceId {
    Id(u32),
    Name(String),
}

impl From<u32> for DistanceId {
    fn from(id: u32) -> Self {
        DistanceId::Id(id)
    }
}

impl From<&str> for DistanceId {
    fn from(name: &str) -> Self {
        DistanceId::Name(name.to_string())
    }
}

impl fmt::Display for DistanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceId::Id(id) => write!(f, "{id}"),
            DistanceId::Name(name) => f.write_str(name),
        }
    }
}

/// Payload for `/api/area`. Serializes to `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddArea {}

/// Payload for `/api/point`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPoints {
    pub id: AreaId,
    pub points: Vec<Point>,
}

/// Payload for `/api/cluster`. Each entry is a cluster center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddClusters {
    pub id: AreaId,
    pub clusters: Vec<Point>,
}

/// Payload for `/api/train`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Train {
    pub id: AreaId,
    pub dist_id: DistanceId,
    pub by_step: bool,
    pub max_age: u32,
}

/// Payload for `/api/clear`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearArea {
    pub id: AreaId,
}

/// `data` of a successful `/api/area` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCreated {
    pub id: AreaId,
}

/// A cluster center together with the points currently assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterView {
    pub center: Point,
    #[serde(default)]
    pub points: Vec<Point>,
}

/// `data` of a successful `/api/train` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainResult {
    pub finished: bool,
    #[serde(default)]
    pub clusters: Vec<ClusterView>,
}

/// `data` of a successful area lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaView {
    #[serde(default)]
    pub clusters: Vec<ClusterView>,
}
