//! In-memory stand-in for the cluster service.
//!
//! Every handler answers HTTP 200 and carries the outcome in the
//! `{status, message, data}` envelope. Clustering is a plain nearest-center
//! assignment with mean updates, enough to give the client real data back.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub type AreaId = u64;
pub type Point = Vec<f64>;

/// Envelope status codes.
pub mod codes {
    pub const OK: i64 = 100;
    pub const AREA_CREATED: i64 = 101;
    pub const TRAINED: i64 = 102;
    pub const AREA: i64 = 103;
    pub const INCORRECT_REQUEST: i64 = 400;
    pub const AREA_NOT_FOUND: i64 = 404;
    pub const UNKNOWN_DISTANCE: i64 = 422;
}

pub const DEFAULT_MAX_AGE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: i64,
    pub message: String,
    pub data: Value,
}

impl Envelope {
    fn success(status: i64, data: Value) -> Json<Self> {
        Json(Self {
            status,
            message: String::new(),
            data,
        })
    }

    fn failure(status: i64, message: impl Into<String>) -> Json<Self> {
        let message = message.into();
        log::warn!("request failed with {status}: {message}");
        Json(Self {
            status,
            message,
            data: Value::Null,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DistanceId {
    Id(u32),
    Name(String),
}

#[derive(Deserialize)]
pub struct AddPoints {
    pub id: AreaId,
    #[serde(default)]
    pub points: Vec<Point>,
}

#[derive(Deserialize)]
pub struct AddClusters {
    pub id: AreaId,
    #[serde(default)]
    pub clusters: Vec<Point>,
}

#[derive(Deserialize)]
pub struct Train {
    pub id: AreaId,
    #[serde(default)]
    pub dist_id: Option<DistanceId>,
    #[serde(default)]
    pub by_step: bool,
    #[serde(default)]
    pub max_age: u32,
}

#[derive(Deserialize)]
pub struct ClearArea {
    pub id: AreaId,
}

#[derive(Deserialize)]
pub struct AreaQuery {
    pub dist_id: Option<DistanceId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterView {
    pub center: Point,
    pub points: Vec<Point>,
}

/// Distance functions selectable by id (1, 2, 3) or by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl Metric {
    /// Resolve a selector. Absent or `0` picks the default metric.
    pub fn resolve(dist_id: Option<&DistanceId>) -> Option<Self> {
        match dist_id {
            None => Some(Self::default()),
            Some(DistanceId::Id(id)) => Self::from_id(*id),
            Some(DistanceId::Name(name)) => match name.parse::<u32>() {
                Ok(id) => Self::from_id(id),
                Err(_) => Self::from_name(name),
            },
        }
    }

    fn from_id(id: u32) -> Option<Self> {
        match id {
            0 | 1 => Some(Self::Euclidean),
            2 => Some(Self::Manhattan),
            3 => Some(Self::Chebyshev),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "" | "euclidean" => Some(Self::Euclidean),
            "manhattan" => Some(Self::Manhattan),
            "chebyshev" => Some(Self::Chebyshev),
            _ => None,
        }
    }

    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
        match self {
            Self::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Self::Manhattan => diffs.sum(),
            Self::Chebyshev => diffs.fold(0.0, f64::max),
        }
    }
}

/// A working area: loose points plus cluster centers.
#[derive(Clone, Debug, Default)]
pub struct Area {
    pub points: Vec<Point>,
    pub centers: Vec<Point>,
}

impl Area {
    fn nearest(&self, metric: Metric, point: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, center) in self.centers.iter().enumerate() {
            let d = metric.distance(center, point);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((idx, d));
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub fn clusters_with_points(&self, metric: Metric) -> Vec<ClusterView> {
        let mut clusters: Vec<ClusterView> = self
            .centers
            .iter()
            .map(|center| ClusterView {
                center: center.clone(),
                points: Vec::new(),
            })
            .collect();
        for point in &self.points {
            if let Some(idx) = self.nearest(metric, point) {
                clusters[idx].points.push(point.clone());
            }
        }
        clusters
    }

    /// Move every center to the mean of its points. Returns true once no
    /// center moves.
    pub fn train_step(&mut self, metric: Metric) -> bool {
        let clusters = self.clusters_with_points(metric);
        let mut finished = true;
        for (center, cluster) in self.centers.iter_mut().zip(clusters) {
            if cluster.points.is_empty() {
                continue;
            }
            let mut mean = vec![0.0; center.len()];
            for point in &cluster.points {
                for (acc, x) in mean.iter_mut().zip(point) {
                    *acc += x;
                }
            }
            let n = cluster.points.len() as f64;
            mean.iter_mut().for_each(|acc| *acc /= n);
            if mean != *center {
                finished = false;
                *center = mean;
            }
        }
        finished
    }

    /// Step until convergence or `max_age` steps. Returns whether it converged.
    pub fn train(&mut self, metric: Metric, max_age: u32) -> bool {
        (0..max_age).any(|_| self.train_step(metric))
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.centers.clear();
    }
}

#[derive(Default)]
pub struct Storage {
    next_id: AreaId,
    areas: HashMap<AreaId, Area>,
}

impl Storage {
    pub fn add_area(&mut self) -> AreaId {
        self.next_id += 1;
        self.areas.insert(self.next_id, Area::default());
        self.next_id
    }

    pub fn area(&self, id: AreaId) -> Result<&Area, Json<Envelope>> {
        self.areas
            .get(&id)
            .ok_or_else(|| Envelope::failure(codes::AREA_NOT_FOUND, format!("area {id} not found")))
    }

    pub fn area_mut(&mut self, id: AreaId) -> Result<&mut Area, Json<Envelope>> {
        self.areas
            .get_mut(&id)
            .ok_or_else(|| Envelope::failure(codes::AREA_NOT_FOUND, format!("area {id} not found")))
    }
}

pub type Db = Arc<RwLock<Storage>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Storage::default()));
    Router::new()
        .route("/api/area", post(add_area))
        .route("/api/area/{id}", get(get_area))
        .route("/api/point", post(add_points))
        .route("/api/cluster", post(add_clusters))
        .route("/api/train", post(train))
        .route("/api/clear", post(clear_area))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn incorrect_json(rejection: JsonRejection) -> Json<Envelope> {
    Envelope::failure(codes::INCORRECT_REQUEST, format!("incorrect json: {}", rejection.body_text()))
}

fn resolve_metric(dist_id: Option<&DistanceId>) -> Result<Metric, Json<Envelope>> {
    Metric::resolve(dist_id)
        .ok_or_else(|| Envelope::failure(codes::UNKNOWN_DISTANCE, "unknown distance function"))
}

async fn add_area(State(db): State<Db>) -> Json<Envelope> {
    let id = db.write().await.add_area();
    log::info!("created area {id}");
    Envelope::success(codes::AREA_CREATED, json!({ "id": id }))
}

async fn add_points(State(db): State<Db>, input: Result<Json<AddPoints>, JsonRejection>) -> Json<Envelope> {
    let Json(input) = match input {
        Ok(input) => input,
        Err(rejection) => return incorrect_json(rejection),
    };
    let mut storage = db.write().await;
    match storage.area_mut(input.id) {
        Ok(area) => {
            area.points.extend(input.points);
            Envelope::success(codes::OK, json!("ok"))
        }
        Err(answer) => answer,
    }
}

async fn add_clusters(
    State(db): State<Db>,
    input: Result<Json<AddClusters>, JsonRejection>,
) -> Json<Envelope> {
    let Json(input) = match input {
        Ok(input) => input,
        Err(rejection) => return incorrect_json(rejection),
    };
    let mut storage = db.write().await;
    match storage.area_mut(input.id) {
        Ok(area) => {
            area.centers.extend(input.clusters);
            Envelope::success(codes::OK, json!("ok"))
        }
        Err(answer) => answer,
    }
}

async fn train(State(db): State<Db>, input: Result<Json<Train>, JsonRejection>) -> Json<Envelope> {
    let Json(input) = match input {
        Ok(input) => input,
        Err(rejection) => return incorrect_json(rejection),
    };
    let max_age = if input.max_age == 0 { DEFAULT_MAX_AGE } else { input.max_age };
    let mut storage = db.write().await;
    let area = match storage.area_mut(input.id) {
        Ok(area) => area,
        Err(answer) => return answer,
    };
    let metric = match resolve_metric(input.dist_id.as_ref()) {
        Ok(metric) => metric,
        Err(answer) => return answer,
    };

    let finished = if input.by_step {
        area.train_step(metric)
    } else {
        area.train(metric, max_age)
    };
    log::info!("trained area {} (by_step: {}, finished: {finished})", input.id, input.by_step);
    Envelope::success(
        codes::TRAINED,
        json!({ "finished": finished, "clusters": area.clusters_with_points(metric) }),
    )
}

async fn get_area(
    State(db): State<Db>,
    id: Result<Path<AreaId>, PathRejection>,
    query: Result<Query<AreaQuery>, QueryRejection>,
) -> Json<Envelope> {
    let (Ok(Path(id)), Ok(Query(query))) = (id, query) else {
        return Envelope::failure(codes::INCORRECT_REQUEST, "incorrect request");
    };
    let storage = db.read().await;
    let area = match storage.area(id) {
        Ok(area) => area,
        Err(answer) => return answer,
    };
    match resolve_metric(query.dist_id.as_ref()) {
        Ok(metric) => Envelope::success(
            codes::AREA,
            json!({ "clusters": area.clusters_with_points(metric) }),
        ),
        Err(answer) => answer,
    }
}

async fn clear_area(State(db): State<Db>, input: Result<Json<ClearArea>, JsonRejection>) -> Json<Envelope> {
    let Json(input) = match input {
        Ok(input) => input,
        Err(rejection) => return incorrect_json(rejection),
    };
    let mut storage = db.write().await;
    match storage.area_mut(input.id) {
        Ok(area) => {
            area.clear();
            Envelope::success(codes::OK, json!("ok"))
        }
        Err(answer) => answer,
    }
}
