//! Stateless HTTP request builder and envelope parser for the cluster API.
//!
//! # Design
//! `ClusterClient` holds only a `base_url`. Every endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`, so the I/O boundary stays explicit and the
//! request shapes can be checked without a server.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AddArea, AddClusters, AddPoints, AreaCreated, AreaId, AreaView, ClearArea, DistanceId,
    Envelope, Point, Train, TrainResult,
};

pub const AREA_PATH: &str = "/api/area";
pub const POINT_PATH: &str = "/api/point";
pub const CLUSTER_PATH: &str = "/api/cluster";
pub const TRAIN_PATH: &str = "/api/train";
pub const CLEAR_PATH: &str = "/api/clear";

/// Synchronous, stateless client for the cluster API.
#[derive(Debug, Clone)]
pub struct ClusterClient {
    base_url: String,
}

impl ClusterClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a POST to `endpoint` carrying `payload` as a JSON body.
    pub fn build_post<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{endpoint}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_add_area(&self) -> Result<HttpRequest, ApiError> {
        self.build_post(AREA_PATH, &AddArea {})
    }

    pub fn build_add_points(&self, id: AreaId, points: &[Point]) -> Result<HttpRequest, ApiError> {
        self.build_post(
            POINT_PATH,
            &AddPoints {
                id,
                points: points.to_vec(),
            },
        )
    }

    pub fn build_add_clusters(&self, id: AreaId, clusters: &[Point]) -> Result<HttpRequest, ApiError> {
        self.build_post(
            CLUSTER_PATH,
            &AddClusters {
                id,
                clusters: clusters.to_vec(),
            },
        )
    }

    pub fn build_train(
        &self,
        id: AreaId,
        dist_id: DistanceId,
        by_step: bool,
        max_age: u32,
    ) -> Result<HttpRequest, ApiError> {
        self.build_post(
            TRAIN_PATH,
            &Train {
                id,
                dist_id,
                by_step,
                max_age,
            },
        )
    }

    /// Build a lookup of an area's clusters, optionally under a specific metric.
    pub fn build_get_area(&self, id: AreaId, dist_id: Option<&DistanceId>) -> HttpRequest {
        let path = match dist_id {
            Some(dist_id) => {
                let selector = dist_id.to_string();
                let encoded: String = form_urlencoded::byte_serialize(selector.as_bytes()).collect();
                format!("{}{AREA_PATH}/{id}?dist_id={encoded}", self.base_url)
            }
            None => format!("{}{AREA_PATH}/{id}", self.base_url),
        };
        HttpRequest {
            method: HttpMethod::Get,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_clear_area(&self, id: AreaId) -> Result<HttpRequest, ApiError> {
        self.build_post(CLEAR_PATH, &ClearArea { id })
    }

    /// Unwrap the envelope of `response` and deserialize its `data`.
    ///
    /// Use `T = serde_json::Value` to receive `data` verbatim. `status` must
    /// be a JSON integer; `100.0` or `"100"` is a deserialization failure.
    pub fn parse_envelope<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }
        let envelope: Envelope =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        if !envelope.is_success() {
            return Err(ApiError::Application {
                status: envelope.status,
                message: envelope.message,
            });
        }
        serde_json::from_value(envelope.data).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_add_area(&self, response: HttpResponse) -> Result<AreaId, ApiError> {
        self.parse_envelope::<AreaCreated>(response).map(|created| created.id)
    }

    pub fn parse_train(&self, response: HttpResponse) -> Result<TrainResult, ApiError> {
        self.parse_envelope(response)
    }

    pub fn parse_get_area(&self, response: HttpResponse) -> Result<AreaView, ApiError> {
        self.parse_envelope(response)
    }

    /// Parse a response whose `data` is only an acknowledgement.
    pub fn parse_ack(&self, response: HttpResponse) -> Result<Value, ApiError> {
        self.parse_envelope(response)
    }
}
