//! Executing client: builds a request, sends it, unwraps the envelope.
//!
//! # Design
//! Two call surfaces share one pipeline. The `try_*` methods return
//! `Result<_, ApiError>` and leave error handling to the caller. The silent
//! methods (`post`, `add_area`, ...) take an optional success continuation,
//! hand every failure to the injected `DiagnosticSink`, and only report back
//! whether the call succeeded.

use std::sync::Arc;
use std::thread::JoinHandle;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ClusterClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::sink::{DiagnosticSink, LogSink};
use crate::transport::{Transport, UreqTransport};
use crate::types::{AreaCreated, AreaId, AreaView, DistanceId, Point, TrainResult};

/// Pass as the continuation when the caller does not need the result.
pub const NO_CALLBACK: Option<fn(Value)> = None;

/// Cluster API client that performs I/O.
///
/// Clones share the transport and sink.
#[derive(Clone)]
pub struct RequestClient {
    client: ClusterClient,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn DiagnosticSink>,
}

impl RequestClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            client: ClusterClient::new(base_url),
            transport,
            sink,
        }
    }

    /// A ureq-backed client that logs failures.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            &config.base_url,
            Arc::new(UreqTransport::new(config.timeout)),
            Arc::new(LogSink),
        )
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn client(&self) -> &ClusterClient {
        &self.client
    }

    fn send<T: DeserializeOwned>(&self, request: Result<HttpRequest, ApiError>) -> Result<T, ApiError> {
        let request = request?;
        log::debug!("{} {}", request.method.as_str(), request.path);
        let response = self.transport.execute(request)?;
        self.client.parse_envelope(response)
    }

    fn settle<T, F: FnOnce(T)>(&self, result: Result<T, ApiError>, on_success: Option<F>) -> bool {
        match result {
            Ok(data) => {
                if let Some(on_success) = on_success {
                    on_success(data);
                }
                true
            }
            Err(err) => {
                self.sink.report(&err);
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Strict surface
    // -----------------------------------------------------------------------

    pub fn try_post<P: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<T, ApiError> {
        self.send(self.client.build_post(endpoint, payload))
    }

    pub fn try_add_area(&self) -> Result<AreaId, ApiError> {
        self.send::<AreaCreated>(self.client.build_add_area())
            .map(|created| created.id)
    }

    pub fn try_add_points(&self, id: AreaId, points: &[Point]) -> Result<Value, ApiError> {
        self.send(self.client.build_add_points(id, points))
    }

    pub fn try_add_clusters(&self, id: AreaId, clusters: &[Point]) -> Result<Value, ApiError> {
        self.send(self.client.build_add_clusters(id, clusters))
    }

    pub fn try_train(
        &self,
        id: AreaId,
        dist_id: DistanceId,
        by_step: bool,
        max_age: u32,
    ) -> Result<TrainResult, ApiError> {
        self.send(self.client.build_train(id, dist_id, by_step, max_age))
    }

    pub fn try_get_area(&self, id: AreaId, dist_id: Option<&DistanceId>) -> Result<AreaView, ApiError> {
        self.send(Ok(self.client.build_get_area(id, dist_id)))
    }

    pub fn try_clear_area(&self, id: AreaId) -> Result<Value, ApiError> {
        self.send(self.client.build_clear_area(id))
    }

    // -----------------------------------------------------------------------
    // Silent surface
    // -----------------------------------------------------------------------

    /// POST `payload` to `endpoint` and hand the envelope's `data` to
    /// `on_success` unchanged. Failures go to the sink; the continuation is
    /// then skipped. Returns whether the call succeeded.
    pub fn post<P, F>(&self, endpoint: &str, payload: &P, on_success: Option<F>) -> bool
    where
        P: Serialize + ?Sized,
        F: FnOnce(Value),
    {
        self.settle(self.try_post::<P, Value>(endpoint, payload), on_success)
    }

    /// Run `post` on a background thread and return at once.
    pub fn spawn_post<F>(&self, endpoint: &str, payload: Value, on_success: Option<F>) -> JoinHandle<bool>
    where
        F: FnOnce(Value) + Send + 'static,
    {
        let client = self.clone();
        let endpoint = endpoint.to_string();
        std::thread::spawn(move || client.post(&endpoint, &payload, on_success))
    }

    /// Create an area; `data` carries its identifier as `{ "id": n }`.
    pub fn add_area<F: FnOnce(Value)>(&self, on_success: Option<F>) -> bool {
        self.settle(self.send::<Value>(self.client.build_add_area()), on_success)
    }

    pub fn add_points<F: FnOnce(Value)>(&self, id: AreaId, points: &[Point], on_success: Option<F>) -> bool {
        self.settle(self.send::<Value>(self.client.build_add_points(id, points)), on_success)
    }

    pub fn add_clusters<F: FnOnce(Value)>(
        &self,
        id: AreaId,
        clusters: &[Point],
        on_success: Option<F>,
    ) -> bool {
        self.settle(self.send::<Value>(self.client.build_add_clusters(id, clusters)), on_success)
    }

    pub fn train<F: FnOnce(Value)>(
        &self,
        id: AreaId,
        dist_id: DistanceId,
        by_step: bool,
        max_age: u32,
        on_success: Option<F>,
    ) -> bool {
        self.settle(
            self.send::<Value>(self.client.build_train(id, dist_id, by_step, max_age)),
            on_success,
        )
    }

    pub fn get_area<F: FnOnce(Value)>(
        &self,
        id: AreaId,
        dist_id: Option<&DistanceId>,
        on_success: Option<F>,
    ) -> bool {
        self.settle(self.send::<Value>(Ok(self.client.build_get_area(id, dist_id))), on_success)
    }

    pub fn clear_area<F: FnOnce(Value)>(&self, id: AreaId, on_success: Option<F>) -> bool {
        self.settle(self.send::<Value>(self.client.build_clear_area(id)), on_success)
    }
}
