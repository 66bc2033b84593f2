//! Client for the remote clustering/training service.
//!
//! # Overview
//! Every response carries an envelope `{status, message, data}`; a status in
//! `[100, 200)` means success regardless of the HTTP status line.
//!
//! # Design
//! - `ClusterClient` is stateless and does no I/O: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`.
//! - `RequestClient` wires it to a `Transport` and a `DiagnosticSink`. Its
//!   silent methods take an optional success continuation and route failures
//!   to the sink; its `try_*` methods return `Result`.
//! - DTOs are defined independently from the mock-server crate; the
//!   lifecycle test catches schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod sink;
pub mod transport;
pub mod types;

pub use client::{ClusterClient, AREA_PATH, CLEAR_PATH, CLUSTER_PATH, POINT_PATH, TRAIN_PATH};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{RequestClient, NO_CALLBACK};
pub use sink::{DiagnosticSink, IgnoreSink, LogSink};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AddArea, AddClusters, AddPoints, AreaCreated, AreaId, AreaView, ClearArea, ClusterView,
    DistanceId, Envelope, Point, Train, TrainResult,
};
