//! Full area lifecycle against the live mock server.
//!
//! Starts the mock server on a random port, then drives every
//! `RequestClient` operation over real HTTP through `UreqTransport`, so the
//! client's DTOs and the server's schema are checked against each other.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cluster_api_core::{
    ApiError, ClientConfig, DiagnosticSink, DistanceId, RequestClient, UreqTransport, NO_CALLBACK,
};
use serde_json::{json, Value};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

#[derive(Default)]
struct Reports(Mutex<Vec<(bool, String)>>);

impl DiagnosticSink for Reports {
    fn report(&self, error: &ApiError) {
        self.0.lock().unwrap().push((error.is_application(), error.to_string()));
    }
}

fn client(addr: SocketAddr, sink: Arc<Reports>) -> RequestClient {
    let config = ClientConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_secs(5),
    };
    RequestClient::from_config(&config).with_sink(sink)
}

#[test]
fn area_lifecycle() {
    let addr = start_server();
    let sink = Arc::new(Reports::default());
    let client = client(addr, sink.clone());

    // Step 1: create an area and read its id from the callback.
    let mut created = None;
    assert!(client.add_area(Some(|data: Value| created = Some(data))));
    let id = created.unwrap()["id"].as_u64().unwrap();

    // Step 2: attach points and cluster centers.
    let points = vec![vec![0.0, 0.0], vec![0.0, 2.0], vec![10.0, 10.0], vec![10.0, 12.0]];
    let mut ack = None;
    assert!(client.add_points(id, &points, Some(|data| ack = Some(data))));
    assert_eq!(ack, Some(json!("ok")));
    assert!(client.add_clusters(id, &[vec![1.0, 1.0], vec![9.0, 9.0]], NO_CALLBACK));

    // Step 3: one training step moves the centers.
    let step = client.try_train(id, DistanceId::from("euclidean"), true, 10).unwrap();
    assert!(!step.finished);
    assert_eq!(step.clusters[0].center, vec![0.0, 1.0]);

    // Step 4: full training converges.
    let mut trained = None;
    assert!(client.train(id, DistanceId::Id(1), false, 10, Some(|data| trained = Some(data))));
    assert_eq!(trained.unwrap()["finished"], true);

    // Step 5: look the area up under another metric.
    let view = client.try_get_area(id, Some(&DistanceId::Id(2))).unwrap();
    assert_eq!(view.clusters.len(), 2);
    assert_eq!(view.clusters[1].points.len(), 2);

    // Reserved characters in a metric name reach the server intact.
    let err = client
        .try_get_area(id, Some(&DistanceId::from("cosine&dist_id=1")))
        .unwrap_err();
    assert!(matches!(err, ApiError::Application { status: 422, .. }), "{err:?}");
    let err = client
        .try_get_area(id, Some(&DistanceId::from("my metric")))
        .unwrap_err();
    assert!(matches!(err, ApiError::Application { status: 422, .. }), "{err:?}");

    // Step 6: clear it.
    assert!(client.clear_area(id, NO_CALLBACK));
    assert!(client.try_get_area(id, None).unwrap().clusters.is_empty());

    assert!(sink.0.lock().unwrap().is_empty(), "no failures expected");
}

#[test]
fn application_failure_reaches_sink_and_skips_callback() {
    let addr = start_server();
    let sink = Arc::new(Reports::default());
    let client = client(addr, sink.clone());

    let mut called = false;
    assert!(!client.add_points(999, &[vec![1.0, 2.0]], Some(|_| called = true)));
    assert!(!called);

    let reports = sink.0.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].0, "expected an application failure");
    assert!(reports[0].1.contains("area 999 not found"));
}

#[test]
fn unknown_route_is_transport_failure() {
    let addr = start_server();
    let sink = Arc::new(Reports::default());
    let client = client(addr, sink.clone());

    let mut called = false;
    assert!(!client.post("/api/missing", &json!({}), Some(|_| called = true)));
    assert!(!called);

    let reports = sink.0.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].0, "expected a transport failure");
}

#[test]
fn unreachable_server_is_transport_failure() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let sink = Arc::new(Reports::default());
    let client = RequestClient::new(
        &format!("http://{addr}"),
        Arc::new(UreqTransport::new(Duration::from_secs(2))),
        sink.clone(),
    );

    let mut called = false;
    assert!(!client.add_area(Some(|_| called = true)));
    assert!(!called);
    assert!(matches!(client.try_add_area(), Err(ApiError::Transport(_))));
    assert_eq!(sink.0.lock().unwrap().len(), 1);
}

#[test]
fn concurrent_calls_are_independent() {
    let addr = start_server();
    let client = client(addr, Arc::new(Reports::default()));

    let handles: Vec<_> = (0..4)
        .map(|_| client.spawn_post(cluster_api_core::AREA_PATH, json!({}), NO_CALLBACK))
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }

    // Four areas were created, so the next one gets id 5.
    assert_eq!(client.try_add_area().unwrap(), 5);
}
