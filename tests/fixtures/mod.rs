//! Shared fixtures for the route pipeline tests.
//!
//! Mirrors a small watering run: one transporter, two clusters (two trees
//! and one tree) and upstream responses for each engine.
#![allow(dead_code)]

use geojson::FeatureCollection;
use serde_json::{Value, json};
use watering_routes::config::{RoutingBackend, RoutingConfig};
use watering_routes::entities::{Tree, TreeCluster, Vehicle, VehicleType};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const START_POINT: [f64; 2] = [9.0, 48.0];
pub const END_POINT: [f64; 2] = [9.1, 48.1];
pub const WATERING_POINT: [f64; 2] = [9.05, 48.05];

pub const GPX_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?><gpx></gpx>"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn routing_config(
    backend: RoutingBackend,
    vroom: &MockServer,
    engine: &MockServer,
) -> RoutingConfig {
    let mut cfg = RoutingConfig {
        backend,
        start_point: START_POINT.to_vec(),
        end_point: END_POINT.to_vec(),
        watering_point: WATERING_POINT.to_vec(),
        ..Default::default()
    };
    cfg.vroom.base_url = vroom.uri();
    cfg.valhalla.base_url = engine.uri();
    cfg.ors.base_url = engine.uri();
    cfg.streamlet.base_url = engine.uri();
    cfg
}

pub fn transporter() -> Vehicle {
    Vehicle {
        id: 1,
        description: "Test Vehicle".to_string(),
        water_capacity: 5000.0,
        vehicle_type: VehicleType::Transporter,
        width: 2.5,
        height: 3.0,
        length: 6.0,
        weight: 7.5,
    }
}

pub fn unknown_vehicle() -> Vehicle {
    Vehicle {
        vehicle_type: VehicleType::Unknown,
        ..transporter()
    }
}

pub fn cluster(id: i32, name: &str, lon: Option<f64>, lat: Option<f64>, trees: usize) -> TreeCluster {
    TreeCluster {
        id,
        name: name.to_string(),
        longitude: lon,
        latitude: lat,
        trees: vec![Tree::default(); trees],
    }
}

pub fn clusters() -> Vec<TreeCluster> {
    vec![
        cluster(1, "Cluster A", Some(9.2), Some(48.2), 2),
        cluster(2, "Cluster B", Some(9.3), Some(48.3), 1),
    ]
}

pub fn step(kind: &str, location: [f64; 2], load: i32) -> Value {
    json!({ "type": kind, "location": location, "load": [load] })
}

pub fn vroom_response(steps: Vec<Value>) -> Value {
    json!({ "code": 0, "routes": [{ "vehicle": 1, "steps": steps }] })
}

/// start, pickup(160), delivery, pickup(80), delivery, end
pub fn alternating_steps() -> Vec<Value> {
    vec![
        step("start", START_POINT, 0),
        step("pickup", WATERING_POINT, 160),
        step("delivery", [9.2, 48.2], 0),
        step("pickup", WATERING_POINT, 80),
        step("delivery", [9.3, 48.3], 0),
        step("end", END_POINT, 0),
    ]
}

/// start, pickup(160), pickup(240), delivery, pickup(80), delivery, end
pub fn steps_with_consecutive_pickups() -> Vec<Value> {
    vec![
        step("start", START_POINT, 0),
        step("pickup", WATERING_POINT, 160),
        step("pickup", WATERING_POINT, 240),
        step("delivery", [9.2, 48.2], 0),
        step("pickup", WATERING_POINT, 80),
        step("delivery", [9.3, 48.3], 0),
        step("end", END_POINT, 0),
    ]
}

pub fn valhalla_response(length: f64, time: f64) -> Value {
    json!({
        "trip": {
            "status": 0,
            "summary": {
                "min_lat": 48.0, "min_lon": 9.0, "max_lat": 48.3, "max_lon": 9.3,
                "length": length, "time": time
            },
            "legs": [{
                "shape": "__upzA_cidP_ibE_ibE",
                "summary": { "min_lat": 48.0, "min_lon": 9.0, "max_lat": 48.1, "max_lon": 9.1 }
            }]
        }
    })
}

pub fn ors_geojson() -> Value {
    json!({
        "type": "FeatureCollection",
        "bbox": [9.0, 48.0, 9.1, 48.1],
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "LineString", "coordinates": [[9.0, 48.0], [9.1, 48.1]] }
        }],
        "metadata": { "service": "routing" }
    })
}

pub fn ors_response(distance: f64, duration: f64) -> Value {
    json!({ "routes": [{ "summary": { "distance": distance, "duration": duration } }] })
}

/// Coordinates of the `index`th feature, which must be a line string.
pub fn line_coordinates(collection: &FeatureCollection, index: usize) -> Vec<Vec<f64>> {
    match collection.features[index].geometry.as_ref().map(|geometry| &geometry.value) {
        Some(geojson::Value::LineString(line)) => line.clone(),
        other => panic!("expected a line string, got {other:?}"),
    }
}

pub fn json_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn gpx_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(GPX_BODY, "application/gpx+xml")
}

/// Mounts a catch-all mock that must never be hit.
pub async fn forbid_requests(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

/// JSON bodies of every request the server saw, in order.
pub async fn received_json(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("json request body"))
        .collect()
}
