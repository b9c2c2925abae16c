//! Streamlet backend: optimization and road geometry in a single call.
//!
//! Streamlet only returns geometry, so GPX export and route information
//! are reported as unsupported.

use async_trait::async_trait;
use geo::{BoundingRect, LineString};
use geojson::FeatureCollection;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{RoutingConfig, StreamletConfig, endpoint, http_client};
use crate::entities::{
    RouteLocations, RouteMetadata, TreeCluster, Vehicle, attach_locations, cluster_ids,
    route_collection,
};
use crate::error::{Result, RoutingError, Service};
use crate::gpx::GpxStream;
use crate::http::{post_json, read_json};
use crate::locations::convert_locations;
use crate::traits::RoutingRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub long: f64,
}

impl LatLon {
    fn from_lon_lat([long, lat]: [f64; 2]) -> Self {
        Self { lat, long }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub id: u32,
    pub loc: LatLon,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u32,
    pub demand: f32,
    pub loc: LatLon,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub height: f32,
    pub width: f32,
    pub length: f32,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    Truck(Truck),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamletVehicle {
    pub id: u32,
    pub capacity: f32,
    pub current_load: f32,
    pub current_time: f32,
    pub current_loc: LatLon,
    pub kind: VehicleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub depots: Vec<Depot>,
    pub clients: Vec<Customer>,
    pub vehicle: StreamletVehicle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolvedRoute {
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveData {
    pub routes: Vec<SolvedRoute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub data: SolveData,
}

#[derive(Debug, Clone)]
pub struct StreamletClient {
    config: StreamletConfig,
    locations: RouteLocations,
    client: Client,
}

impl StreamletClient {
    pub fn new(cfg: &RoutingConfig) -> Result<Self> {
        let locations = convert_locations(cfg)?;
        if cfg.streamlet.depots.is_empty() {
            return Err(RoutingError::NoDepots);
        }

        let client = http_client(cfg.streamlet.timeout_secs).map_err(RoutingError::Client)?;

        Ok(Self {
            config: cfg.streamlet.clone(),
            locations,
            client,
        })
    }

    /// Every cluster must be locatable; streamlet routes to all clients.
    pub(crate) fn to_solve_request(
        &self,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<SolveRequest> {
        let depots: Vec<Depot> = (1..)
            .zip(&self.config.depots)
            .map(|(id, depot)| Depot {
                id,
                loc: LatLon::from_lon_lat(*depot),
            })
            .collect();

        let clients = clusters
            .iter()
            .map(|cluster| {
                let location = cluster.coordinates().ok_or(RoutingError::MissingCoordinates {
                    cluster_id: cluster.id,
                })?;
                Ok(Customer {
                    id: cluster.id as u32,
                    demand: cluster.water_demand() as f32,
                    loc: LatLon::from_lon_lat(location),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let current_loc = depots.first().map(|depot| depot.loc).ok_or(RoutingError::NoDepots)?;
        let capacity = vehicle.water_capacity as f32;

        Ok(SolveRequest {
            depots,
            clients,
            vehicle: StreamletVehicle {
                id: 0,
                capacity,
                current_load: capacity,
                current_time: 0.0,
                current_loc,
                kind: VehicleKind::Truck(Truck {
                    height: vehicle.height as f32,
                    width: vehicle.width as f32,
                    length: vehicle.length as f32,
                    weight: vehicle.weight as f32,
                }),
            },
        })
    }
}

#[async_trait]
impl RoutingRepository for StreamletClient {
    async fn generate_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<FeatureCollection> {
        let request = self.to_solve_request(vehicle, clusters).inspect_err(|err| {
            error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                "failed to map tree clusters for streamlet");
        })?;

        let url = endpoint(
            &self.config.base_url,
            &format!("v1/solve/{}", self.config.router),
        );
        let response = async {
            let response = post_json(cancel, &self.client, Service::Streamlet, &url, &request).await?;
            read_json::<SolveResponse>(cancel, Service::Streamlet, response).await
        }
        .await
        .inspect_err(|err| {
            error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                "failed to solve and calculate route in streamlet");
        })?;

        let Some(route) = response.data.routes.into_iter().next() else {
            error!(vehicle_id = vehicle.id, "streamlet returned empty routes");
            return Err(RoutingError::EmptyRoutes);
        };

        let line = LineString::from(route.geometry.coordinates);
        let bbox = line.bounding_rect();

        debug!(vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters), "route generated");
        attach_locations(route_collection(&[line], bbox), &self.locations)
    }

    async fn generate_raw_gpx_route(
        &self,
        _cancel: &CancellationToken,
        _vehicle: &Vehicle,
        _clusters: &[TreeCluster],
    ) -> Result<GpxStream> {
        Err(RoutingError::Unsupported {
            service: Service::Streamlet,
            operation: "gpx export",
        })
    }

    async fn generate_route_information(
        &self,
        _cancel: &CancellationToken,
        _vehicle: &Vehicle,
        _clusters: &[TreeCluster],
    ) -> Result<RouteMetadata> {
        Err(RoutingError::Unsupported {
            service: Service::Streamlet,
            operation: "route information",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Tree, VehicleType};

    fn config() -> RoutingConfig {
        RoutingConfig {
            start_point: vec![9.0, 48.0],
            end_point: vec![9.1, 48.1],
            watering_point: vec![9.05, 48.05],
            ..Default::default()
        }
    }

    fn vehicle() -> Vehicle {
        Vehicle {
            id: 1,
            water_capacity: 3800.0,
            vehicle_type: VehicleType::Transporter,
            height: 1.92,
            width: 1.95,
            length: 9.86,
            weight: 6.0,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_empty_depot_list() {
        let mut cfg = config();
        cfg.streamlet.depots.clear();

        assert!(matches!(StreamletClient::new(&cfg), Err(RoutingError::NoDepots)));
    }

    #[test]
    fn builds_solve_request() {
        let client = StreamletClient::new(&config()).unwrap();
        let clusters = vec![TreeCluster {
            id: 7,
            longitude: Some(9.2),
            latitude: Some(48.2),
            trees: vec![Tree::default(); 3],
            ..Default::default()
        }];

        let request = client.to_solve_request(&vehicle(), &clusters).unwrap();

        assert_eq!(request.depots.len(), 2);
        assert_eq!(request.depots[0].id, 1);
        assert_eq!(request.depots[1].id, 2);
        assert_eq!(request.clients[0].id, 7);
        assert_eq!(request.clients[0].demand, 240.0);
        assert_eq!(request.clients[0].loc, LatLon { lat: 48.2, long: 9.2 });
        assert_eq!(request.vehicle.current_loc, request.depots[0].loc);
        assert_eq!(request.vehicle.current_load, 3800.0);
    }

    #[test]
    fn cluster_without_coordinates_fails() {
        let client = StreamletClient::new(&config()).unwrap();
        let clusters = vec![TreeCluster {
            id: 3,
            longitude: Some(9.2),
            ..Default::default()
        }];

        let err = client.to_solve_request(&vehicle(), &clusters).unwrap_err();

        assert!(matches!(err, RoutingError::MissingCoordinates { cluster_id: 3 }));
    }

    #[test]
    fn solve_response_requires_route_geometry() {
        let parsed = serde_json::from_value::<SolveResponse>(serde_json::json!({
            "data": { "routes": [{}] }
        }));
        assert!(parsed.is_err());

        let parsed = serde_json::from_value::<SolveResponse>(serde_json::json!({}));
        assert!(parsed.is_err());
    }

    #[test]
    fn vehicle_kind_serializes_as_truck_object() {
        let client = StreamletClient::new(&config()).unwrap();
        let request = client.to_solve_request(&vehicle(), &[]).unwrap();

        let value = serde_json::to_value(&request).unwrap();

        assert!(value["vehicle"]["kind"]["truck"]["height"].is_number());
        assert!(value["clients"].as_array().unwrap().is_empty());
    }
}
