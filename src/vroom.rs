//! VROOM HTTP adapter: pickup-delivery optimization of a watering run.
//!
//! Each tree cluster becomes one shipment that picks water up at the
//! watering point and delivers it to the cluster.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{VroomConfig, endpoint, http_client};
use crate::entities::{RouteLocations, TreeCluster, Vehicle, VehicleType};
use crate::error::{Result, RoutingError, Service};
use crate::http::{post_json, read_json};

/// Result code VROOM reports for a solved problem.
pub const VROOM_SUCCESS: i32 = 0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VroomRequest {
    pub vehicles: Vec<VroomVehicle>,
    pub shipments: Vec<VroomShipment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VroomVehicle {
    pub id: i32,
    #[serde(default)]
    pub description: String,
    pub profile: String,
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub capacity: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VroomShipmentStep {
    pub id: i32,
    pub location: [f64; 2],
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VroomShipment {
    pub pickup: VroomShipmentStep,
    pub delivery: VroomShipmentStep,
    pub amount: Vec<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Start,
    Job,
    Pickup,
    Delivery,
    Break,
    End,
}

/// One stop of an optimized route. `load` holds the vehicle load per
/// capacity dimension after the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub location: [f64; 2],
    #[serde(default)]
    pub load: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VroomRoute {
    pub vehicle: i32,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VroomResponse {
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub routes: Vec<VroomRoute>,
}

#[derive(Debug, Clone)]
pub struct VroomClient {
    config: VroomConfig,
    locations: RouteLocations,
    client: Client,
}

impl VroomClient {
    pub fn new(config: VroomConfig, locations: RouteLocations) -> Result<Self> {
        let client = http_client(config.timeout_secs).map_err(RoutingError::Client)?;

        Ok(Self {
            config,
            locations,
            client,
        })
    }

    /// Optimizes the run and returns the vehicle routes, at least one.
    pub async fn solve(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<Vec<VroomRoute>> {
        let response = self.optimize_route(cancel, vehicle, clusters).await?;
        if response.routes.is_empty() {
            error!(vehicle_id = vehicle.id, "vroom returned empty routes");
            return Err(RoutingError::EmptyRoutes);
        }

        Ok(response.routes)
    }

    pub async fn optimize_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<VroomResponse> {
        let request = VroomRequest {
            vehicles: vec![self.to_vroom_vehicle(vehicle)?],
            shipments: self.to_vroom_shipments(clusters),
        };

        let response = self.send(cancel, &request).await?;
        debug!(
            vehicle_id = vehicle.id,
            routes = response.routes.len(),
            "route optimized"
        );
        Ok(response)
    }

    pub async fn send(
        &self,
        cancel: &CancellationToken,
        request: &VroomRequest,
    ) -> Result<VroomResponse> {
        let url = endpoint(&self.config.base_url, "");
        let response = post_json(cancel, &self.client, Service::Vroom, &url, request).await?;
        let body: VroomResponse = read_json(cancel, Service::Vroom, response).await?;

        if body.code != VROOM_SUCCESS {
            let message = body.error.unwrap_or_default();
            error!(code = body.code, error = %message, "vroom could not solve the problem");
            return Err(RoutingError::Solver {
                code: body.code,
                message,
            });
        }

        Ok(body)
    }

    pub(crate) fn to_vroom_vehicle(&self, vehicle: &Vehicle) -> Result<VroomVehicle> {
        Ok(VroomVehicle {
            id: vehicle.id,
            description: vehicle.description.clone(),
            profile: vehicle_profile(vehicle.vehicle_type)?.to_string(),
            start: self.locations.start_point.as_lon_lat(),
            end: self.locations.end_point.as_lon_lat(),
            // Capacity is whole water units; the fraction is dropped.
            capacity: vec![vehicle.water_capacity as i32],
        })
    }

    /// One shipment per locatable cluster. Pickup and delivery ids are
    /// `2i` and `2i + 1` over the clusters that have coordinates.
    pub(crate) fn to_vroom_shipments(&self, clusters: &[TreeCluster]) -> Vec<VroomShipment> {
        let watering_point = self.locations.watering_point.as_lon_lat();

        clusters
            .iter()
            .filter_map(|cluster| cluster.coordinates().map(|location| (cluster, location)))
            .zip((0..).step_by(2))
            .map(|((cluster, location), id)| VroomShipment {
                pickup: VroomShipmentStep {
                    id,
                    location: watering_point,
                    description: String::new(),
                },
                delivery: VroomShipmentStep {
                    id: id + 1,
                    location,
                    description: cluster.name.clone(),
                },
                amount: vec![cluster.water_demand()],
            })
            .collect()
    }
}

fn vehicle_profile(vehicle_type: VehicleType) -> Result<&'static str> {
    match vehicle_type {
        VehicleType::Transporter | VehicleType::Trailer => Ok("auto"),
        VehicleType::Unknown => Err(RoutingError::UnknownVehicleType),
    }
}
