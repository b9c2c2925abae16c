//! openrouteservice backend: VROOM decides the order, ORS draws the road.

use async_trait::async_trait;
use geojson::FeatureCollection;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{OrsConfig, RoutingConfig, endpoint, http_client};
use crate::entities::{
    RouteLocations, RouteMetadata, TreeCluster, Vehicle, VehicleType, attach_locations,
    cluster_ids, seconds,
};
use crate::error::{Result, RoutingError, Service};
use crate::gpx::GpxStream;
use crate::http::{post_json, read_json};
use crate::locations::convert_locations;
use crate::steps::{reduce_steps, refill_count, step_locations};
use crate::traits::RoutingRepository;
use crate::vroom::{RouteStep, VroomClient};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrsDirectionRequest {
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub language: String,
}

/// ORS leaves out totals that are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    /// In the requested units.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub summary: Summary,
}

/// `routes` must be present; an explicitly empty list means no trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrsResponse {
    pub routes: Vec<Route>,
}

/// Thin client for the ORS directions API.
#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self> {
        let client = http_client(config.timeout_secs).map_err(RoutingError::Client)?;
        Ok(Self { config, client })
    }

    pub async fn directions_json(
        &self,
        cancel: &CancellationToken,
        profile: &str,
        request: &OrsDirectionRequest,
    ) -> Result<OrsResponse> {
        let response = self.directions(cancel, profile, "json", request).await?;
        read_json(cancel, Service::OpenRouteService, response).await
    }

    pub async fn directions_geojson(
        &self,
        cancel: &CancellationToken,
        profile: &str,
        request: &OrsDirectionRequest,
    ) -> Result<FeatureCollection> {
        let response = self.directions(cancel, profile, "geojson", request).await?;
        read_json(cancel, Service::OpenRouteService, response).await
    }

    /// The caller owns the returned stream and with it the connection.
    pub async fn directions_raw_gpx(
        &self,
        cancel: &CancellationToken,
        profile: &str,
        request: &OrsDirectionRequest,
    ) -> Result<GpxStream> {
        let response = self.directions(cancel, profile, "gpx", request).await?;
        Ok(GpxStream::from_response(Service::OpenRouteService, response))
    }

    async fn directions(
        &self,
        cancel: &CancellationToken,
        profile: &str,
        format: &str,
        request: &OrsDirectionRequest,
    ) -> Result<reqwest::Response> {
        let url = endpoint(
            &self.config.base_url,
            &format!("v2/directions/{profile}/{format}"),
        );
        post_json(cancel, &self.client, Service::OpenRouteService, &url, request).await
    }
}

fn ors_profile(vehicle_type: VehicleType) -> Result<&'static str> {
    match vehicle_type {
        VehicleType::Transporter | VehicleType::Trailer => Ok("driving-car"),
        VehicleType::Unknown => Err(RoutingError::UnknownVehicleType),
    }
}

/// Route repository backed by VROOM and openrouteservice.
#[derive(Debug, Clone)]
pub struct OrsRouteRepo {
    vroom: VroomClient,
    ors: OrsClient,
    locations: RouteLocations,
}

impl OrsRouteRepo {
    pub fn new(cfg: &RoutingConfig) -> Result<Self> {
        let locations = convert_locations(cfg)?;

        Ok(Self {
            vroom: VroomClient::new(cfg.vroom.clone(), locations)?,
            ors: OrsClient::new(cfg.ors.clone())?,
            locations,
        })
    }

    /// Optimizes the run and builds the ORS request for its stops.
    ///
    /// Returns the ORS profile and the reduced optimizer steps as well.
    pub(crate) async fn prepare_ors_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<(&'static str, Vec<RouteStep>, OrsDirectionRequest)> {
        let profile = ors_profile(vehicle.vehicle_type)?;

        let routes = self.vroom.solve(cancel, vehicle, clusters).await?;
        let steps = routes
            .into_iter()
            .next()
            .map(|route| reduce_steps(&route.steps))
            .unwrap_or_default();

        let request = OrsDirectionRequest {
            coordinates: step_locations(&steps),
            units: "m".to_string(),
            language: "de-de".to_string(),
        };

        Ok((profile, steps, request))
    }
}

#[async_trait]
impl RoutingRepository for OrsRouteRepo {
    async fn generate_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<FeatureCollection> {
        let (profile, _, request) = self.prepare_ors_route(cancel, vehicle, clusters).await?;

        let geojson = self
            .ors
            .directions_geojson(cancel, profile, &request)
            .await
            .inspect_err(|err| {
                error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                    "failed to fetch route from openrouteservice");
            })?;

        debug!(vehicle_id = vehicle.id, "route generated");
        // ORS metadata describes the query; only the route locations are kept.
        attach_locations(geojson, &self.locations)
    }

    async fn generate_raw_gpx_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<GpxStream> {
        let (profile, _, request) = self.prepare_ors_route(cancel, vehicle, clusters).await?;

        self.ors
            .directions_raw_gpx(cancel, profile, &request)
            .await
            .inspect_err(|err| {
                error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                    "failed to fetch gpx route from openrouteservice");
            })
    }

    async fn generate_route_information(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<RouteMetadata> {
        let (profile, steps, request) = self.prepare_ors_route(cancel, vehicle, clusters).await?;

        let response = self
            .ors
            .directions_json(cancel, profile, &request)
            .await
            .inspect_err(|err| {
                error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                    "failed to fetch route information from openrouteservice");
            })?;

        // ORS may answer without a route; report an empty trip then.
        let summary = response
            .routes
            .first()
            .map(|route| route.summary)
            .unwrap_or_default();

        Ok(RouteMetadata {
            distance: summary.distance,
            time: seconds(summary.duration),
            refills: refill_count(&steps),
            locations: self.locations,
        })
    }
}
