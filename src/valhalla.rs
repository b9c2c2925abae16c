//! Valhalla backend: VROOM decides the order, Valhalla draws the road.

use std::collections::HashMap;

use async_trait::async_trait;
use geo::{LineString, Rect, coord};
use geojson::FeatureCollection;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{RoutingConfig, ValhallaConfig, endpoint, http_client};
use crate::entities::{
    RouteLocations, RouteMetadata, TreeCluster, Vehicle, VehicleType, attach_locations,
    cluster_ids, route_collection, seconds,
};
use crate::error::{Result, RoutingError, Service};
use crate::gpx::GpxStream;
use crate::http::{post_json, read_json};
use crate::locations::convert_locations;
use crate::polyline::Polyline;
use crate::steps::{reduce_steps, refill_count, step_locations};
use crate::traits::RoutingRepository;
use crate::vroom::{RouteStep, VroomClient};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Vehicle dimensions Valhalla avoids unsuitable roads with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostingOptions {
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionRequest {
    pub locations: Vec<Location>,
    pub costing: String,
    #[serde(default)]
    pub costing_options: HashMap<String, CostingOptions>,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Serialize)]
struct FormattedRequest<'a> {
    #[serde(flatten)]
    request: &'a DirectionRequest,
    format: &'static str,
}

/// Trip extent and totals. Every field is required; a body without
/// them is an upstream error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
    /// Kilometers.
    pub length: f64,
    /// Seconds.
    pub time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegResponse {
    /// Polyline6 encoded leg geometry.
    pub shape: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripResponse {
    pub summary: SummaryResponse,
    pub legs: Vec<LegResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionResponse {
    pub trip: TripResponse,
}

/// Thin client for Valhalla's `/route` endpoint.
#[derive(Debug, Clone)]
pub struct ValhallaClient {
    config: ValhallaConfig,
    client: Client,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> Result<Self> {
        let client = http_client(config.timeout_secs).map_err(RoutingError::Client)?;
        Ok(Self { config, client })
    }

    pub async fn directions_json(
        &self,
        cancel: &CancellationToken,
        request: &DirectionRequest,
    ) -> Result<DirectionResponse> {
        let response = self.route(cancel, request, "json").await?;
        read_json(cancel, Service::Valhalla, response).await
    }

    pub async fn directions_geojson(
        &self,
        cancel: &CancellationToken,
        request: &DirectionRequest,
    ) -> Result<FeatureCollection> {
        let response = self.directions_json(cancel, request).await?;
        Ok(to_geojson(&response))
    }

    /// The caller owns the returned stream and with it the connection.
    pub async fn directions_raw_gpx(
        &self,
        cancel: &CancellationToken,
        request: &DirectionRequest,
    ) -> Result<GpxStream> {
        let response = self.route(cancel, request, "gpx").await?;
        Ok(GpxStream::from_response(Service::Valhalla, response))
    }

    async fn route(
        &self,
        cancel: &CancellationToken,
        request: &DirectionRequest,
        format: &'static str,
    ) -> Result<reqwest::Response> {
        let url = endpoint(&self.config.base_url, "route");
        let body = FormattedRequest { request, format };
        post_json(cancel, &self.client, Service::Valhalla, &url, &body).await
    }
}

/// One line string per leg; bbox comes from the trip summary.
pub fn to_geojson(response: &DirectionResponse) -> FeatureCollection {
    let summary = &response.trip.summary;
    let bbox = Rect::new(
        coord! { x: summary.min_lon, y: summary.min_lat },
        coord! { x: summary.max_lon, y: summary.max_lat },
    );

    let lines: Vec<LineString<f64>> = response
        .trip
        .legs
        .iter()
        .map(|leg| LineString::from(Polyline::decode(&leg.shape).into_points()))
        .collect();

    route_collection(&lines, Some(bbox))
}

fn costing(vehicle_type: VehicleType) -> Result<&'static str> {
    match vehicle_type {
        VehicleType::Transporter | VehicleType::Trailer => Ok("truck"),
        VehicleType::Unknown => Err(RoutingError::UnknownVehicleType),
    }
}

/// Route repository backed by VROOM and Valhalla.
#[derive(Debug, Clone)]
pub struct ValhallaRouteRepo {
    vroom: VroomClient,
    valhalla: ValhallaClient,
    locations: RouteLocations,
}

impl ValhallaRouteRepo {
    pub fn new(cfg: &RoutingConfig) -> Result<Self> {
        let locations = convert_locations(cfg)?;

        Ok(Self {
            vroom: VroomClient::new(cfg.vroom.clone(), locations)?,
            valhalla: ValhallaClient::new(cfg.valhalla.clone())?,
            locations,
        })
    }

    /// Optimizes the run and builds the Valhalla request for its stops.
    ///
    /// Returns the reduced optimizer steps alongside the request.
    pub(crate) async fn prepare_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<(Vec<RouteStep>, DirectionRequest)> {
        let profile = costing(vehicle.vehicle_type)?;

        let routes = self.vroom.solve(cancel, vehicle, clusters).await?;
        let steps = routes
            .into_iter()
            .next()
            .map(|route| reduce_steps(&route.steps))
            .unwrap_or_default();

        let locations = step_locations(&steps)
            .into_iter()
            .map(|[lon, lat]| Location { lat, lon })
            .collect();

        let options = CostingOptions {
            height: vehicle.height,
            width: vehicle.width,
            length: vehicle.length,
            weight: vehicle.weight,
        };

        let request = DirectionRequest {
            locations,
            costing: profile.to_string(),
            costing_options: HashMap::from([(profile.to_string(), options)]),
            units: "kilometers".to_string(),
            language: "de-DE".to_string(),
        };

        Ok((steps, request))
    }
}

#[async_trait]
impl RoutingRepository for ValhallaRouteRepo {
    async fn generate_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<FeatureCollection> {
        let (_, request) = self.prepare_route(cancel, vehicle, clusters).await?;

        let geojson = self
            .valhalla
            .directions_geojson(cancel, &request)
            .await
            .inspect_err(|err| {
                error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                    "failed to fetch route from valhalla");
            })?;

        debug!(vehicle_id = vehicle.id, legs = geojson.features.len(), "route generated");
        attach_locations(geojson, &self.locations)
    }

    async fn generate_raw_gpx_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<GpxStream> {
        let (_, request) = self.prepare_route(cancel, vehicle, clusters).await?;

        self.valhalla
            .directions_raw_gpx(cancel, &request)
            .await
            .inspect_err(|err| {
                error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                    "failed to fetch gpx route from valhalla");
            })
    }

    async fn generate_route_information(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<RouteMetadata> {
        let (steps, request) = self.prepare_route(cancel, vehicle, clusters).await?;

        let response = self
            .valhalla
            .directions_json(cancel, &request)
            .await
            .inspect_err(|err| {
                error!(error = %err, vehicle_id = vehicle.id, cluster_ids = ?cluster_ids(clusters),
                    "failed to fetch route information from valhalla");
            })?;

        let summary = response.trip.summary;
        Ok(RouteMetadata {
            distance: summary.length,
            time: seconds(summary.time),
            refills: refill_count(&steps),
            locations: self.locations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> SummaryResponse {
        SummaryResponse {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
            ..Default::default()
        }
    }

    fn leg(shape: &str) -> LegResponse {
        LegResponse {
            shape: shape.to_string(),
        }
    }

    fn response(summary: SummaryResponse, legs: Vec<LegResponse>) -> DirectionResponse {
        DirectionResponse {
            trip: TripResponse { summary, legs },
        }
    }

    fn line(collection: &FeatureCollection, index: usize) -> Option<&geojson::Value> {
        collection.features[index]
            .geometry
            .as_ref()
            .map(|geometry| &geometry.value)
    }

    #[test]
    fn single_leg_becomes_one_line_string() {
        let resp = response(summary(48.0, 9.0, 48.1, 9.1), vec![leg("__upzA_cidP_ibE_ibE")]);

        let geojson = to_geojson(&resp);

        assert_eq!(geojson.features.len(), 1);
        assert_eq!(
            line(&geojson, 0),
            Some(&geojson::Value::LineString(vec![vec![9.0, 48.0], vec![9.1, 48.1]]))
        );
    }

    #[test]
    fn each_leg_becomes_a_feature() {
        let resp = response(
            summary(48.0, 9.0, 48.2, 9.2),
            vec![leg("__upzA_cidP_ibE_ibE"), leg("__upzA_cidP_ibE_ibE")],
        );

        assert_eq!(to_geojson(&resp).features.len(), 2);
    }

    #[test]
    fn bbox_is_min_lon_min_lat_max_lon_max_lat() {
        let resp = response(summary(48.0, 9.0, 48.5, 9.5), vec![]);

        let geojson = to_geojson(&resp);

        assert_eq!(geojson.bbox, Some(vec![9.0, 48.0, 9.5, 48.5]));
    }

    #[test]
    fn no_legs_no_features() {
        let resp = response(SummaryResponse::default(), vec![]);
        assert!(to_geojson(&resp).features.is_empty());
    }

    #[test]
    fn trip_without_summary_is_rejected() {
        let parsed = serde_json::from_value::<DirectionResponse>(serde_json::json!({
            "trip": { "legs": [] }
        }));
        assert!(parsed.is_err());

        let parsed = serde_json::from_value::<DirectionResponse>(serde_json::json!({
            "unexpected": "shape"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn summary_requires_extent_and_totals() {
        let parsed = serde_json::from_value::<SummaryResponse>(serde_json::json!({
            "min_lat": 48.0, "min_lon": 9.0, "max_lat": 48.1, "max_lon": 9.1, "length": 1.5
        }));

        assert!(parsed.is_err());
    }

    #[test]
    fn maps_vehicle_types_to_truck_costing() {
        assert_eq!(costing(VehicleType::Transporter).unwrap(), "truck");
        assert_eq!(costing(VehicleType::Trailer).unwrap(), "truck");
        assert!(matches!(
            costing(VehicleType::Unknown),
            Err(RoutingError::UnknownVehicleType)
        ));
    }

    #[test]
    fn request_carries_format_next_to_fields() {
        let request = DirectionRequest {
            locations: vec![Location { lat: 48.0, lon: 9.0 }],
            costing: "truck".to_string(),
            ..Default::default()
        };

        let value = serde_json::to_value(FormattedRequest {
            request: &request,
            format: "gpx",
        })
        .unwrap();

        assert_eq!(value["format"], "gpx");
        assert_eq!(value["costing"], "truck");
        assert_eq!(value["locations"][0]["lon"], 9.0);
    }
}
