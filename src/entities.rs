//! Domain entities handed to the route pipeline and the formats it produces.

use std::time::Duration;

use geo::{LineString, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoutingError};

/// Water units a single tree needs per watering run.
pub const TREE_WATER_DEMAND: i32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Transporter,
    Trailer,
    #[default]
    Unknown,
}

/// A watering vehicle. Read-only to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i32,
    pub description: String,
    pub water_capacity: f64,
    pub vehicle_type: VehicleType,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: i32,
}

/// A group of trees watered in one stop.
///
/// Clusters without both coordinates cannot be routed to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeCluster {
    pub id: i32,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub trees: Vec<Tree>,
}

impl TreeCluster {
    /// Returns `[longitude, latitude]` if both are known.
    pub fn coordinates(&self) -> Option<[f64; 2]> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => Some([lon, lat]),
            _ => None,
        }
    }

    pub fn water_demand(&self) -> i32 {
        i32::try_from(self.trees.len())
            .unwrap_or(i32::MAX)
            .saturating_mul(TREE_WATER_DEMAND)
    }
}

/// Engine-reported seconds as a duration; invalid values become zero.
pub(crate) fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}

pub(crate) fn cluster_ids(clusters: &[TreeCluster]) -> Vec<i32> {
    clusters.iter().map(|cluster| cluster.id).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoJsonLocation {
    pub fn as_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// The three configured stops of every watering route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteLocations {
    pub start_point: GeoJsonLocation,
    pub end_point: GeoJsonLocation,
    pub watering_point: GeoJsonLocation,
}

/// Foreign member of a route collection that carries its [`RouteLocations`].
pub const LOCATIONS_MEMBER: &str = "metadata";

/// Builds a route collection with one `LineString` feature per leg.
///
/// `bbox` is written as `[min_lon, min_lat, max_lon, max_lat]`.
pub fn route_collection(lines: &[LineString<f64>], bbox: Option<Rect<f64>>) -> FeatureCollection {
    let features = lines
        .iter()
        .map(|line| Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(line))),
            id: None,
            properties: None,
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: bbox.map(|rect| vec![rect.min().x, rect.min().y, rect.max().x, rect.max().y]),
        features,
        foreign_members: None,
    }
}

/// Replaces the collection's foreign members with the route locations.
pub fn attach_locations(
    mut collection: FeatureCollection,
    locations: &RouteLocations,
) -> Result<FeatureCollection> {
    let value = serde_json::to_value(locations).map_err(RoutingError::Encode)?;
    let mut members = JsonObject::new();
    members.insert(LOCATIONS_MEMBER.to_string(), value);
    collection.foreign_members = Some(members);
    Ok(collection)
}

/// Reads back the locations stored by [`attach_locations`].
pub fn route_locations(collection: &FeatureCollection) -> Option<RouteLocations> {
    let value = collection.foreign_members.as_ref()?.get(LOCATIONS_MEMBER)?;
    RouteLocations::deserialize(value).ok()
}

/// Summary of a generated route.
///
/// `distance` is in the engine's native unit (kilometers for Valhalla,
/// meters for openrouteservice).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteMetadata {
    pub distance: f64,
    pub time: Duration,
    pub refills: usize,
    pub locations: RouteLocations,
}
