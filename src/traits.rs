//! The interface every routing backend implements.

use async_trait::async_trait;
use geojson::FeatureCollection;
use tokio_util::sync::CancellationToken;

use crate::entities::{RouteMetadata, TreeCluster, Vehicle};
use crate::error::Result;
use crate::gpx::GpxStream;

/// Turns a vehicle and the clusters it should water into a route.
///
/// Implementations are chosen once from configuration (see
/// [`crate::repository::new_routing_repository`]). Every call is
/// independent; `cancel` aborts the outbound requests of that call.
#[async_trait]
pub trait RoutingRepository: Send + Sync {
    /// Road geometry of the route, with the configured locations attached.
    async fn generate_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<FeatureCollection>;

    /// The route as a GPX track, streamed from the engine unmodified.
    async fn generate_raw_gpx_route(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<GpxStream>;

    /// Distance, duration and refill count of the route.
    async fn generate_route_information(
        &self,
        cancel: &CancellationToken,
        vehicle: &Vehicle,
        clusters: &[TreeCluster],
    ) -> Result<RouteMetadata>;
}
