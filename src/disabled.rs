//! Backend used when routing is switched off.

use async_trait::async_trait;
use geojson::FeatureCollection;
use tokio_util::sync::CancellationToken;

use crate::entities::{RouteMetadata, TreeCluster, Vehicle};
use crate::error::{Result, RoutingError};
use crate::gpx::GpxStream;
use crate::traits::RoutingRepository;

/// Fails every operation with [`RoutingError::ServiceDisabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRoutingRepo;

impl DisabledRoutingRepo {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RoutingRepository for DisabledRoutingRepo {
    async fn generate_route(
        &self,
        _cancel: &CancellationToken,
        _vehicle: &Vehicle,
        _clusters: &[TreeCluster],
    ) -> Result<FeatureCollection> {
        Err(RoutingError::ServiceDisabled)
    }

    async fn generate_raw_gpx_route(
        &self,
        _cancel: &CancellationToken,
        _vehicle: &Vehicle,
        _clusters: &[TreeCluster],
    ) -> Result<GpxStream> {
        Err(RoutingError::ServiceDisabled)
    }

    async fn generate_route_information(
        &self,
        _cancel: &CancellationToken,
        _vehicle: &Vehicle,
        _clusters: &[TreeCluster],
    ) -> Result<RouteMetadata> {
        Err(RoutingError::ServiceDisabled)
    }
}
