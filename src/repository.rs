//! Picks the routing backend once, from configuration.

use tracing::{error, info};

use crate::config::{RoutingBackend, RoutingConfig};
use crate::disabled::DisabledRoutingRepo;
use crate::error::Result;
use crate::locations::convert_locations;
use crate::ors::OrsRouteRepo;
use crate::streamlet::StreamletClient;
use crate::traits::RoutingRepository;
use crate::valhalla::ValhallaRouteRepo;

/// Builds the configured backend.
///
/// Locations are validated even when routing is disabled, so a broken
/// config fails at startup rather than when routing is switched on.
pub fn new_routing_repository(cfg: &RoutingConfig) -> Result<Box<dyn RoutingRepository>> {
    convert_locations(cfg).inspect_err(|err| {
        error!(error = %err, "invalid routing locations");
    })?;

    let repo: Box<dyn RoutingRepository> = match cfg.backend {
        RoutingBackend::Disabled => Box::new(DisabledRoutingRepo::new()),
        RoutingBackend::Streamlet => Box::new(StreamletClient::new(cfg)?),
        RoutingBackend::Valhalla => Box::new(ValhallaRouteRepo::new(cfg)?),
        RoutingBackend::Ors => Box::new(OrsRouteRepo::new(cfg)?),
    };

    info!(backend = ?cfg.backend, "initialized routing repository");
    Ok(repo)
}
