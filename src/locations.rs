//! Validation of the configured start, end and watering points.

use crate::config::RoutingConfig;
use crate::entities::{GeoJsonLocation, RouteLocations};
use crate::error::{Result, RoutingError};

/// Turns the raw configured points into [`RouteLocations`].
///
/// Fails on the first point that is not exactly `[longitude, latitude]`.
pub fn convert_locations(cfg: &RoutingConfig) -> Result<RouteLocations> {
    Ok(RouteLocations {
        start_point: validate_location("StartPoint", &cfg.start_point)?,
        end_point: validate_location("EndPoint", &cfg.end_point)?,
        watering_point: validate_location("WateringPoint", &cfg.watering_point)?,
    })
}

fn validate_location(field: &'static str, location: &[f64]) -> Result<GeoJsonLocation> {
    let &[longitude, latitude] = location else {
        return Err(RoutingError::InvalidLocation {
            field,
            len: location.len(),
        });
    };

    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(RoutingError::NonFiniteLocation { field });
    }

    Ok(GeoJsonLocation {
        latitude,
        longitude,
    })
}
