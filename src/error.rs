//! Errors produced by the route pipeline.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// External services the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Vroom,
    Valhalla,
    OpenRouteService,
    Streamlet,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Vroom => "vroom",
            Service::Valhalla => "valhalla",
            Service::OpenRouteService => "openrouteservice",
            Service::Streamlet => "streamlet",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RoutingError {
    /// A configured location is not a `[longitude, latitude]` pair.
    #[error("invalid {field}: location must have exactly two elements, got {len}")]
    InvalidLocation { field: &'static str, len: usize },
    #[error("invalid {field}: coordinates must be finite numbers")]
    NonFiniteLocation { field: &'static str },
    #[error("no depots configured for the streamlet backend")]
    NoDepots,
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("unknown vehicle type")]
    UnknownVehicleType,
    #[error("tree cluster {cluster_id} has no coordinates")]
    MissingCoordinates { cluster_id: i32 },

    #[error("{}request to {service} failed: {source}", optimizer_prefix(.service))]
    Transport {
        service: Service,
        source: reqwest::Error,
    },
    /// `body` holds the start of the upstream error body.
    #[error("{}{service} response not successful: {status}: {body}", optimizer_prefix(.service))]
    Status {
        service: Service,
        status: StatusCode,
        body: String,
    },
    #[error("{}invalid {service} response body: {source}", optimizer_prefix(.service))]
    Decode {
        service: Service,
        source: reqwest::Error,
    },
    /// VROOM answered with a non-zero result code.
    #[error("failed to optimize route: solver returned code {code}: {message}")]
    Solver { code: i32, message: String },
    #[error("failed to optimize route: empty routes")]
    EmptyRoutes,

    #[error("{operation} is not supported by the {service} backend")]
    Unsupported {
        service: Service,
        operation: &'static str,
    },
    #[error("failed to encode route locations: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("routing service is disabled")]
    ServiceDisabled,
    #[error("route generation was cancelled")]
    Cancelled,
}

fn optimizer_prefix(service: &Service) -> &'static str {
    match service {
        Service::Vroom => "failed to optimize route: ",
        _ => "",
    }
}

pub type Result<T, E = RoutingError> = std::result::Result<T, E>;
