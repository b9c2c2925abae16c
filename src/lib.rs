//! watering-routes
//!
//! Route generation for a tree-watering fleet: VROOM orders the stops,
//! a routing engine turns them into road geometry, GPX and route metadata.

pub mod config;
pub mod disabled;
pub mod entities;
pub mod error;
pub mod gpx;
mod http;
pub mod locations;
pub mod ors;
pub mod polyline;
pub mod repository;
pub mod steps;
pub mod streamlet;
pub mod traits;
pub mod valhalla;
pub mod vroom;

pub use error::{Result, RoutingError, Service};
pub use repository::new_routing_repository;
pub use traits::RoutingRepository;
