//! Collapsing optimizer steps into physical stops.
//!
//! VROOM models every shipment's pickup separately, so a vehicle loading
//! water for several clusters shows up as a run of pickups at the same
//! watering point. Operationally that run is one stop and one refill.

use crate::vroom::{RouteStep, StepType};

/// Merges each run of consecutive pickups into its last element's load.
///
/// The result never holds two adjacent pickups.
pub fn reduce_steps(steps: &[RouteStep]) -> Vec<RouteStep> {
    steps.iter().fold(Vec::with_capacity(steps.len()), |mut acc, step| {
        match acc.last_mut() {
            Some(last)
                if last.step_type == StepType::Pickup && step.step_type == StepType::Pickup =>
            {
                last.load.clone_from(&step.load);
            }
            _ => acc.push(step.clone()),
        }
        acc
    })
}

/// Number of pickup stops. On reduced steps this is the number of refills.
pub fn refill_count(steps: &[RouteStep]) -> usize {
    steps
        .iter()
        .filter(|step| step.step_type == StepType::Pickup)
        .count()
}

/// Ordered `[longitude, latitude]` of every stop.
pub fn step_locations(steps: &[RouteStep]) -> Vec<[f64; 2]> {
    steps.iter().map(|step| step.location).collect()
}
