//! Routing configuration, passed explicitly at construction.

use serde::Deserialize;

/// Which backend answers route requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingBackend {
    Disabled,
    Streamlet,
    #[default]
    Valhalla,
    Ors,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VroomConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for VroomConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValhallaConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/ors".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamletConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Routing engine streamlet should use internally.
    pub router: String,
    /// Refill depots as `[longitude, latitude]`. The vehicle starts at the first.
    pub depots: Vec<[f64; 2]>,
}

impl Default for StreamletConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            timeout_secs: 30,
            router: "valhalla".to_string(),
            depots: vec![[9.436183, 54.768326], [9.448447, 54.805631]],
        }
    }
}

/// Everything the route pipeline needs to know about its environment.
///
/// Locations are raw `[longitude, latitude]` lists as they come out of a
/// config file; they are validated once when a backend is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub backend: RoutingBackend,
    pub start_point: Vec<f64>,
    pub end_point: Vec<f64>,
    pub watering_point: Vec<f64>,
    pub vroom: VroomConfig,
    pub valhalla: ValhallaConfig,
    pub ors: OrsConfig,
    pub streamlet: StreamletConfig,
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
