pub mod app_config;
pub mod config;
pub mod geo;
pub mod search;
pub mod seed;
pub mod stores;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{bounding_box, great_circle_distance_miles, BoundingBox};
pub use search::{locate, parse_radius, SearchArea, DEFAULT_RADIUS_MILES};
pub use stores::{
    normalize_address, IndexedStore, RecordError, Store, StoreCount, StoreWithDistance,
    ZipCoordinate,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
