//! Crate-wide error type.

use crate::ip::AddressPlanError;
use crate::tables::RoutingConfigError;
use crate::topology::TopologyError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Address plan error: {0}")]
    AddressPlan(#[from] AddressPlanError),

    #[error("Routing configuration error: {0}")]
    Routing(#[from] RoutingConfigError),

    #[error("Unknown topology '{0}': not a built-in scenario or an existing file")]
    UnknownTopology(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
