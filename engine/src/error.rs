//! Error type shared by the registry, configuration and world layers.

use thiserror::Error;

use crate::physics::BodyId;

/// Errors surfaced by the simulation core.
///
/// Numeric trouble inside a step (coincident bodies, degenerate normals) is
/// never reported here; it is counted in the per-step reports instead.
#[derive(Debug, Error)]
pub enum SimError {
    /// A body description was rejected at registration or live edit.
    #[error("invalid body spec: {0}")]
    InvalidSpec(String),

    /// An operation referenced an id that is not in the registry.
    #[error("body {0} not found")]
    NotFound(BodyId),

    /// A configuration edit was rejected; the previous config stays in effect.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The body is owned by the world and cannot be removed directly.
    #[error("body {0} is protected and cannot be removed")]
    ProtectedBody(BodyId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
