//! Logical route identifiers.
//!
//! Middleware reasons about endpoints, never raw paths: the gate's allow-list
//! and the limiter's per-route quotas are both keyed by [`Endpoint`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A logical route of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Endpoint {
    /// The verification page.
    Robot,
    /// The verification action.
    VerifyRobot,
    /// The landing page.
    Index,
    /// The JSON query endpoint.
    ApiData,
    /// Static asset serving.
    Static,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Robot,
        Endpoint::VerifyRobot,
        Endpoint::Index,
        Endpoint::ApiData,
        Endpoint::Static,
    ];

    /// Name used in configuration files, logs and metric labels.
    pub const fn name(self) -> &'static str {
        match self {
            Endpoint::Robot => "robot",
            Endpoint::VerifyRobot => "verify_robot",
            Endpoint::Index => "index",
            Endpoint::ApiData => "api_data",
            Endpoint::Static => "static",
        }
    }

    /// URL path the endpoint is mounted at. For `Static` this is the mount
    /// prefix.
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Robot => "/robot",
            Endpoint::VerifyRobot => "/verify_robot",
            Endpoint::Index => "/",
            Endpoint::ApiData => "/api/data",
            Endpoint::Static => "/static",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown endpoint `{0}`")]
pub struct UnknownEndpoint(String);

impl FromStr for Endpoint {
    type Err = UnknownEndpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == s)
            .ok_or_else(|| UnknownEndpoint(s.to_string()))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = UnknownEndpoint;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for &'static str {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.name()
    }
}
