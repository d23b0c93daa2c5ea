//! Reachability entries: how to get to a networking node.
//!
//! An entry either names a transport we can dispatch on directly (a
//! WebSocket connection we open, or one a peer opened to our server), or a
//! hub node that forwards on the destination's behalf. The two cases are a
//! sum type, so an entry always has exactly one target.
//!
//! ## JSON
//!
//! ```text
//! { "webSocketClient": "wss://csms.example/ocpp",      // or
//!   "webSocketServer": "0.0.0.0:9000",                 // or
//!   "networkingHub":   "hub-eu-1",
//!   "uplink": "standard", "downlink": "overlayNetwork", // optional
//!   "priority": 0, "weight": 1,
//!   "timestamp": "2026-01-01T00:00:00Z", "timeout": "..." }
//! ```

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::routing::RoutingError;
use crate::config::{DEFAULT_PRIORITY, DEFAULT_WEIGHT};

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Opaque identifier of a networking node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Transport / path
// ---------------------------------------------------------------------------

/// A direct link to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// We connect out to `remote_url`.
    WebSocketClient { remote_url: Url },
    /// The node connects in to our server on `local_socket`.
    WebSocketServer { local_socket: SocketAddr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReachabilityPath {
    Direct(Transport),
    /// Reach the destination through another node.
    Hub(NodeId),
}

/// Framing used on a link direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkingMode {
    Standard,
    OverlayNetwork,
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

/// One way of reaching `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    pub destination: NodeId,
    pub path: ReachabilityPath,
    pub uplink: Option<NetworkingMode>,
    pub downlink: Option<NetworkingMode>,
    /// Lower is preferred.
    pub priority: u8,
    /// Relative share within a priority group.
    pub weight: u8,
    /// When the entry was created.
    pub timestamp: DateTime<Utc>,
    /// The entry is stale from this instant on.
    pub timeout: Option<DateTime<Utc>>,
}

impl Reachability {
    pub fn new(destination: impl Into<NodeId>, path: ReachabilityPath) -> Self {
        Self {
            destination: destination.into(),
            path,
            uplink: None,
            downlink: None,
            priority: DEFAULT_PRIORITY,
            weight: DEFAULT_WEIGHT,
            timestamp: Utc::now(),
            timeout: None,
        }
    }

    pub fn from_websocket_client(destination: impl Into<NodeId>, remote_url: Url) -> Self {
        Self::new(
            destination,
            ReachabilityPath::Direct(Transport::WebSocketClient { remote_url }),
        )
    }

    pub fn from_websocket_server(destination: impl Into<NodeId>, local_socket: SocketAddr) -> Self {
        Self::new(
            destination,
            ReachabilityPath::Direct(Transport::WebSocketServer { local_socket }),
        )
    }

    pub fn from_networking_hub(destination: impl Into<NodeId>, hub: impl Into<NodeId>) -> Self {
        Self::new(destination, ReachabilityPath::Hub(hub.into()))
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: u8) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_timeout(mut self, timeout: DateTime<Utc>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_uplink(mut self, mode: NetworkingMode) -> Self {
        self.uplink = Some(mode);
        self
    }

    pub fn with_downlink(mut self, mode: NetworkingMode) -> Self {
        self.downlink = Some(mode);
        self
    }

    /// The hub this entry forwards through, if any.
    pub fn hub(&self) -> Option<&NodeId> {
        match &self.path {
            ReachabilityPath::Hub(hub) => Some(hub),
            ReachabilityPath::Direct(_) => None,
        }
    }

    pub fn transport(&self) -> Option<&Transport> {
        match &self.path {
            ReachabilityPath::Direct(transport) => Some(transport),
            ReachabilityPath::Hub(_) => None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.timeout.map(|t| t <= now).unwrap_or(false)
    }

    /// Entry JSON, without the destination (the routing dump keys on it).
    pub fn to_json(&self) -> Value {
        serde_json::to_value(ReachabilityJson::from(self)).unwrap_or(Value::Null)
    }

    /// Parses entry JSON for `destination`.
    pub fn from_json(destination: impl Into<NodeId>, value: &Value) -> Result<Self, RoutingError> {
        let wire: ReachabilityJson = serde_json::from_value(value.clone())
            .map_err(|e| RoutingError::InvalidEntry(e.to_string()))?;
        wire.into_entry(destination.into())
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            ReachabilityPath::Direct(Transport::WebSocketClient { remote_url }) => {
                write!(f, "{} via ws-client {}", self.destination, remote_url)?
            }
            ReachabilityPath::Direct(Transport::WebSocketServer { local_socket }) => {
                write!(f, "{} via ws-server {}", self.destination, local_socket)?
            }
            ReachabilityPath::Hub(hub) => write!(f, "{} via hub {}", self.destination, hub)?,
        }
        write!(f, " (priority {}, weight {})", self.priority, self.weight)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

fn default_weight() -> u8 {
    DEFAULT_WEIGHT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReachabilityJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    web_socket_client: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    web_socket_server: Option<SocketAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    networking_hub: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uplink: Option<NetworkingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    downlink: Option<NetworkingMode>,
    #[serde(default = "default_priority")]
    priority: u8,
    #[serde(default = "default_weight")]
    weight: u8,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout: Option<DateTime<Utc>>,
}

impl ReachabilityJson {
    pub(crate) fn into_entry(self, destination: NodeId) -> Result<Reachability, RoutingError> {
        let path = match (self.web_socket_client, self.web_socket_server, self.networking_hub) {
            (Some(remote_url), None, None) => {
                ReachabilityPath::Direct(Transport::WebSocketClient { remote_url })
            }
            (None, Some(local_socket), None) => {
                ReachabilityPath::Direct(Transport::WebSocketServer { local_socket })
            }
            (None, None, Some(hub)) => ReachabilityPath::Hub(hub),
            (None, None, None) => {
                return Err(RoutingError::InvalidEntry(format!(
                    "entry for {destination} has no webSocketClient, webSocketServer or networkingHub"
                )))
            }
            _ => {
                return Err(RoutingError::InvalidEntry(format!(
                    "entry for {destination} names more than one target"
                )))
            }
        };

        Ok(Reachability {
            destination,
            path,
            uplink: self.uplink,
            downlink: self.downlink,
            priority: self.priority,
            weight: self.weight,
            timestamp: self.timestamp,
            timeout: self.timeout,
        })
    }
}

impl From<&Reachability> for ReachabilityJson {
    fn from(entry: &Reachability) -> Self {
        let (client, server, hub) = match &entry.path {
            ReachabilityPath::Direct(Transport::WebSocketClient { remote_url }) => {
                (Some(remote_url.clone()), None, None)
            }
            ReachabilityPath::Direct(Transport::WebSocketServer { local_socket }) => {
                (None, Some(*local_socket), None)
            }
            ReachabilityPath::Hub(hub) => (None, None, Some(hub.clone())),
        };
        ReachabilityJson {
            web_socket_client: client,
            web_socket_server: server,
            networking_hub: hub,
            uplink: entry.uplink,
            downlink: entry.downlink,
            priority: entry.priority,
            weight: entry.weight,
            timestamp: entry.timestamp,
            timeout: entry.timeout,
        }
    }
}

/// A static route as written in configuration: the entry plus its
/// destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RouteJson {
    destination: NodeId,
    #[serde(flatten)]
    entry: ReachabilityJson,
}

impl Serialize for Reachability {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RouteJson {
            destination: self.destination.clone(),
            entry: ReachabilityJson::from(self),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Reachability {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let route = RouteJson::deserialize(deserializer)?;
        route
            .entry
            .into_entry(route.destination)
            .map_err(serde::de::Error::custom)
    }
}
