//! Static routing table for the overlay network.
//!
//! Maps each destination node to the list of ways we know to reach it, and
//! picks one per outbound dispatch.
//!
//! ## Selection
//!
//! 1. Only the group with the lowest `priority` value is considered.
//! 2. Within the group, one entry is drawn with probability proportional to
//!    its `weight`.
//! 3. A hub entry is followed to the hub's own entries, repeating until a
//!    direct transport is found. A hub that was already visited, or that has
//!    no entries, ends the walk with the last entry found.
//!
//! ## Concurrency
//!
//! - `DashMap` shards the destinations; writers on different destinations
//!   never contend.
//! - Each destination holds an immutable `Arc<[Reachability]>`. Updates
//!   build a new list and swap it in under the entry lock, so a reader
//!   holding a snapshot never sees a half-applied change.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::reachability::{NodeId, Reachability, ReachabilityJson, ReachabilityPath, Transport};

// ---------------------------------------------------------------------------
// RoutingError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no route to {0}")]
    RouteNotFound(NodeId),

    #[error("invalid reachability entry: {0}")]
    InvalidEntry(String),
}

// ---------------------------------------------------------------------------
// RoutingTable
// ---------------------------------------------------------------------------

/// Concurrent destination → reachability registry.
pub struct RoutingTable {
    routes: DashMap<NodeId, Arc<[Reachability]>>,
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("destinations", &self.routes.len())
            .finish()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
        }
    }

    /// Adds `entry`, replacing any entry for the same destination with the
    /// same priority.
    pub fn add_or_update_static_routing(&self, entry: Reachability) {
        debug!(route = %entry, "adding static route");
        let priority = entry.priority;
        match self.routes.entry(entry.destination.clone()) {
            Entry::Occupied(mut occupied) => {
                let next: Vec<Reachability> = occupied
                    .get()
                    .iter()
                    .filter(|existing| existing.priority != priority)
                    .cloned()
                    .chain(std::iter::once(entry))
                    .collect();
                occupied.insert(next.into());
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::from(vec![entry]));
            }
        }
    }

    /// Replaces every entry for `destination` with `entries` in one swap.
    ///
    /// This is the only way to register several entries at the same
    /// priority (a weighted group); [`add_or_update_static_routing`] keeps at
    /// most one per priority. Entries for other destinations are rejected.
    /// An empty list removes the destination.
    ///
    /// [`add_or_update_static_routing`]: Self::add_or_update_static_routing
    pub fn set_static_routing(
        &self,
        destination: &NodeId,
        entries: Vec<Reachability>,
    ) -> Result<(), RoutingError> {
        if let Some(stray) = entries.iter().find(|e| &e.destination != destination) {
            return Err(RoutingError::InvalidEntry(format!(
                "entry for {} cannot be registered under {destination}",
                stray.destination
            )));
        }
        debug!(%destination, count = entries.len(), "replacing static routes");
        if entries.is_empty() {
            self.routes.remove(destination);
        } else {
            self.routes.insert(destination.clone(), entries.into());
        }
        Ok(())
    }

    /// Adds a direct route over `transport`.
    pub fn add_or_update_transport(
        &self,
        destination: impl Into<NodeId>,
        transport: Transport,
        priority: u8,
        weight: u8,
    ) {
        let entry = Reachability::new(destination, ReachabilityPath::Direct(transport))
            .with_priority(priority)
            .with_weight(weight);
        self.add_or_update_static_routing(entry);
    }

    /// Adds a route to `destination` through `hub`.
    pub fn add_or_update_hub(
        &self,
        destination: impl Into<NodeId>,
        hub: impl Into<NodeId>,
        priority: u8,
        weight: u8,
    ) {
        let entry = Reachability::from_networking_hub(destination, hub)
            .with_priority(priority)
            .with_weight(weight);
        self.add_or_update_static_routing(entry);
    }

    /// Resolves `destination` using the thread-local RNG.
    pub fn lookup_networking_node(
        &self,
        destination: &NodeId,
    ) -> Result<Reachability, RoutingError> {
        self.lookup_with_rng(destination, &mut rand::thread_rng())
    }

    /// Resolves `destination`, drawing weighted choices from `rng`.
    pub fn lookup_with_rng<R: Rng>(
        &self,
        destination: &NodeId,
        rng: &mut R,
    ) -> Result<Reachability, RoutingError> {
        let mut current = self
            .select(destination, rng)
            .ok_or_else(|| RoutingError::RouteNotFound(destination.clone()))?;

        let mut visited = HashSet::new();
        visited.insert(destination.clone());

        loop {
            let hub = match current.hub() {
                None => {
                    debug!(route = %current, "resolved route");
                    return Ok(current);
                }
                Some(hub) => hub.clone(),
            };

            if !visited.insert(hub.clone()) {
                warn!(%destination, %hub, "routing loop detected, returning last entry");
                return Ok(current);
            }

            match self.select(&hub, rng) {
                Some(next) => current = next,
                None => {
                    warn!(%destination, %hub, "hub has no routes, returning last entry");
                    return Ok(current);
                }
            }
        }
    }

    /// Removes routes to `destination`.
    ///
    /// Without `hub` every entry goes. With `hub`, only entries through that
    /// hub (and with `priority`, when given) are removed. A destination left
    /// with no entries is dropped. Returns the number of entries removed.
    pub fn remove_static_routing(
        &self,
        destination: &NodeId,
        hub: Option<&NodeId>,
        priority: Option<u8>,
    ) -> usize {
        let Some(hub) = hub else {
            let removed = self
                .routes
                .remove(destination)
                .map(|(_, list)| list.len())
                .unwrap_or(0);
            debug!(%destination, removed, "removed all static routes");
            return removed;
        };

        let mut removed = 0;
        if let Entry::Occupied(mut occupied) = self.routes.entry(destination.clone()) {
            let keep: Vec<Reachability> = occupied
                .get()
                .iter()
                .filter(|e| {
                    let through_hub = e.hub() == Some(hub);
                    let at_priority = priority.is_none() || priority == Some(e.priority);
                    !(through_hub && at_priority)
                })
                .cloned()
                .collect();
            removed = occupied.get().len() - keep.len();

            if keep.is_empty() {
                occupied.remove();
            } else if removed > 0 {
                occupied.insert(keep.into());
            }
        }
        debug!(%destination, %hub, removed, "removed hub routes");
        removed
    }

    /// Drops entries whose timeout is at or before `now`. Returns the number
    /// of entries removed.
    ///
    /// Intended to be called periodically by the embedding service.
    pub fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.routes.retain(|_, list| {
            if list.iter().any(|e| e.is_expired(now)) {
                let keep: Vec<Reachability> =
                    list.iter().filter(|e| !e.is_expired(now)).cloned().collect();
                removed += list.len() - keep.len();
                *list = keep.into();
            }
            !list.is_empty()
        });
        if removed > 0 {
            debug!(removed, "expired static routes");
        }
        removed
    }

    /// Current snapshot for `destination`.
    pub fn snapshot(&self, destination: &NodeId) -> Option<Arc<[Reachability]>> {
        self.routes.get(destination).map(|r| Arc::clone(r.value()))
    }

    pub fn entries(&self, destination: &NodeId) -> Vec<Reachability> {
        self.snapshot(destination)
            .map(|list| list.to_vec())
            .unwrap_or_default()
    }

    /// Known destinations, sorted.
    pub fn destinations(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.routes.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of destinations.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dumps the table as `[[destination, [entry, ...]], ...]`, sorted by
    /// destination.
    pub fn to_json(&self) -> Value {
        let dump = self
            .destinations()
            .into_iter()
            .filter_map(|id| {
                let list = self.snapshot(&id)?;
                let entries: Vec<Value> = list.iter().map(Reachability::to_json).collect();
                Some(Value::Array(vec![
                    Value::String(id.to_string()),
                    Value::Array(entries),
                ]))
            })
            .collect();
        Value::Array(dump)
    }

    /// Rebuilds a table from a [`to_json`](Self::to_json) dump.
    pub fn from_json(value: &Value) -> Result<Self, RoutingError> {
        let rows: Vec<(NodeId, Vec<ReachabilityJson>)> = serde_json::from_value(value.clone())
            .map_err(|e| RoutingError::InvalidEntry(e.to_string()))?;

        let table = Self::new();
        for (destination, entries) in rows {
            let list = entries
                .into_iter()
                .map(|wire| wire.into_entry(destination.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            table.set_static_routing(&destination, list)?;
        }
        Ok(table)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// One entry from the lowest-priority group of `destination`.
    fn select<R: Rng>(&self, destination: &NodeId, rng: &mut R) -> Option<Reachability> {
        // Clone the Arc so the shard lock is released before drawing.
        let list = self.snapshot(destination)?;
        let best = list.iter().map(|e| e.priority).min()?;
        let group: Vec<&Reachability> = list.iter().filter(|e| e.priority == best).collect();
        pick_weighted(&group, rng).cloned()
    }
}

/// Weighted draw over `group`. A group whose weights sum to zero yields its
/// first entry.
fn pick_weighted<'a, R: Rng>(
    group: &[&'a Reachability],
    rng: &mut R,
) -> Option<&'a Reachability> {
    match group {
        [] => None,
        [only] => Some(*only),
        _ => {
            let total: u32 = group.iter().map(|e| u32::from(e.weight)).sum();
            if total == 0 {
                return group.first().copied();
            }
            let mut remainder = i64::from(rng.gen_range(0..total));
            for entry in group {
                remainder -= i64::from(entry.weight);
                if remainder < 0 {
                    return Some(*entry);
                }
            }
            group.last().copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use url::Url;

    fn client(dest: &str, url: &str) -> Reachability {
        Reachability::from_websocket_client(dest, Url::parse(url).unwrap())
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn empty_lookup_is_not_found() {
        let table = RoutingTable::new();
        assert_eq!(
            table.lookup_networking_node(&id("x")).unwrap_err(),
            RoutingError::RouteNotFound(id("x"))
        );
    }

    #[test]
    fn lowest_priority_wins() {
        let table = RoutingTable::new();
        table.add_or_update_static_routing(client("a", "ws://one").with_priority(5));
        table.add_or_update_static_routing(client("a", "ws://two").with_priority(1));
        table.add_or_update_static_routing(client("a", "ws://three").with_priority(9));

        for _ in 0..50 {
            let found = table.lookup_networking_node(&id("a")).unwrap();
            assert_eq!(found.priority, 1);
        }
    }

    #[test]
    fn same_priority_replaces() {
        let table = RoutingTable::new();
        table.add_or_update_static_routing(client("a", "ws://old").with_priority(3));
        table.add_or_update_static_routing(client("a", "ws://other").with_priority(4));
        table.add_or_update_static_routing(client("a", "ws://new").with_priority(3));

        let entries = table.entries(&id("a"));
        assert_eq!(entries.len(), 2);
        let at_three: Vec<_> = entries.iter().filter(|e| e.priority == 3).collect();
        assert_eq!(at_three.len(), 1);
        assert_eq!(
            at_three[0].transport(),
            Some(&Transport::WebSocketClient {
                remote_url: Url::parse("ws://new").unwrap()
            })
        );
    }

    #[test]
    fn zero_total_weight_picks_first() {
        let a = client("d", "ws://a").with_weight(0);
        let b = client("d", "ws://b").with_weight(0);
        let group = vec![&a, &b];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_weighted(&group, &mut rng), Some(&a));
    }

    #[test]
    fn weighted_pick_respects_bounds() {
        let a = client("d", "ws://a").with_weight(1);
        let b = client("d", "ws://b").with_weight(0);
        let group = vec![&a, &b];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(pick_weighted(&group, &mut rng), Some(&a));
        }
    }

    #[test]
    fn hub_chain_is_followed() {
        let table = RoutingTable::new();
        table.add_or_update_hub("cs-1", "hub-a", 0, 1);
        table.add_or_update_hub("hub-a", "hub-b", 0, 1);
        table.add_or_update_static_routing(client("hub-b", "wss://hub-b.example"));

        let found = table.lookup_networking_node(&id("cs-1")).unwrap();
        assert_eq!(found.destination, id("hub-b"));
        assert!(found.transport().is_some());
    }

    #[test]
    fn hub_loop_terminates() {
        let table = RoutingTable::new();
        table.add_or_update_hub("a", "b", 0, 1);
        table.add_or_update_hub("b", "a", 0, 1);

        let found = table.lookup_networking_node(&id("a")).unwrap();
        // a -> b, b -> a is a revisit: the b entry is returned.
        assert_eq!(found.destination, id("b"));
        assert_eq!(found.hub(), Some(&id("a")));
    }

    #[test]
    fn self_loop_terminates() {
        let table = RoutingTable::new();
        table.add_or_update_hub("a", "a", 0, 1);
        let found = table.lookup_networking_node(&id("a")).unwrap();
        assert_eq!(found.hub(), Some(&id("a")));
    }

    #[test]
    fn dangling_hub_returns_last_entry() {
        let table = RoutingTable::new();
        table.add_or_update_hub("cs-1", "nowhere", 0, 1);
        let found = table.lookup_networking_node(&id("cs-1")).unwrap();
        assert_eq!(found.hub(), Some(&id("nowhere")));
    }

    #[test]
    fn remove_without_hub_clears_destination() {
        let table = RoutingTable::new();
        table.add_or_update_static_routing(client("a", "ws://one").with_priority(0));
        table.add_or_update_hub("a", "h", 1, 1);
        assert_eq!(table.remove_static_routing(&id("a"), None, None), 2);
        assert!(table.is_empty());
        assert_eq!(table.remove_static_routing(&id("a"), None, None), 0);
    }

    #[test]
    fn remove_with_hub_is_scoped() {
        let table = RoutingTable::new();
        table.add_or_update_static_routing(client("a", "ws://one").with_priority(0));
        table.add_or_update_hub("a", "h1", 1, 1);
        table.add_or_update_hub("a", "h2", 2, 1);
        table.add_or_update_hub("a", "h1", 3, 1);

        // Wrong priority: nothing.
        assert_eq!(
            table.remove_static_routing(&id("a"), Some(&id("h1")), Some(2)),
            0
        );
        // Priority-scoped.
        assert_eq!(
            table.remove_static_routing(&id("a"), Some(&id("h1")), Some(1)),
            1
        );
        assert_eq!(table.entries(&id("a")).len(), 3);
        // Every remaining h1 entry.
        assert_eq!(
            table.remove_static_routing(&id("a"), Some(&id("h1")), None),
            1
        );
        let left = table.entries(&id("a"));
        assert_eq!(left.len(), 2);
        assert!(left.iter().all(|e| e.hub() != Some(&id("h1"))));
    }

    #[test]
    fn removing_last_hub_entry_drops_destination() {
        let table = RoutingTable::new();
        table.add_or_update_hub("a", "h1", 0, 1);
        assert_eq!(
            table.remove_static_routing(&id("a"), Some(&id("h1")), None),
            1
        );
        assert!(table.destinations().is_empty());
    }

    #[test]
    fn expired_entries_swept() {
        let now = Utc::now();
        let table = RoutingTable::new();
        let past = now - chrono::Duration::seconds(1);
        table.add_or_update_static_routing(
            client("a", "ws://stale")
                .with_priority(0)
                .with_timeout(past),
        );
        table.add_or_update_static_routing(client("a", "ws://fresh").with_priority(1));
        table.add_or_update_static_routing(client("b", "ws://stale").with_timeout(past));

        assert_eq!(table.remove_expired(now), 2);
        assert_eq!(table.destinations(), vec![id("a")]);
        assert_eq!(table.lookup_networking_node(&id("a")).unwrap().priority, 1);
    }

    #[test]
    fn snapshot_is_stable_across_updates() {
        let table = RoutingTable::new();
        table.add_or_update_static_routing(client("a", "ws://one").with_priority(0));
        let before = table.snapshot(&id("a")).unwrap();
        table.add_or_update_static_routing(client("a", "ws://two").with_priority(1));
        assert_eq!(before.len(), 1);
        assert_eq!(table.snapshot(&id("a")).unwrap().len(), 2);
    }

    #[test]
    fn set_replaces_whole_list() {
        let table = RoutingTable::new();
        table.add_or_update_static_routing(client("a", "ws://old").with_priority(0));
        table
            .set_static_routing(
                &id("a"),
                vec![
                    client("a", "ws://x").with_weight(2),
                    client("a", "ws://y").with_weight(2),
                ],
            )
            .unwrap();
        assert_eq!(table.entries(&id("a")).len(), 2);

        table.set_static_routing(&id("a"), Vec::new()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn set_rejects_foreign_entries() {
        let table = RoutingTable::new();
        let err = table
            .set_static_routing(&id("a"), vec![client("b", "ws://x")])
            .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidEntry(_)));
        assert!(table.is_empty());
    }

    #[test]
    fn json_dump_roundtrip() {
        let table = RoutingTable::new();
        table.add_or_update_static_routing(client("b", "wss://b.example").with_priority(1));
        table.add_or_update_hub("a", "b", 0, 3);

        let dump = table.to_json();
        let rows = dump.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "a");
        assert_eq!(rows[0][1][0]["networkingHub"], "b");
        assert_eq!(rows[1][1][0]["webSocketClient"], "wss://b.example/");

        let back = RoutingTable::from_json(&dump).unwrap();
        assert_eq!(back.entries(&id("a")), table.entries(&id("a")));
        assert_eq!(back.entries(&id("b")), table.entries(&id("b")));
    }
}
