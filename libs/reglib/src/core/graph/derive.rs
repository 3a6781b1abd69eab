// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Graph derivation: turn the unordered node/connector collections into
//! per-node resolved successor edges and per-endpoint visual fan-out.
//!
//! Derivation is a pure function of the two collections. It never fails:
//! structural problems (a second claimant for an already-resolved slot, an
//! `alt` connector leaving a node that cannot branch on zero) land in an
//! advisory error set and the offending connector is ignored for adjacency
//! purposes only; it still occupies a fan-out slot so the rendering
//! collaborator can draw it where the user put it.
//!
//! Connectors are visited in ascending id order, so the lowest-id claimant
//! wins a contested slot.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::connector::{Connector, ConnectorId};
use super::direction::Direction;
use super::node::{Node, NodeId, NodeKind, RegOp};

/// Resolved outgoing transition: the connector traversed and the node it
/// lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEdge {
    pub via: ConnectorId,
    pub node: NodeId,
}

/// Outgoing edges resolved for one node.
///
/// At most one connector ever occupies `primary` and at most one occupies
/// `alt`; additional claimants are reported in
/// [`DerivedGraph::connector_errors`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedEdges {
    /// Default outgoing transition.
    pub primary: Option<ResolvedEdge>,
    /// Zero branch, taken by a decrement register whose register already
    /// reads 0.
    pub alt: Option<ResolvedEdge>,
}

/// Connector fan-out through one direction of one node: how many
/// connectors leave through the direction and each connector's stable
/// zero-based ordinal among them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionFanOut {
    pub count: usize,
    pub indices: HashMap<ConnectorId, usize>,
}

impl DirectionFanOut {
    /// Perpendicular offset of a connector endpoint from the direction
    /// anchor, in connector-spacing units: `-((count - 1) / 2) + ordinal`.
    /// Endpoints spread symmetrically around the anchor; renderers multiply
    /// this by their spacing vector.
    pub fn offset(&self, connector: ConnectorId) -> Option<f64> {
        let index = *self.indices.get(&connector)?;
        Some(-((self.count as f64 - 1.0) / 2.0) + index as f64)
    }
}

/// Output of [`derive_graph`].
#[derive(Debug, Clone, Default)]
pub struct DerivedGraph {
    /// Per node, per direction: fan-out counts and connector ordinals.
    /// Nodes with no connectors have no entry.
    pub node_connectors: HashMap<NodeId, HashMap<Direction, DirectionFanOut>>,
    /// Per node: resolved `primary`/`alt` successors. Only nodes that are
    /// the source (`n1`) of at least one connector have an entry.
    pub node_connected_nodes: HashMap<NodeId, ResolvedEdges>,
    /// Connectors that lost a slot claim or carried `alt` on an ineligible
    /// source. Advisory: stepping through unaffected edges is unimpeded.
    pub connector_errors: HashSet<ConnectorId>,
}

impl DerivedGraph {
    /// Resolved successors of `node`, if it is the source of any connector.
    pub fn edges(&self, node: NodeId) -> Option<&ResolvedEdges> {
        self.node_connected_nodes.get(&node)
    }

    /// Fan-out through `direction` at `node`.
    pub fn fan_out(&self, node: NodeId, direction: Direction) -> Option<&DirectionFanOut> {
        self.node_connectors.get(&node)?.get(&direction)
    }
}

/// Derive adjacency and fan-out from the current collections.
///
/// Pure function; callers must treat the result as invalidated whenever
/// either collection changes.
pub fn derive_graph(
    nodes: &BTreeMap<NodeId, Node>,
    connectors: &BTreeMap<ConnectorId, Connector>,
) -> DerivedGraph {
    let mut derived = DerivedGraph::default();

    for connector in connectors.values() {
        register_fan_out(
            &mut derived.node_connectors,
            connector.id,
            connector.n1,
            connector.d1,
            connector.n2,
            connector.d2,
            false,
        );
        register_fan_out(
            &mut derived.node_connectors,
            connector.id,
            connector.n2,
            connector.d2,
            connector.n1,
            connector.d1,
            true,
        );
        claim_edge(
            nodes,
            &mut derived.node_connected_nodes,
            &mut derived.connector_errors,
            connector,
        );
    }

    if !derived.connector_errors.is_empty() {
        tracing::debug!(
            errors = derived.connector_errors.len(),
            "Graph derivation flagged connectors"
        );
    }

    derived
}

fn register_fan_out(
    fan_out: &mut HashMap<NodeId, HashMap<Direction, DirectionFanOut>>,
    connector: ConnectorId,
    node: NodeId,
    direction: Direction,
    other_node: NodeId,
    other_direction: Direction,
    second_visit: bool,
) {
    let slot = fan_out.entry(node).or_default().entry(direction).or_default();
    slot.indices.insert(connector, slot.count);
    // A same-direction self-loop occupies a single fan-out slot: its first
    // visit records the ordinal without advancing the count, so both
    // endpoints share one ordinal.
    if node != other_node || direction != other_direction || second_visit {
        slot.count += 1;
    }
}

fn claim_edge(
    nodes: &BTreeMap<NodeId, Node>,
    resolved: &mut HashMap<NodeId, ResolvedEdges>,
    errors: &mut HashSet<ConnectorId>,
    connector: &Connector,
) {
    let edges = resolved.entry(connector.n1).or_default();
    let edge = ResolvedEdge {
        via: connector.id,
        node: connector.n2,
    };

    if connector.alt {
        let eligible = matches!(
            nodes.get(&connector.n1).map(|node| &node.kind),
            Some(NodeKind::Register { op: RegOp::Dec, .. })
        );
        if eligible && edges.alt.is_none() {
            edges.alt = Some(edge);
        } else {
            errors.insert(connector.id);
        }
    } else if edges.primary.is_none() {
        edges.primary = Some(edge);
    } else {
        errors.insert(connector.id);
    }
}
