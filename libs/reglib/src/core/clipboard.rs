// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Clipboard payloads: copying a selection out of a machine and pasting
//! one back in with fresh ids.
//!
//! Copied payloads are self-contained machines-without-registers: node ids
//! are remapped to a dense range starting at 0 and positions are rebased
//! to the selection's top-left corner, so a payload pastes cleanly into
//! any machine at any anchor. A connector is copied only when both of its
//! endpoint nodes are part of the selection.

use serde::{Deserialize, Serialize};

use std::collections::HashMap;

use crate::core::error::{MachineError, Result};
use crate::core::graph::{Connector, Node, NodeId};
use crate::core::machine::Machine;

/// Clipboard contents: a marked subset of a machine graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardPayload {
    /// Marker distinguishing machine clipboard data from arbitrary JSON.
    #[serde(rename = "$rm")]
    pub marker: bool,

    pub nodes: Vec<Node>,

    #[serde(default)]
    pub connectors: Vec<Connector>,
}

impl ClipboardPayload {
    /// Parse from a JSON string, rejecting unmarked payloads. Callers
    /// treat a rejection as a paste no-op.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let payload: Self = serde_json::from_str(json).map_err(|e| {
            MachineError::MachineFile(format!("Failed to parse clipboard JSON: {}", e))
        })?;
        if !payload.marker {
            return Err(MachineError::MachineFile(
                "Missing $rm marker, not machine clipboard data".to_string(),
            ));
        }
        Ok(payload)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| MachineError::MachineFile(format!("Failed to serialize clipboard: {}", e)))
    }
}

impl Machine {
    /// Copy the current selection into a payload.
    ///
    /// Selected connectors whose endpoints are not both selected are
    /// dropped; selected ids that resolve to nothing are ignored.
    pub fn copy_selection(&self) -> ClipboardPayload {
        let mut next_id: u32 = 0;
        let mut node_remap: HashMap<NodeId, NodeId> = HashMap::new();
        let mut nodes: Vec<Node> = Vec::new();
        let mut connectors: Vec<Connector> = Vec::new();
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;

        for id in self.selected() {
            if let Some(node) = self.node(id) {
                let new_id = next_id;
                next_id += 1;
                node_remap.insert(id, new_id);
                min_x = min_x.min(node.x);
                min_y = min_y.min(node.y);
                nodes.push(Node {
                    id: new_id,
                    ..node.clone()
                });
            } else if let Some(connector) = self.connector(id) {
                if self.is_selected(connector.n1) && self.is_selected(connector.n2) {
                    let new_id = next_id;
                    next_id += 1;
                    connectors.push(Connector {
                        id: new_id,
                        ..connector.clone()
                    });
                }
            }
        }

        let min_x = min_x.floor();
        let min_y = min_y.floor();
        for node in &mut nodes {
            node.x -= min_x;
            node.y -= min_y;
        }
        for connector in &mut connectors {
            // Both endpoints are selected nodes, so the remap has them.
            connector.n1 = node_remap[&connector.n1];
            connector.n2 = node_remap[&connector.n2];
        }

        ClipboardPayload {
            marker: true,
            nodes,
            connectors,
        }
    }

    /// Paste a payload at an anchor position, remapping every id onto
    /// fresh ones. Connectors referencing nodes missing from the payload
    /// are dropped.
    pub fn paste(&mut self, payload: ClipboardPayload, x: f64, y: f64) {
        let mut node_remap: HashMap<NodeId, NodeId> = HashMap::new();

        for mut node in payload.nodes {
            let new_id = self.allocate_id();
            node_remap.insert(node.id, new_id);
            node.id = new_id;
            node.x += x;
            node.y += y;
            self.insert_node(node);
        }
        for mut connector in payload.connectors {
            let (Some(&n1), Some(&n2)) =
                (node_remap.get(&connector.n1), node_remap.get(&connector.n2))
            else {
                tracing::debug!(
                    connector = connector.id,
                    "Dropping pasted connector with missing endpoint"
                );
                continue;
            };
            connector.id = self.allocate_id();
            connector.n1 = n1;
            connector.n2 = n2;
            self.insert_connector(connector);
        }
    }
}
