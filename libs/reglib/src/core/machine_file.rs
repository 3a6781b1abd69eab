// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Machine file format: the JSON shape machines are saved to and loaded
//! from.
//!
//! A machine file carries a `$rm` marker field so the loader can tell a
//! machine apart from arbitrary JSON that happens to parse. Files missing
//! the marker, or failing to parse, are rejected with an error the caller
//! is expected to turn into a no-op; a bad file never tears down a loaded
//! machine.
//!
//! # Example Machine File
//!
//! ```json
//! {
//!   "$rm": true,
//!   "name": "Adder",
//!   "nodes": [
//!     { "id": 0, "x": 0, "y": 0, "type": "START" },
//!     { "id": 1, "x": 1, "y": 0, "type": "REG", "op": "+", "index": 0 },
//!     { "id": 2, "x": 2, "y": 0, "type": "HALT" }
//!   ],
//!   "connectors": [
//!     { "id": 3, "n1": 0, "d1": 3, "n2": 1, "d2": 7 },
//!     { "id": 4, "n1": 1, "d1": 3, "n2": 2, "d2": 7 }
//!   ],
//!   "registers": { "0": 2 }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{MachineError, Result};
use crate::core::graph::{Connector, Node};
use crate::core::machine::Machine;

/// Serialized machine: name, graph, and register contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineFileDefinition {
    /// Marker distinguishing machine files from arbitrary JSON.
    #[serde(rename = "$rm")]
    pub marker: bool,

    #[serde(default)]
    pub name: String,

    pub nodes: Vec<Node>,

    #[serde(default)]
    pub connectors: Vec<Connector>,

    /// Register contents at save time. Zero values are tolerated on input
    /// and dropped on load.
    #[serde(default)]
    pub registers: BTreeMap<u32, u64>,
}

impl MachineFileDefinition {
    /// Parse from a JSON string, rejecting unmarked payloads.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let definition: Self = serde_json::from_str(json)
            .map_err(|e| MachineError::MachineFile(format!("Failed to parse machine JSON: {}", e)))?;
        if !definition.marker {
            return Err(MachineError::MachineFile(
                "Missing $rm marker, not a machine file".to_string(),
            ));
        }
        Ok(definition)
    }

    /// Load from a JSON file path.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MachineError::MachineFile(format!(
                "Failed to open machine file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| MachineError::MachineFile(format!("Failed to serialize machine: {}", e)))
    }

    /// Validate the definition without loading it: unique ids across nodes
    /// and connectors, and connector endpoints that exist.
    pub fn validate(&self) -> Result<()> {
        use std::collections::HashSet;

        let mut ids: HashSet<u32> = HashSet::new();
        let mut node_ids: HashSet<u32> = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(MachineError::GraphError(format!(
                    "Duplicate id: {}",
                    node.id
                )));
            }
            node_ids.insert(node.id);
        }
        for connector in &self.connectors {
            if !ids.insert(connector.id) {
                return Err(MachineError::GraphError(format!(
                    "Duplicate id: {}",
                    connector.id
                )));
            }
            for endpoint in [connector.n1, connector.n2] {
                if !node_ids.contains(&endpoint) {
                    return Err(MachineError::GraphError(format!(
                        "Connector {} references unknown node {}",
                        connector.id, endpoint
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Machine {
    /// Replace this machine wholesale with a loaded definition.
    ///
    /// Clears the execution position, selection, and reset snapshot, then
    /// installs the definition's graph and registers. The id counter
    /// resumes past the highest id seen.
    pub fn load_definition(&mut self, definition: MachineFileDefinition) {
        self.reset();

        let mut max_id: Option<u32> = None;
        let mut nodes = BTreeMap::new();
        for node in definition.nodes {
            max_id = Some(max_id.map_or(node.id, |m| m.max(node.id)));
            nodes.insert(node.id, node);
        }
        let mut connectors = BTreeMap::new();
        for connector in definition.connectors {
            max_id = Some(max_id.map_or(connector.id, |m| m.max(connector.id)));
            connectors.insert(connector.id, connector);
        }

        let next_id = max_id.map_or(0, |m| m + 1);
        tracing::info!(
            name = %definition.name,
            nodes = nodes.len(),
            connectors = connectors.len(),
            "Loading machine"
        );
        self.replace_collections(definition.name, nodes, connectors, next_id);
        self.registers_mut().load(&definition.registers);
    }

    /// Snapshot this machine as a definition ready to serialize.
    pub fn save_definition(&self) -> MachineFileDefinition {
        MachineFileDefinition {
            marker: true,
            name: self.name().to_string(),
            nodes: self.nodes().cloned().collect(),
            connectors: self.connectors().cloned().collect(),
            registers: self.registers().snapshot(),
        }
    }
}
