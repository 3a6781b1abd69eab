// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Machine state and the execution stepper.
//!
//! [`Machine`] owns everything a loaded machine consists of: the node and
//! connector collections, the register file, the execution position, and
//! the derived-graph cache. It is constructed empty, replaced wholesale
//! when a machine file loads, and dropped on unload. There is no ambient
//! global state.
//!
//! Execution advances through [`Machine::step`], one transition per call.
//! The stepper behaves as three effective states without exposing them as
//! an enum: not started (no active node, no snapshot), running (active
//! node set), and halted (active node cleared after having run).

use std::collections::{BTreeMap, BTreeSet};

use crate::core::graph::{
    derive_graph, Connector, ConnectorId, DerivedGraph, Direction, Node, NodeId, NodeKind, RegOp,
    ResolvedEdge,
};
use crate::core::registers::Registers;

/// Default play speed for newly created machines. Speeds run 0..=8; the
/// run loop turns them into delays via `(9 - speed) * 125` ms.
pub const DEFAULT_PLAY_SPEED: u8 = 4;
pub const MAX_PLAY_SPEED: u8 = 8;

/// A loaded register machine: graph, registers, and run state.
#[derive(Debug, Default)]
pub struct Machine {
    name: String,
    nodes: BTreeMap<NodeId, Node>,
    connectors: BTreeMap<ConnectorId, Connector>,
    next_id: u32,

    registers: Registers,

    /// Node and connector ids share one id space, so one set covers both.
    selected: BTreeSet<u32>,
    active_node: Option<NodeId>,
    active_connector: Option<ConnectorId>,

    playing: bool,
    play_speed: u8,

    /// Register contents captured on the first step after a reset,
    /// restored and consumed by the next reset.
    initial_registers: Option<BTreeMap<u32, u64>>,

    /// Derived adjacency/fan-out, invalidated by any structural edit.
    derived: Option<DerivedGraph>,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            play_speed: DEFAULT_PLAY_SPEED,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // =========================================================================
    // Graph editing
    // =========================================================================

    /// Add a node at a grid position, allocating its id.
    pub fn add_node(&mut self, x: f64, y: f64, kind: NodeKind) -> NodeId {
        let id = self.allocate_id();
        self.nodes.insert(id, Node { id, x, y, kind });
        self.invalidate();
        id
    }

    /// Add a connector between two node endpoints, allocating its id.
    pub fn add_connector(
        &mut self,
        n1: NodeId,
        d1: Direction,
        n2: NodeId,
        d2: Direction,
        alt: bool,
    ) -> ConnectorId {
        let id = self.allocate_id();
        self.connectors.insert(
            id,
            Connector {
                id,
                n1,
                d1,
                n2,
                d2,
                alt,
            },
        );
        self.invalidate();
        id
    }

    /// Remove a node and every connector touching it.
    pub fn remove_node(&mut self, id: NodeId) {
        if self.nodes.remove(&id).is_none() {
            return;
        }
        self.connectors
            .retain(|_, connector| connector.n1 != id && connector.n2 != id);
        self.selected.remove(&id);
        self.invalidate();
    }

    pub fn remove_connector(&mut self, id: ConnectorId) {
        if self.connectors.remove(&id).is_some() {
            self.selected.remove(&id);
            self.invalidate();
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// Highest register index named by any register node.
    pub fn max_register_index(&self) -> Option<u32> {
        self.nodes
            .values()
            .filter_map(|node| match node.kind {
                NodeKind::Register { index, .. } => Some(index),
                _ => None,
            })
            .max()
    }

    // =========================================================================
    // Derived graph cache
    // =========================================================================

    /// Current derived adjacency/fan-out, recomputed after structural
    /// edits.
    pub fn derived(&mut self) -> &DerivedGraph {
        self.derived
            .get_or_insert_with(|| derive_graph(&self.nodes, &self.connectors))
    }

    fn invalidate(&mut self) {
        self.derived = None;
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select(&mut self, id: u32) {
        self.selected.insert(id);
    }

    pub fn deselect(&mut self, id: u32) {
        self.selected.remove(&id);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> impl Iterator<Item = u32> + '_ {
        self.selected.iter().copied()
    }

    pub fn is_selected(&self, id: u32) -> bool {
        self.selected.contains(&id)
    }

    // =========================================================================
    // Registers and run state
    // =========================================================================

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    pub fn active_connector(&self) -> Option<ConnectorId> {
        self.active_connector
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn play_speed(&self) -> u8 {
        self.play_speed
    }

    pub fn set_play_speed(&mut self, speed: u8) {
        self.play_speed = speed.min(MAX_PLAY_SPEED);
    }

    // =========================================================================
    // Stepper
    // =========================================================================

    /// Advance execution by one transition.
    ///
    /// Returns `true` when a transition happened and `false` when no legal
    /// transition exists (dead end, HALT, or the active node vanished).
    ///
    /// The first call after a reset captures the register contents as the
    /// snapshot [`reset`](Self::reset) restores.
    ///
    /// Quirk carried over from the machine's original behavior: when no
    /// active node is set and the machine has no START node, the call
    /// reports `true` without changing any state, so an auto-play loop
    /// keeps ticking on a start-less machine instead of stopping.
    pub fn step(&mut self) -> bool {
        if self.initial_registers.is_none() {
            self.initial_registers = Some(self.registers.snapshot());
        }

        self.active_connector = None;
        self.selected.clear();

        let Some(active) = self.active_node else {
            self.active_node = self
                .nodes
                .values()
                .find(|node| node.is_start())
                .map(|node| node.id);
            tracing::debug!(start = ?self.active_node, "Looking for START node");
            return true;
        };

        let Some(node) = self.nodes.get(&active) else {
            // The active node was deleted out from under the run.
            self.active_node = None;
            tracing::debug!(node = active, "Active node no longer exists, halting");
            return false;
        };
        let kind = node.kind.clone();

        let Some(edges) = self.derived().edges(active).copied() else {
            return false;
        };

        match kind {
            NodeKind::Start => match edges.primary {
                Some(edge) => {
                    self.traverse(edge);
                    true
                }
                None => false,
            },
            NodeKind::Register {
                op: RegOp::Inc,
                index,
            } => match edges.primary {
                Some(edge) => {
                    let value = self.registers.get(index);
                    self.registers.set(index, value as i64 + 1);
                    self.traverse(edge);
                    true
                }
                None => false,
            },
            NodeKind::Register {
                op: RegOp::Dec,
                index,
            } => {
                let value = self.registers.get(index);
                if value == 0 {
                    match edges.alt {
                        Some(edge) => {
                            // Zero branch: the register stays untouched.
                            self.traverse(edge);
                            true
                        }
                        None => false,
                    }
                } else {
                    match edges.primary {
                        Some(edge) => {
                            self.registers.set(index, value as i64 - 1);
                            self.traverse(edge);
                            true
                        }
                        None => false,
                    }
                }
            }
            NodeKind::Halt | NodeKind::Comment { .. } => false,
        }
    }

    fn traverse(&mut self, edge: ResolvedEdge) {
        tracing::debug!(via = edge.via, to = edge.node, "Traversing");
        self.active_connector = Some(edge.via);
        self.active_node = Some(edge.node);
    }

    /// Return to the state captured at the first step after the previous
    /// reset: restore register contents from the snapshot (consuming it),
    /// clear the execution position and selection, stop playing.
    ///
    /// Callers driving a run loop must cancel the pending tick before
    /// calling this; see [`Runner::reset`](crate::core::runner::Runner).
    pub fn reset(&mut self) {
        if let Some(initial) = self.initial_registers.take() {
            self.registers.load(&initial);
        }
        self.playing = false;
        self.active_node = None;
        self.active_connector = None;
        self.selected.clear();
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Graphviz DOT dump of the machine graph. Alt connectors are dotted
    /// and labeled, structurally erroneous ones colored.
    pub fn to_graphviz(&mut self) -> String {
        let errors = self.derived().connector_errors.clone();

        let mut dot = String::from("digraph Machine {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=circle];\n\n");

        for node in self.nodes.values() {
            let (label, shape) = match &node.kind {
                NodeKind::Start => ("START".to_string(), "box"),
                NodeKind::Halt => ("HALT".to_string(), "box"),
                NodeKind::Register { op, index } => {
                    (format!("R{}{}", index, op.symbol()), "circle")
                }
                NodeKind::Comment { comment } => (comment.clone(), "note"),
            };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{}\" shape={}];\n",
                node.id,
                label.replace('"', "\\\""),
                shape
            ));
        }

        dot.push('\n');

        for connector in self.connectors.values() {
            let mut attrs: Vec<String> = Vec::new();
            if connector.alt {
                attrs.push("label=\"alt\"".to_string());
                attrs.push("style=dotted".to_string());
            }
            if errors.contains(&connector.id) {
                attrs.push("color=red".to_string());
            }
            let attrs = if attrs.is_empty() {
                String::new()
            } else {
                format!(" [{}]", attrs.join(" "))
            };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\"{};\n",
                connector.n1, connector.n2, attrs
            ));
        }

        dot.push_str("}\n");
        dot
    }

    // =========================================================================
    // Internal
    // =========================================================================

    pub(crate) fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn replace_collections(
        &mut self,
        name: String,
        nodes: BTreeMap<NodeId, Node>,
        connectors: BTreeMap<ConnectorId, Connector>,
        next_id: u32,
    ) {
        self.name = name;
        self.nodes = nodes;
        self.connectors = connectors;
        self.next_id = next_id;
        self.invalidate();
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
        self.invalidate();
    }

    pub(crate) fn insert_connector(&mut self, connector: Connector) {
        self.connectors.insert(connector.id, connector);
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// START → REG(+, 0) → HALT, returning (start, reg, halt) ids.
    fn increment_machine() -> (Machine, NodeId, NodeId, NodeId) {
        let mut machine = Machine::new();
        let start = machine.add_node(0.0, 0.0, NodeKind::Start);
        let reg = machine.add_node(1.0, 0.0, NodeKind::Register {
            op: RegOp::Inc,
            index: 0,
        });
        let halt = machine.add_node(2.0, 0.0, NodeKind::Halt);
        machine.add_connector(start, Direction::East, reg, Direction::West, false);
        machine.add_connector(reg, Direction::East, halt, Direction::West, false);
        (machine, start, reg, halt)
    }

    #[test]
    fn test_increment_walkthrough() {
        let (mut machine, start, reg, halt) = increment_machine();

        // 1st step finds START.
        assert!(machine.step());
        assert_eq!(machine.active_node(), Some(start));
        assert_eq!(machine.active_connector(), None);

        // 2nd step leaves START; no register mutation yet.
        assert!(machine.step());
        assert_eq!(machine.active_node(), Some(reg));
        assert!(machine.active_connector().is_some());
        assert_eq!(machine.registers().get(0), 0);

        // 3rd step executes the increment and lands on HALT.
        assert!(machine.step());
        assert_eq!(machine.active_node(), Some(halt));
        assert_eq!(machine.registers().get(0), 1);

        // HALT has no outgoing edge.
        assert!(!machine.step());
        assert_eq!(machine.active_node(), Some(halt));
    }

    #[test]
    fn test_step_without_start_node_reports_true() {
        let mut machine = Machine::new();
        machine.add_node(0.0, 0.0, NodeKind::Halt);

        // Quirk preserved: "looking for start" counts as an advance even
        // when there is nothing to find.
        assert!(machine.step());
        assert_eq!(machine.active_node(), None);
        assert!(machine.step());
        assert_eq!(machine.active_node(), None);
    }

    #[test]
    fn test_decrement_at_zero_takes_alt_without_touching_register() {
        let mut machine = Machine::new();
        let start = machine.add_node(0.0, 0.0, NodeKind::Start);
        let reg = machine.add_node(1.0, 0.0, NodeKind::Register {
            op: RegOp::Dec,
            index: 0,
        });
        let halt = machine.add_node(2.0, 0.0, NodeKind::Halt);
        machine.add_connector(start, Direction::East, reg, Direction::West, false);
        machine.add_connector(reg, Direction::South, halt, Direction::North, true);

        assert!(machine.step()); // find START
        assert!(machine.step()); // START → REG
        assert_eq!(machine.active_node(), Some(reg));

        assert!(machine.step()); // zero branch
        assert_eq!(machine.active_node(), Some(halt));
        assert_eq!(machine.registers().get(0), 0);
        assert!(machine.registers().is_empty());
    }

    #[test]
    fn test_decrement_consumes_register_through_primary() {
        let mut machine = Machine::new();
        let start = machine.add_node(0.0, 0.0, NodeKind::Start);
        let reg = machine.add_node(1.0, 0.0, NodeKind::Register {
            op: RegOp::Dec,
            index: 0,
        });
        let halt = machine.add_node(2.0, 0.0, NodeKind::Halt);
        machine.add_connector(start, Direction::East, reg, Direction::West, false);
        // Loop back into the register until it runs dry, then bail out.
        machine.add_connector(reg, Direction::North, reg, Direction::NorthEast, false);
        machine.add_connector(reg, Direction::South, halt, Direction::North, true);
        machine.registers_mut().set(0, 2);

        assert!(machine.step()); // find START
        assert!(machine.step()); // START → REG
        assert!(machine.step()); // 2 → 1, loop
        assert_eq!(machine.registers().get(0), 1);
        assert!(machine.step()); // 1 → 0, loop
        assert_eq!(machine.registers().get(0), 0);
        assert!(machine.step()); // zero branch → HALT
        assert_eq!(machine.active_node(), Some(halt));
        assert!(!machine.step());
    }

    #[test]
    fn test_dead_end_on_isolated_node() {
        let mut machine = Machine::new();
        let start = machine.add_node(0.0, 0.0, NodeKind::Start);

        assert!(machine.step());
        assert_eq!(machine.active_node(), Some(start));
        // START with no outgoing connector: no adjacency entry at all.
        assert!(!machine.step());
        assert_eq!(machine.active_node(), Some(start));
    }

    #[test]
    fn test_deleting_active_node_halts() {
        let (mut machine, start, _, _) = increment_machine();
        assert!(machine.step());
        assert_eq!(machine.active_node(), Some(start));

        machine.remove_node(start);
        assert!(!machine.step());
        assert_eq!(machine.active_node(), None);
    }

    #[test]
    fn test_reset_restores_snapshot_and_is_idempotent() {
        let (mut machine, _, _, _) = increment_machine();
        machine.registers_mut().set(0, 7);
        machine.registers_mut().set(3, 1);

        for _ in 0..3 {
            assert!(machine.step());
        }
        assert_eq!(machine.registers().get(0), 8);

        machine.reset();
        assert_eq!(machine.registers().get(0), 7);
        assert_eq!(machine.registers().get(3), 1);
        assert_eq!(machine.active_node(), None);
        assert_eq!(machine.active_connector(), None);
        assert!(!machine.is_playing());

        // Snapshot was consumed; a second reset leaves contents alone.
        machine.registers_mut().set(0, 100);
        machine.reset();
        assert_eq!(machine.registers().get(0), 100);
    }

    #[test]
    fn test_step_clears_selection_and_active_connector() {
        let (mut machine, start, _, _) = increment_machine();
        machine.select(start);

        assert!(machine.step());
        assert_eq!(machine.selected().count(), 0);

        assert!(machine.step());
        let via = machine.active_connector();
        assert!(via.is_some());

        machine.select(start);
        assert!(machine.step());
        // Cleared at the top of the step, then set to the new connector.
        assert_ne!(machine.active_connector(), via);
        assert_eq!(machine.selected().count(), 0);
    }

    #[test]
    fn test_structural_edit_invalidates_derivation() {
        let (mut machine, start, reg, _) = increment_machine();
        assert!(machine.derived().edges(start).is_some());

        let extra = machine.add_node(3.0, 3.0, NodeKind::Halt);
        machine.add_connector(reg, Direction::South, extra, Direction::North, false);

        // Second claim on reg's primary slot shows up after the edit.
        assert_eq!(machine.derived().connector_errors.len(), 1);
    }

    #[test]
    fn test_max_register_index() {
        let mut machine = Machine::new();
        assert_eq!(machine.max_register_index(), None);
        machine.add_node(0.0, 0.0, NodeKind::Register {
            op: RegOp::Inc,
            index: 2,
        });
        machine.add_node(1.0, 0.0, NodeKind::Register {
            op: RegOp::Dec,
            index: 5,
        });
        assert_eq!(machine.max_register_index(), Some(5));
    }

    #[test]
    fn test_play_speed_is_clamped() {
        let mut machine = Machine::new();
        assert_eq!(machine.play_speed(), DEFAULT_PLAY_SPEED);
        machine.set_play_speed(200);
        assert_eq!(machine.play_speed(), MAX_PLAY_SPEED);
    }

    #[test]
    fn test_to_graphviz_contains_nodes_and_edges() {
        let (mut machine, start, reg, halt) = increment_machine();
        let dot = machine.to_graphviz();

        assert!(dot.contains("digraph Machine"));
        assert!(dot.contains(&format!("\"{}\" [label=\"START\"", start)));
        assert!(dot.contains(&format!("\"{}\" [label=\"R0+\"", reg)));
        assert!(dot.contains(&format!("\"{}\" -> \"{}\"", reg, halt)));
    }
}
