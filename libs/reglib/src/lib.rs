// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Register-machine construction and simulation engine.
//!
//! A machine is a directed graph of nodes (START, HALT, register
//! increment/decrement, comment) joined by directional connectors.
//! [`core::graph::derive_graph`] resolves the unordered collections into
//! per-node successor edges and per-endpoint visual fan-out;
//! [`core::machine::Machine::step`] advances execution one transition at a
//! time; [`core::runner::Runner`] drives stepping on a cancellable timer.
//!
//! ```no_run
//! use reglib::prelude::*;
//!
//! let mut machine = Machine::new();
//! let start = machine.add_node(0.0, 0.0, NodeKind::Start);
//! let reg = machine.add_node(1.0, 0.0, NodeKind::Register { op: RegOp::Inc, index: 0 });
//! let halt = machine.add_node(2.0, 0.0, NodeKind::Halt);
//! machine.add_connector(start, Direction::East, reg, Direction::West, false);
//! machine.add_connector(reg, Direction::East, halt, Direction::West, false);
//!
//! while machine.step() {}
//! assert_eq!(machine.registers().get(0), 1);
//! ```

pub mod core;

pub use core::prelude;

pub use core::{
    derive_graph,
    ClipboardPayload,
    Connector,
    ConnectorId,
    DerivedGraph,
    Direction,
    DirectionFanOut,
    Machine,
    MachineError,
    MachineFileDefinition,
    Node,
    NodeId,
    NodeKind,
    RegOp,
    Registers,
    ResolvedEdge,
    ResolvedEdges,
    Result,
    Runner,
};
