// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Commonly used types for `use reglib::prelude::*`.

pub use crate::core::{
    // Errors
    error::{MachineError, Result},

    // Graph
    graph::{Connector, ConnectorId, Direction, Node, NodeId, NodeKind, RegOp},

    // Machine and execution
    machine::Machine,
    machine_file::MachineFileDefinition,
    registers::Registers,
    runner::Runner,
};
