// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

/// Identifier for a node. Nodes and connectors draw ids from the same
/// per-machine counter, so an id is unique across both collections.
pub type NodeId = u32;

/// Register operation performed by a [`NodeKind::Register`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegOp {
    #[serde(rename = "+")]
    Inc,
    #[serde(rename = "-")]
    Dec,
}

impl RegOp {
    pub fn symbol(self) -> char {
        match self {
            RegOp::Inc => '+',
            RegOp::Dec => '-',
        }
    }
}

/// Node contents, tagged the way machine files store them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Entry point. Exactly one is expected per machine; the stepper takes
    /// the first one it finds.
    #[serde(rename = "START")]
    Start,

    /// Terminal vertex with no outgoing edges.
    #[serde(rename = "HALT")]
    Halt,

    /// Register-manipulating vertex.
    #[serde(rename = "REG")]
    Register { op: RegOp, index: u32 },

    /// Inert annotation. Never participates in execution.
    #[serde(rename = "CMT")]
    Comment { comment: String },
}

/// Node in the machine graph.
///
/// Grid position is carried for the rendering collaborator and is opaque
/// to derivation and stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn is_start(&self) -> bool {
        matches!(self.kind, NodeKind::Start)
    }
}
