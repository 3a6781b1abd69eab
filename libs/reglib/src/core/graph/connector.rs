// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::node::NodeId;

/// Identifier for a connector. Shares the id space with [`NodeId`].
pub type ConnectorId = u32;

/// Structural edge between two node endpoints, each anchored at a compass
/// direction.
///
/// Execution treats a connector as directed from `n1` to `n2`; both
/// endpoints participate equally in visual fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: ConnectorId,
    /// Source node.
    pub n1: NodeId,
    /// Exit direction at `n1`.
    pub d1: Direction,
    /// Target node.
    pub n2: NodeId,
    /// Exit direction at `n2`.
    pub d2: Direction,
    /// Zero-branch marker. Only meaningful when `n1` is a decrement
    /// register node; derivation flags it as an error everywhere else.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub alt: bool,
}
