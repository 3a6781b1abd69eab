// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod connector;
pub mod derive;
pub mod direction;
pub mod node;

pub use connector::{Connector, ConnectorId};
pub use derive::{derive_graph, DerivedGraph, DirectionFanOut, ResolvedEdge, ResolvedEdges};
pub use direction::Direction;
pub use node::{Node, NodeId, NodeKind, RegOp};
