//! Error types for graph operations.

use thiserror::Error;

use crate::endpoint::EndpointKind;
use crate::node::NodeId;
use tonada_engine::EngineError;

/// Errors that can occur while building or mutating the graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A connection request needs at least two endpoints.
    #[error("connection request needs at least 2 endpoints, got {count}")]
    TooFewEndpoints {
        /// Number of endpoints actually supplied.
        count: usize,
    },

    /// The endpoint pair cannot be wired.
    ///
    /// Raised whenever a pair reaches the resolver that no dispatch rule
    /// can handle. Unresolvable pairs fail loudly; they are never
    /// silently skipped.
    #[error("cannot connect {left} endpoint to {right} endpoint: {reason}")]
    UnsupportedPair {
        /// Kind of the left (source) endpoint.
        left: EndpointKind,
        /// Kind of the right (target) endpoint.
        right: EndpointKind,
        /// Why the pair is unresolvable.
        reason: String,
    },

    /// Group-to-group connection with differing lengths.
    ///
    /// Groups connect pairwise, element i to element i; that has no
    /// meaning when the lengths differ.
    #[error("group-to-group connection needs equal lengths, got {left} and {right}")]
    GroupLengthMismatch {
        /// Length of the left group.
        left: usize,
        /// Length of the right group.
        right: usize,
    },

    /// The referenced graph node does not exist in this system.
    #[error("graph node {0} not found")]
    NodeNotFound(NodeId),

    /// The node has no automatable parameter with this name.
    #[error("node {node} has no parameter '{name}'")]
    UnknownParam {
        /// Node the lookup was made against.
        node: NodeId,
        /// Requested parameter name.
        name: String,
    },

    /// The node has no attribute with this name.
    #[error("node {node} has no attribute '{name}'")]
    UnknownAttr {
        /// Node the lookup was made against.
        node: NodeId,
        /// Requested attribute name.
        name: String,
    },

    /// The operation needs a bound parameter, and none is bound.
    #[error("envelope {0} has no bound parameter")]
    NoBoundParam(NodeId),

    /// The node is not the kind expected by the operation.
    #[error("node {node} is a {node_type} node, expected {expected}")]
    WrongNodeType {
        /// Node the operation was applied to.
        node: NodeId,
        /// The node's actual type tag.
        node_type: &'static str,
        /// What the operation needed.
        expected: &'static str,
    },

    /// The node wraps no underlying source and cannot start or stop.
    #[error("node {0} has no source to start or stop")]
    NotASource(NodeId),

    /// An engine call failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl GraphError {
    /// Create an [`GraphError::UnsupportedPair`] from any displayable reason.
    pub fn unsupported_pair(
        left: EndpointKind,
        right: EndpointKind,
        reason: impl Into<String>,
    ) -> Self {
        GraphError::UnsupportedPair {
            left,
            right,
            reason: reason.into(),
        }
    }

    /// Create an [`GraphError::UnknownParam`].
    pub fn unknown_param(node: NodeId, name: impl Into<String>) -> Self {
        GraphError::UnknownParam {
            node,
            name: name.into(),
        }
    }
}
