//! Error types for engine operations.

use thiserror::Error;

use crate::node::{BufferId, NativeId};

/// Errors that can occur when driving the engine context.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host cannot provide a required capability.
    ///
    /// Raised once, at context construction or when a call reaches a
    /// surface the active profile does not expose. Never a panic; the
    /// caller must be able to fall back.
    #[error("engine capability unavailable: {reason}")]
    Unsupported {
        /// What the host was missing.
        reason: String,
    },

    /// The referenced native node does not exist in this context.
    #[error("native node {0} not found")]
    NodeNotFound(NativeId),

    /// The node exists but has no parameter with this name.
    #[error("node {node} has no parameter '{name}'")]
    ParamNotFound {
        /// Node the lookup was made against.
        node: NativeId,
        /// Requested parameter name.
        name: String,
    },

    /// The referenced sample buffer does not exist in this context.
    #[error("buffer {0} not found")]
    BufferNotFound(BufferId),

    /// A channel index is out of range for the node's port count.
    #[error("channel {index} out of range for node {node} ({channels} channels)")]
    InvalidChannel {
        /// Node the index was applied to.
        node: NativeId,
        /// Offending channel index.
        index: u32,
        /// Number of channels the node actually has.
        channels: u32,
    },

    /// A channel index is out of range for a buffer.
    #[error("channel {index} out of range for buffer {buffer} ({channels} channels)")]
    BufferChannel {
        /// Buffer the index was applied to.
        buffer: BufferId,
        /// Offending channel index.
        index: u32,
        /// Number of channels the buffer actually has.
        channels: u32,
    },

    /// The operation is not valid for the node's current state or kind.
    #[error("invalid engine state: {reason}")]
    InvalidState {
        /// Why the operation was rejected.
        reason: String,
    },
}

impl EngineError {
    /// Create an [`EngineError::Unsupported`] from any displayable reason.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        EngineError::Unsupported {
            reason: reason.into(),
        }
    }

    /// Create an [`EngineError::InvalidState`] from any displayable reason.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        EngineError::InvalidState {
            reason: reason.into(),
        }
    }

    /// Create an [`EngineError::ParamNotFound`].
    pub fn param_not_found(node: NativeId, name: impl Into<String>) -> Self {
        EngineError::ParamNotFound {
            node,
            name: name.into(),
        }
    }
}
