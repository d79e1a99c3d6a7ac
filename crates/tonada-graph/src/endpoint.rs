//! Connectable endpoints and their classification.
//!
//! Anything the wiring API accepts is one of four shapes, captured as a
//! closed tagged union assigned once at call time and matched
//! exhaustively by the resolver. There is no runtime shape probing and
//! no combination the resolver can silently skip.
//!
//! Endpoints never own what they reference; they are transient call
//! arguments built from handles.

use core::fmt;

use tonada_engine::NativeId;

use crate::node::NodeId;

/// One connectable shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Endpoint {
    /// A raw engine primitive.
    Native(NativeId),
    /// A uniform graph node; wiring goes through its ports.
    Node(NodeId),
    /// An endpoint narrowed to one channel of its node.
    Channel {
        /// The node whose channel is addressed.
        node: Box<Endpoint>,
        /// Channel index: output channel when this endpoint is the
        /// source of a pair, input channel when it is the target.
        index: u32,
    },
    /// An ordered collection of endpoints; connections fan out over it.
    Group(Vec<Endpoint>),
}

impl Endpoint {
    /// An endpoint narrowed to one channel of `node`.
    pub fn channel(node: impl Into<Endpoint>, index: u32) -> Self {
        Endpoint::Channel {
            node: Box::new(node.into()),
            index,
        }
    }

    /// This endpoint's kind tag.
    pub fn kind(&self) -> EndpointKind {
        match self {
            Endpoint::Native(_) => EndpointKind::Native,
            Endpoint::Node(_) => EndpointKind::Node,
            Endpoint::Channel { .. } => EndpointKind::Channel,
            Endpoint::Group(_) => EndpointKind::Group,
        }
    }
}

impl From<NativeId> for Endpoint {
    fn from(native: NativeId) -> Self {
        Endpoint::Native(native)
    }
}

impl From<NodeId> for Endpoint {
    fn from(node: NodeId) -> Self {
        Endpoint::Node(node)
    }
}

impl<T: Into<Endpoint>> From<Vec<T>> for Endpoint {
    fn from(items: Vec<T>) -> Self {
        Endpoint::Group(items.into_iter().map(Into::into).collect())
    }
}

/// The kind tag of an [`Endpoint`], used in dispatch and error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointKind {
    /// Raw engine primitive.
    Native,
    /// Uniform graph node.
    Node,
    /// Channel-narrowed endpoint.
    Channel,
    /// Collection of endpoints.
    Group,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointKind::Native => "native",
            EndpointKind::Node => "node",
            EndpointKind::Channel => "channel",
            EndpointKind::Group => "group",
        };
        f.write_str(name)
    }
}
