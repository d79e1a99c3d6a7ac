//! The uniform graph node wrapper.
//!
//! Every node the system hands out is an [`NodeId`] naming a record with
//! the same shape: an `input` pass-through stage (absent on pure
//! sources), an `output` pass-through stage, a [`NodeType`] tag, named
//! automatable parameters, and an open attribute map for node-specific
//! state. Callers wire nodes without knowing what sits between the two
//! stages; the ports never change identity for the node's lifetime, only
//! their wiring does.

use core::fmt;
use std::collections::BTreeMap;

use tonada_engine::{BufferId, NativeId, ParamId};

use crate::envelope::EnvelopeConfig;

/// Unique identifier for a graph node owned by an `AudioSystem`.
///
/// IDs are assigned sequentially and never reused within a system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Tag describing what a graph node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    /// Periodic waveform source.
    Oscillator,
    /// Amplitude stage.
    Gain,
    /// Biquad filter.
    Filter,
    /// Sample data holder.
    Buffer,
    /// One-shot sample playback source.
    BufferPlayer,
    /// Looped random-noise source, optionally coloured by a filter.
    Noise,
    /// Stereo left/right gain split.
    Panner,
    /// ADSR automation curve bound to one parameter.
    Envelope,
    /// Low-frequency modulation source with a depth stage.
    Lfo,
    /// Dynamics compressor.
    Compressor,
    /// Script/stream processor.
    Processor,
    /// Transfer-curve distortion.
    WaveShaper,
    /// Delay line.
    Delay,
    /// Live-capture stream source.
    MediaStream,
    /// Plain pass-through wrapper with no specialised behaviour.
    Default,
}

impl NodeType {
    /// Short lowercase tag used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Oscillator => "oscillator",
            NodeType::Gain => "gain",
            NodeType::Filter => "filter",
            NodeType::Buffer => "buffer",
            NodeType::BufferPlayer => "bufferPlayer",
            NodeType::Noise => "noise",
            NodeType::Panner => "panner",
            NodeType::Envelope => "envelope",
            NodeType::Lfo => "lfo",
            NodeType::Compressor => "compressor",
            NodeType::Processor => "processor",
            NodeType::WaveShaper => "waveShaper",
            NodeType::Delay => "delay",
            NodeType::MediaStream => "mediaStream",
            NodeType::Default => "default",
        }
    }

    /// Pure sources generate signal and accept none; they expose only an
    /// output port.
    pub fn is_pure_source(self) -> bool {
        matches!(
            self,
            NodeType::Oscillator | NodeType::BufferPlayer | NodeType::Noise | NodeType::MediaStream
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry in a node's open attribute map.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// Numeric attribute.
    Float(f32),
    /// Boolean attribute.
    Bool(bool),
    /// Textual attribute (waveform names, filter types, noise colours).
    Text(String),
    /// Reference to a sample buffer.
    Buffer(BufferId),
}

impl AttrValue {
    /// The numeric value, if this attribute is numeric.
    pub fn as_float(&self) -> Option<f32> {
        match *self {
            AttrValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The text value, if this attribute is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<BufferId> for AttrValue {
    fn from(v: BufferId) -> Self {
        AttrValue::Buffer(v)
    }
}

/// Role-specific state, assigned once at construction.
#[derive(Debug)]
pub(crate) enum NodeRole {
    /// No specialised behaviour beyond the uniform contract.
    Plain,
    /// ADSR curve over one bound parameter.
    Envelope {
        config: EnvelopeConfig,
        /// Parameter the curve writes to, once bound.
        param: Option<ParamId>,
        /// Node whose lifecycle auto-stop acts on, once bound.
        bound: Option<NodeId>,
    },
    /// Oscillator-into-depth-gain modulation source.
    Lfo {
        osc: NativeId,
        depth: NativeId,
        /// The one live modulation target, if any.
        target: Option<ParamId>,
    },
    /// Left/right gain pair behind a 2-channel merge.
    Panner { left: ParamId, right: ParamId },
}

/// Internal record backing one graph node.
#[derive(Debug)]
pub(crate) struct GraphNodeData {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Pass-through sink stage. Absent on pure sources.
    pub input: Option<NativeId>,
    /// Pass-through source stage. Always present.
    pub output: NativeId,
    /// The wrapped engine primitive, when the node has a lifecycle.
    pub source: Option<NativeId>,
    /// Named automatable parameters, in declaration order.
    pub params: Vec<(&'static str, ParamId)>,
    /// Open key-to-value map for node-specific state.
    pub attrs: BTreeMap<String, AttrValue>,
    /// Peers this node has been wired to. Informational bookkeeping
    /// only; confers no ownership.
    pub connected_to: Vec<NodeId>,
    pub role: NodeRole,
}

impl GraphNodeData {
    /// Looks up an automatable parameter by name.
    pub fn param(&self, name: &str) -> Option<ParamId> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, id)| id)
    }
}
