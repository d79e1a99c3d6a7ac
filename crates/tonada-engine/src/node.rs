//! Native node records for the engine context.
//!
//! Every primitive the engine can create (gain stages, delays,
//! oscillators, filters, buffer sources, mergers) is tracked as a
//! [`NativeNodeData`] record identified by a [`NativeId`]. The record
//! bundles the node's [`NativeKind`], its named automatable parameters,
//! its port counts, and (for sources) one-shot lifecycle state.

use core::fmt;

use crate::param::ParamId;

/// Unique identifier for a native node owned by an [`AudioContext`].
///
/// IDs are assigned sequentially and never reused within a context.
/// The engine owns every node for the lifetime of the context; handles
/// only borrow.
///
/// [`AudioContext`]: crate::AudioContext
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeId(pub(crate) u32);

impl NativeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeId({})", self.0)
    }
}

/// Unique identifier for a decoded sample buffer owned by the context.
///
/// Buffers are raw channel data, not processing nodes; a buffer source
/// node references one by ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

impl BufferId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// The concrete primitive behind a native node.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeKind {
    /// Pass-through amplitude stage with a `gain` parameter.
    Gain,
    /// Fixed-topology delay line with a `delayTime` parameter.
    Delay,
    /// Periodic source with `frequency` and `detune` parameters.
    Oscillator,
    /// Biquad filter with `frequency`, `Q` and `gain` parameters.
    Filter,
    /// One-shot source playing a sample buffer.
    BufferSource {
        /// The buffer this source reads from.
        buffer: BufferId,
        /// Whether playback wraps at the buffer end.
        looping: bool,
    },
    /// Dynamics compressor with threshold/knee/ratio/attack/release.
    Compressor,
    /// Script/stream processor with a fixed block size.
    Processor {
        /// Samples per processing callback.
        buffer_size: usize,
    },
    /// Memoryless transfer-curve shaper.
    WaveShaper {
        /// The transfer curve, sampled over [-1, 1].
        curve: Vec<f32>,
    },
    /// Combines N mono inputs into one N-channel output.
    ChannelMerger {
        /// Number of input channels.
        channels: u32,
    },
    /// Splits one N-channel input into N mono outputs.
    ChannelSplitter {
        /// Number of output channels.
        channels: u32,
    },
    /// Measurement tap; passes audio through unchanged.
    Analyser,
    /// Live capture source. Acquisition itself is the host's concern.
    MediaStreamSource,
    /// The context's terminal sink (the speakers).
    Destination,
}

impl NativeKind {
    /// Short lowercase name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NativeKind::Gain => "gain",
            NativeKind::Delay => "delay",
            NativeKind::Oscillator => "oscillator",
            NativeKind::Filter => "filter",
            NativeKind::BufferSource { .. } => "buffer-source",
            NativeKind::Compressor => "compressor",
            NativeKind::Processor { .. } => "processor",
            NativeKind::WaveShaper { .. } => "wave-shaper",
            NativeKind::ChannelMerger { .. } => "channel-merger",
            NativeKind::ChannelSplitter { .. } => "channel-splitter",
            NativeKind::Analyser => "analyser",
            NativeKind::MediaStreamSource => "media-stream-source",
            NativeKind::Destination => "destination",
        }
    }

    /// Whether this primitive has a one-shot start/stop lifecycle.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            NativeKind::Oscillator | NativeKind::BufferSource { .. }
        )
    }
}

/// One-shot lifecycle state for source primitives.
///
/// Engine sources start at most once; a second start is an error, not a
/// retrigger.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SourceState {
    /// Absolute time the source was scheduled to start, if any.
    pub started_at: Option<f64>,
    /// Absolute time the source was scheduled to stop, if any.
    pub stopped_at: Option<f64>,
}

/// Internal bookkeeping for one native node.
#[derive(Debug)]
pub(crate) struct NativeNodeData {
    pub id: NativeId,
    pub kind: NativeKind,
    /// Named automatable parameters, in declaration order.
    pub params: Vec<(&'static str, ParamId)>,
    /// Number of input channels (0 for pure sources).
    pub inputs: u32,
    /// Number of output channels (0 for the destination).
    pub outputs: u32,
    /// Present only for kinds where [`NativeKind::is_source`] is true.
    pub source: Option<SourceState>,
}

impl NativeNodeData {
    pub fn new(id: NativeId, kind: NativeKind, inputs: u32, outputs: u32) -> Self {
        let source = kind.is_source().then(SourceState::default);
        Self {
            id,
            kind,
            params: Vec::new(),
            inputs,
            outputs,
            source,
        }
    }

    /// Looks up a parameter by its wire name.
    pub fn param(&self, name: &str) -> Option<ParamId> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, id)| id)
    }
}

/// Decoded sample data referenced by buffer source nodes.
#[derive(Debug, Clone)]
pub(crate) struct BufferData {
    /// One `Vec<f32>` per channel, all the same length.
    pub channels: Vec<Vec<f32>>,
    /// Sample rate the data was produced at.
    pub sample_rate: f32,
}
