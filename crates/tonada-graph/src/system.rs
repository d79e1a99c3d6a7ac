//! The audio system facade.
//!
//! [`AudioSystem`] is the single entry point callers hold: it owns the
//! engine context, every graph node built on top of it, and the pending
//! disconnect queue. Node factories mirror the building blocks a synth
//! or effects chain needs (oscillators, gains, filters, buffers,
//! panners, envelopes, LFOs, noise, compression, shaping, delay); the
//! uniform parameter accessors and the wiring API live alongside them.

use rand::Rng;
use tracing::debug;

use tonada_engine::{
    AudioContext, BufferId, ContextConfig, NativeId, ParamId,
};

use crate::endpoint::Endpoint;
use crate::error::GraphError;
use crate::node::{AttrValue, GraphNodeData, NodeId, NodeRole, NodeType};
use crate::scheduler::DisconnectScheduler;

/// Frames in the shared looped noise buffer.
const NOISE_FRAMES: usize = 65536;

/// Points in a wave shaper transfer curve.
const SHAPER_CURVE_LEN: usize = 65536;

/// Settings for a dynamics compressor node.
#[derive(Debug, Clone, Copy)]
pub struct CompressorConfig {
    /// Level above which compression starts, in dB (-100 to 0).
    pub threshold: f32,
    /// Width of the soft-knee region, in dB (0 to 40).
    pub knee: f32,
    /// Input/output ratio above the threshold (1 to 20).
    pub ratio: f32,
    /// Time to reduce gain by 10 dB, in seconds (0 to 1).
    pub attack: f32,
    /// Time to increase gain by 10 dB, in seconds (0 to 1).
    pub release: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            threshold: -24.0,
            knee: 30.0,
            ratio: 12.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

/// Owner of one audio graph: the engine context, the nodes wrapped over
/// it, and the deferred disconnect queue.
#[derive(Debug)]
pub struct AudioSystem {
    pub(crate) ctx: AudioContext,
    pub(crate) nodes: Vec<GraphNodeData>,
    pub(crate) scheduler: DisconnectScheduler,
    /// Whether the engine answers to the modern start/stop names.
    /// Probed once at construction, never re-checked per call.
    modern_sources: bool,
    /// Shared looped buffer of uniform noise, built at startup.
    noise_buffer: BufferId,
}

impl AudioSystem {
    /// Builds a system over a fresh engine context.
    ///
    /// Capability detection happens here, once: an engine that cannot
    /// provide what the system needs is reported as an error value, so
    /// the caller can present a fallback.
    pub fn new(config: ContextConfig) -> Result<Self, GraphError> {
        let mut ctx = AudioContext::new(config)?;
        let modern_sources = ctx.capabilities().modern_source_api;
        let sample_rate = ctx.sample_rate();

        let noise_buffer = ctx.create_buffer(1, NOISE_FRAMES, sample_rate)?;
        let mut rng = rand::thread_rng();
        for sample in ctx.buffer_channel_mut(noise_buffer, 0)? {
            *sample = rng.gen_range(-1.0..=1.0);
        }

        Ok(Self {
            ctx,
            nodes: Vec::new(),
            scheduler: DisconnectScheduler::default(),
            modern_sources,
            noise_buffer,
        })
    }

    /// Seconds since the engine started.
    pub fn now(&self) -> f64 {
        self.ctx.current_time()
    }

    /// Advances the engine clock by `dt` seconds.
    pub fn advance(&mut self, dt: f64) -> Result<(), GraphError> {
        Ok(self.ctx.advance(dt)?)
    }

    /// The terminal output, as a connectable endpoint.
    pub fn speakers(&self) -> Endpoint {
        Endpoint::Native(self.ctx.destination())
    }

    /// Read access to the underlying engine context.
    pub fn engine(&self) -> &AudioContext {
        &self.ctx
    }

    // --- Node factories ---

    /// Creates a plain pass-through node with no specialised behaviour.
    pub fn node(&mut self) -> NodeId {
        self.make_node(NodeType::Default, None)
    }

    /// Creates an oscillator of the given waveform and frequency.
    pub fn oscillator(&mut self, wave: &str, frequency: f32) -> NodeId {
        let osc = self.ctx.create_oscillator();
        let id = self.make_node(NodeType::Oscillator, Some(osc));
        self.adopt_params(id, osc, &["frequency", "detune"]);
        self.set_native_param(osc, "frequency", frequency);
        self.wire_internal(osc, self.nodes[id.0 as usize].output);
        self.nodes[id.0 as usize]
            .attrs
            .insert("type".to_owned(), AttrValue::from(wave));
        id
    }

    /// Creates a gain stage. Negative volumes clamp to silence.
    pub fn gain(&mut self, volume: f32) -> NodeId {
        let native = self.ctx.create_gain();
        let id = self.make_node(NodeType::Gain, Some(native));
        self.adopt_params(id, native, &["gain"]);
        self.set_native_param(native, "gain", volume.max(0.0));
        self.wire_through(id, native);
        id
    }

    /// Creates a biquad filter of the given type, cutoff and resonance.
    pub fn filter(&mut self, kind: &str, frequency: f32, q: f32) -> NodeId {
        let native = self.ctx.create_filter();
        let id = self.make_node(NodeType::Filter, Some(native));
        self.adopt_params(id, native, &["frequency", "Q", "gain"]);
        self.set_native_param(native, "frequency", frequency);
        self.set_native_param(native, "Q", q);
        self.wire_through(id, native);
        self.nodes[id.0 as usize]
            .attrs
            .insert("type".to_owned(), AttrValue::from(kind));
        id
    }

    /// Allocates a sample buffer and wraps it as a graph node.
    pub fn buffer(
        &mut self,
        channels: u32,
        frames: usize,
        sample_rate: f32,
    ) -> Result<NodeId, GraphError> {
        let buffer = self.ctx.create_buffer(channels, frames, sample_rate)?;
        let id = self.make_node(NodeType::Buffer, None);
        self.nodes[id.0 as usize]
            .attrs
            .insert("buffer".to_owned(), AttrValue::Buffer(buffer));
        Ok(id)
    }

    /// The sample buffer behind a buffer node.
    pub fn buffer_id(&self, node: NodeId) -> Result<BufferId, GraphError> {
        let data = self.node_data(node)?;
        match data.attrs.get("buffer") {
            Some(&AttrValue::Buffer(buffer)) => Ok(buffer),
            _ => Err(GraphError::WrongNodeType {
                node,
                node_type: data.node_type.name(),
                expected: "buffer",
            }),
        }
    }

    /// Write access to one channel of a buffer node's samples.
    pub fn buffer_channel_mut(
        &mut self,
        node: NodeId,
        channel: u32,
    ) -> Result<&mut [f32], GraphError> {
        let buffer = self.buffer_id(node)?;
        Ok(self.ctx.buffer_channel_mut(buffer, channel)?)
    }

    /// Reverses a buffer's samples in place, channel by channel.
    pub fn reverse_buffer(&mut self, node: NodeId) -> Result<(), GraphError> {
        let buffer = self.buffer_id(node)?;
        for channel in 0..self.ctx.buffer_channels(buffer)? {
            self.ctx.buffer_channel_mut(buffer, channel)?.reverse();
        }
        Ok(())
    }

    /// Creates a one-shot player over a buffer node's samples.
    pub fn buffer_player(&mut self, buffer_node: NodeId) -> Result<NodeId, GraphError> {
        let buffer = self.buffer_id(buffer_node)?;
        let source = self.ctx.create_buffer_source(buffer)?;
        let id = self.make_node(NodeType::BufferPlayer, Some(source));
        self.wire_internal(source, self.nodes[id.0 as usize].output);
        self.nodes[id.0 as usize]
            .attrs
            .insert("buffer".to_owned(), AttrValue::Buffer(buffer));
        Ok(id)
    }

    /// Creates and immediately starts a player over a buffer node.
    pub fn play(&mut self, buffer_node: NodeId, when: Option<f64>) -> Result<NodeId, GraphError> {
        let player = self.buffer_player(buffer_node)?;
        self.start_node(player, when)?;
        Ok(player)
    }

    /// Creates a looped noise source, low-passed by colour: pink noise
    /// is filtered at 1 kHz, anything else at 10 kHz.
    pub fn noise(&mut self, colour: &str) -> Result<NodeId, GraphError> {
        let source = self.ctx.create_buffer_source(self.noise_buffer)?;
        self.ctx.set_source_looping(source, true)?;

        let filter = self.ctx.create_filter();
        let cutoff = if colour == "pink" { 1000.0 } else { 10000.0 };
        self.set_native_param(filter, "frequency", cutoff);

        let id = self.make_node(NodeType::Noise, Some(source));
        self.wire_internal(source, filter);
        self.wire_internal(filter, self.nodes[id.0 as usize].output);
        self.nodes[id.0 as usize]
            .attrs
            .insert("color".to_owned(), AttrValue::from(colour));
        Ok(id)
    }

    /// Creates a dynamics compressor with the given settings.
    pub fn compressor(&mut self, config: CompressorConfig) -> NodeId {
        let native = self.ctx.create_compressor();
        let id = self.make_node(NodeType::Compressor, Some(native));
        self.adopt_params(id, native, &["threshold", "knee", "ratio", "attack", "release"]);
        self.set_native_param(native, "threshold", config.threshold);
        self.set_native_param(native, "knee", config.knee);
        self.set_native_param(native, "ratio", config.ratio);
        self.set_native_param(native, "attack", config.attack);
        self.set_native_param(native, "release", config.release);
        self.wire_through(id, native);
        id
    }

    /// Creates a stream processor with the given block size.
    pub fn processor(&mut self, buffer_size: usize) -> NodeId {
        let native = self.ctx.create_processor(buffer_size);
        let id = self.make_node(NodeType::Processor, Some(native));
        self.wire_through(id, native);
        id
    }

    /// Creates a hard-clipping wave shaper.
    pub fn wave_shaper(&mut self) -> Result<NodeId, GraphError> {
        let mut curve = vec![0.0_f32; SHAPER_CURVE_LEN];
        for (i, point) in curve.iter_mut().take(SHAPER_CURVE_LEN / 2).enumerate() {
            *point = if i < 30000 { 0.1 } else { -1.0 };
        }

        let native = self.ctx.create_wave_shaper();
        self.ctx.set_wave_shaper_curve(native, curve)?;
        let id = self.make_node(NodeType::WaveShaper, Some(native));
        self.wire_through(id, native);
        Ok(id)
    }

    /// Creates a delay line holding the signal for `delay_time` seconds.
    pub fn wait(&mut self, delay_time: f32) -> NodeId {
        let native = self.ctx.create_delay();
        let id = self.make_node(NodeType::Delay, Some(native));
        self.adopt_params(id, native, &["delayTime"]);
        self.set_native_param(native, "delayTime", delay_time);
        self.wire_through(id, native);
        id
    }

    /// Creates a pass-through that folds its input down to mono.
    pub fn mono(&mut self) -> NodeId {
        let id = self.make_node(NodeType::Default, None);
        let data = &self.nodes[id.0 as usize];
        if let (Some(input), output) = (data.input, data.output) {
            self.wire_internal(input, output);
        }
        id
    }

    /// Creates a raw N-channel merge primitive. Mergers are wired by
    /// channel, so they are handed out as natives rather than wrapped.
    pub fn channel_merger(&mut self, channels: u32) -> NativeId {
        self.ctx.create_channel_merger(channels)
    }

    /// Wraps a live-capture stream as a graph node. Acquiring the
    /// stream itself is the host's concern.
    pub fn media_stream(&mut self) -> NodeId {
        let native = self.ctx.create_media_stream_source();
        let id = self.make_node(NodeType::MediaStream, None);
        self.wire_internal(native, self.nodes[id.0 as usize].output);
        id
    }

    // --- Uniform parameter accessors ---

    /// Reads a parameter's value at the current engine time.
    ///
    /// A change scheduled for the future is invisible until the clock
    /// reaches it.
    pub fn param_get(&self, node: NodeId, name: &str) -> Result<f32, GraphError> {
        let param = self.resolve_param(node, name)?;
        Ok(self.ctx.value(param)?)
    }

    /// Sets a parameter immediately.
    pub fn param_set(&mut self, node: NodeId, name: &str, value: f32) -> Result<(), GraphError> {
        let param = self.resolve_param(node, name)?;
        Ok(self.ctx.set_value(param, value)?)
    }

    /// Schedules a parameter change on the automation timeline instead
    /// of mutating synchronously.
    pub fn param_schedule(
        &mut self,
        node: NodeId,
        name: &str,
        value: f32,
        time: f64,
    ) -> Result<(), GraphError> {
        let param = self.resolve_param(node, name)?;
        Ok(self.ctx.set_value_at_time(param, value, time)?)
    }

    /// Reads a node attribute.
    pub fn attr(&self, node: NodeId, name: &str) -> Result<&AttrValue, GraphError> {
        let data = self.node_data(node)?;
        data.attrs.get(name).ok_or_else(|| GraphError::UnknownAttr {
            node,
            name: name.to_owned(),
        })
    }

    /// Writes a node attribute.
    pub fn set_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), GraphError> {
        let data = self.node_data_mut(node)?;
        data.attrs.insert(name.to_owned(), value.into());
        Ok(())
    }

    /// A node's type tag.
    pub fn node_type(&self, node: NodeId) -> Result<NodeType, GraphError> {
        Ok(self.node_data(node)?.node_type)
    }

    /// The peers a node has been wired to. Bookkeeping only.
    pub fn connected_to(&self, node: NodeId) -> Result<&[NodeId], GraphError> {
        Ok(&self.node_data(node)?.connected_to)
    }

    /// A node's output pass-through stage.
    pub fn output_port(&self, node: NodeId) -> Result<NativeId, GraphError> {
        Ok(self.node_data(node)?.output)
    }

    /// A node's input pass-through stage. Pure sources have none.
    pub fn input_port(&self, node: NodeId) -> Result<Option<NativeId>, GraphError> {
        Ok(self.node_data(node)?.input)
    }

    // --- Source lifecycle ---

    /// Starts a node's wrapped source, defaulting to now.
    ///
    /// Dispatch between the modern and legacy engine names was decided
    /// once at construction.
    pub fn start_node(&mut self, node: NodeId, when: Option<f64>) -> Result<(), GraphError> {
        let source = self
            .node_data(node)?
            .source
            .ok_or(GraphError::NotASource(node))?;
        let at = when.unwrap_or_else(|| self.ctx.current_time());
        if self.modern_sources {
            self.ctx.start_source(source, at)?;
        } else {
            self.ctx.note_on(source, at)?;
        }
        Ok(())
    }

    /// Stops a node's wrapped source, defaulting to now.
    pub fn stop_node(&mut self, node: NodeId, when: Option<f64>) -> Result<(), GraphError> {
        let source = self
            .node_data(node)?
            .source
            .ok_or(GraphError::NotASource(node))?;
        let at = when.unwrap_or_else(|| self.ctx.current_time());
        if self.modern_sources {
            self.ctx.stop_source(source, at)?;
        } else {
            self.ctx.note_off(source, at)?;
        }
        Ok(())
    }

    // --- Deferred disconnects ---

    /// Queues `target` for disconnection at absolute engine time `time`.
    pub fn disconnect_after_time(&mut self, target: impl Into<Endpoint>, time: f64) {
        let target = target.into();
        debug!(?target, time, "disconnect_scheduled");
        self.scheduler.schedule(target, time);
    }

    /// Fires every pending disconnect whose time has arrived. Returns
    /// the number of tasks fired. The host calls this from its loop,
    /// nominally every [`POLL_INTERVAL`](crate::scheduler::POLL_INTERVAL).
    pub fn tick(&mut self) -> Result<usize, GraphError> {
        let due = self.scheduler.due(self.ctx.current_time());
        let count = due.len();
        for target in due {
            self.disconnect([target])?;
        }
        Ok(count)
    }

    /// Number of disconnect tasks still pending.
    pub fn pending_disconnects(&self) -> usize {
        self.scheduler.len()
    }

    // --- Internals shared across the crate ---

    pub(crate) fn make_node(&mut self, node_type: NodeType, source: Option<NativeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let input = (!node_type.is_pure_source()).then(|| self.ctx.create_gain());
        let output = self.ctx.create_gain();
        debug!(%id, node_type = node_type.name(), "node_created");
        self.nodes.push(GraphNodeData {
            id,
            node_type,
            input,
            output,
            source,
            params: Vec::new(),
            attrs: std::collections::BTreeMap::new(),
            connected_to: Vec::new(),
            role: NodeRole::Plain,
        });
        id
    }

    /// Maps the named engine parameters of `native` onto the node.
    pub(crate) fn adopt_params(&mut self, node: NodeId, native: NativeId, names: &[&'static str]) {
        for &name in names {
            if let Ok(param) = self.ctx.param(native, name) {
                self.nodes[node.0 as usize].params.push((name, param));
            }
        }
    }

    /// Sets a native parameter by name, ignoring names the primitive
    /// does not expose.
    pub(crate) fn set_native_param(&mut self, native: NativeId, name: &str, value: f32) {
        if let Ok(param) = self.ctx.param(native, name) {
            let _ = self.ctx.set_value(param, value);
        }
    }

    /// Internal wiring between engine primitives during construction.
    /// These edges are structural; failures here mean a factory bug,
    /// and the graph stays usable without the edge.
    pub(crate) fn wire_internal(&mut self, from: NativeId, to: NativeId) {
        if let Err(error) = self.ctx.connect(from, to) {
            debug!(%from, %to, %error, "internal_wire_failed");
        }
    }

    /// Wires input -> native -> output for a processing node.
    pub(crate) fn wire_through(&mut self, node: NodeId, native: NativeId) {
        let data = &self.nodes[node.0 as usize];
        let (input, output) = (data.input, data.output);
        if let Some(input) = input {
            self.wire_internal(input, native);
        }
        self.wire_internal(native, output);
    }

    pub(crate) fn resolve_param(&self, node: NodeId, name: &str) -> Result<ParamId, GraphError> {
        let data = self.node_data(node)?;
        data.param(name)
            .ok_or_else(|| GraphError::unknown_param(data.id, name))
    }

    pub(crate) fn node_data(&self, node: NodeId) -> Result<&GraphNodeData, GraphError> {
        self.nodes
            .get(node.0 as usize)
            .ok_or(GraphError::NodeNotFound(node))
    }

    pub(crate) fn node_data_mut(&mut self, node: NodeId) -> Result<&mut GraphNodeData, GraphError> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(GraphError::NodeNotFound(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> AudioSystem {
        AudioSystem::new(ContextConfig::default()).expect("default system")
    }

    #[test]
    fn oscillator_exposes_frequency() {
        let mut sys = system();
        let osc = sys.oscillator("sine", 220.0);

        assert_eq!(sys.node_type(osc).unwrap(), NodeType::Oscillator);
        assert_eq!(sys.param_get(osc, "frequency").unwrap(), 220.0);
        assert_eq!(sys.attr(osc, "type").unwrap().as_text(), Some("sine"));
        assert!(sys.input_port(osc).unwrap().is_none(), "pure source has no input");
    }

    #[test]
    fn gain_clamps_negative_volume() {
        let mut sys = system();
        let quiet = sys.gain(-3.0);
        assert_eq!(sys.param_get(quiet, "gain").unwrap(), 0.0);

        let unity = sys.gain(1.0);
        assert_eq!(sys.param_get(unity, "gain").unwrap(), 1.0);
    }

    #[test]
    fn scheduled_change_reads_back_old_value() {
        let mut sys = system();
        let osc = sys.oscillator("sine", 440.0);

        sys.param_schedule(osc, "frequency", 880.0, sys.now() + 1.0).unwrap();
        assert_eq!(sys.param_get(osc, "frequency").unwrap(), 440.0);

        sys.advance(1.0).unwrap();
        assert_eq!(sys.param_get(osc, "frequency").unwrap(), 880.0);
    }

    #[test]
    fn unknown_param_is_an_error() {
        let mut sys = system();
        let gain = sys.gain(1.0);
        assert!(matches!(
            sys.param_get(gain, "frequency"),
            Err(GraphError::UnknownParam { .. })
        ));
    }

    #[test]
    fn compressor_defaults() {
        let mut sys = system();
        let comp = sys.compressor(CompressorConfig::default());

        assert_eq!(sys.param_get(comp, "threshold").unwrap(), -24.0);
        assert_eq!(sys.param_get(comp, "knee").unwrap(), 30.0);
        assert_eq!(sys.param_get(comp, "ratio").unwrap(), 12.0);
        assert_eq!(sys.param_get(comp, "attack").unwrap(), 0.003);
        assert_eq!(sys.param_get(comp, "release").unwrap(), 0.25);
    }

    #[test]
    fn buffer_player_plays_a_buffer_node() {
        let mut sys = system();
        let buffer = sys.buffer(1, 16, 44100.0).unwrap();
        sys.buffer_channel_mut(buffer, 0).unwrap()[0] = 1.0;

        let player = sys.play(buffer, None).unwrap();
        assert_eq!(sys.node_type(player).unwrap(), NodeType::BufferPlayer);
        // Started through the lifecycle dispatch.
        let source = sys.node_data(player).unwrap().source.unwrap();
        assert_eq!(sys.engine().source_started_at(source).unwrap(), Some(0.0));
    }

    #[test]
    fn reverse_buffer_reverses_each_channel() {
        let mut sys = system();
        let buffer = sys.buffer(2, 3, 44100.0).unwrap();
        sys.buffer_channel_mut(buffer, 0).unwrap().copy_from_slice(&[1.0, 2.0, 3.0]);
        sys.buffer_channel_mut(buffer, 1).unwrap().copy_from_slice(&[4.0, 5.0, 6.0]);

        sys.reverse_buffer(buffer).unwrap();

        let id = sys.buffer_id(buffer).unwrap();
        assert_eq!(sys.engine().buffer_channel(id, 0).unwrap(), &[3.0, 2.0, 1.0]);
        assert_eq!(sys.engine().buffer_channel(id, 1).unwrap(), &[6.0, 5.0, 4.0]);
    }

    #[test]
    fn noise_colour_picks_the_cutoff() {
        let mut sys = system();
        let pink = sys.noise("pink").unwrap();
        assert_eq!(sys.attr(pink, "color").unwrap().as_text(), Some("pink"));
        assert!(sys.input_port(pink).unwrap().is_none());

        let white = sys.noise("white").unwrap();
        assert_eq!(sys.attr(white, "color").unwrap().as_text(), Some("white"));
    }

    #[test]
    fn media_stream_is_a_source_with_no_input_port() {
        let mut sys = system();
        let stream = sys.media_stream();

        assert_eq!(sys.node_type(stream).unwrap(), NodeType::MediaStream);
        assert!(sys.input_port(stream).unwrap().is_none());

        // The capture native feeds the node's output port.
        let out = sys.output_port(stream).unwrap();
        let feeds_output = sys
            .engine()
            .connections()
            .iter()
            .filter(|c| c.target == tonada_engine::ConnectTarget::Node(out))
            .count();
        assert_eq!(feeds_output, 1);
    }

    #[test]
    fn stopping_a_gain_is_an_error() {
        let mut sys = system();
        let gain = sys.gain(1.0);
        assert!(matches!(
            sys.stop_node(gain, None),
            Err(GraphError::NotASource(_))
        ));
    }
}
