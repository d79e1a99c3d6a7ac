//! The engine context: node ownership, wiring, scheduling, and the clock.
//!
//! [`AudioContext`] is the explicit context object everything else hangs
//! off. It owns every native node and parameter it creates, records the
//! connection table, and carries the monotonic clock automation is keyed
//! to. There is no process-wide singleton: independent contexts coexist,
//! and nothing created by one context is valid in another.
//!
//! Mutations are synchronous and take effect immediately relative to the
//! caller; only parameter automation is deferred, via each parameter's
//! timeline. The context is single-threaded; a multithreaded host wraps
//! it in its own lock.

use tracing::debug;

use crate::error::EngineError;
use crate::node::{BufferData, BufferId, NativeId, NativeKind, NativeNodeData};
use crate::param::{AudioParam, AutomationEvent, ParamId};

/// Which source-lifecycle surface the host engine exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceApi {
    /// The host answers to `start_source` / `stop_source`.
    Modern,
    /// Older host: only the `note_on` / `note_off` names exist.
    Legacy,
}

/// Construction-time settings for an [`AudioContext`].
#[derive(Debug, Clone, Copy)]
pub struct ContextConfig {
    /// Sample rate in Hz. Must be finite and positive.
    pub sample_rate: f32,
    /// Source-lifecycle surface the host exposes.
    pub source_api: SourceApi,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            source_api: SourceApi::Modern,
        }
    }
}

/// What a context can do, probed once at construction.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// True when `start_source` / `stop_source` are available.
    pub modern_source_api: bool,
    /// The context's sample rate in Hz.
    pub sample_rate: f32,
}

/// Destination of a connection: another node, or an automatable
/// parameter (modulation input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectTarget {
    /// A native node's input.
    Node(NativeId),
    /// An automatable parameter.
    Param(ParamId),
}

impl From<NativeId> for ConnectTarget {
    fn from(node: NativeId) -> Self {
        ConnectTarget::Node(node)
    }
}

impl From<ParamId> for ConnectTarget {
    fn from(param: ParamId) -> Self {
        ConnectTarget::Param(param)
    }
}

/// One recorded edge in the native graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Node the signal leaves from.
    pub source: NativeId,
    /// Where the signal arrives.
    pub target: ConnectTarget,
    /// Output channel on the source.
    pub output_index: u32,
    /// Input channel on the target (0 for parameter targets).
    pub input_index: u32,
}

/// The engine context. See the [module docs](self) for the model.
#[derive(Debug)]
pub struct AudioContext {
    config: ContextConfig,
    nodes: Vec<NativeNodeData>,
    params: Vec<AudioParam>,
    buffers: Vec<BufferData>,
    connections: Vec<Connection>,
    destination: NativeId,
    current_time: f64,
}

impl AudioContext {
    /// Creates a context, probing host capabilities once.
    ///
    /// # Errors
    ///
    /// [`EngineError::Unsupported`] when the configuration describes a
    /// host this engine cannot drive (non-finite or non-positive sample
    /// rate). Capability failure is a value, never a panic, so callers
    /// can present a fallback.
    pub fn new(config: ContextConfig) -> Result<Self, EngineError> {
        if !config.sample_rate.is_finite() || config.sample_rate <= 0.0 {
            return Err(EngineError::unsupported(format!(
                "sample rate {} Hz is not usable",
                config.sample_rate
            )));
        }

        let mut ctx = Self {
            config,
            nodes: Vec::new(),
            params: Vec::new(),
            buffers: Vec::new(),
            connections: Vec::new(),
            destination: NativeId(0),
            current_time: 0.0,
        };
        ctx.destination = ctx.add_node(NativeKind::Destination, 1, 0, &[]);
        Ok(ctx)
    }

    /// What this context can do, probed at construction.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            modern_source_api: self.config.source_api == SourceApi::Modern,
            sample_rate: self.config.sample_rate,
        }
    }

    /// The terminal sink (the speakers).
    pub fn destination(&self) -> NativeId {
        self.destination
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    // --- Clock ---

    /// Seconds since the context started. Monotonic.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Advances the clock by `dt` seconds.
    ///
    /// The clock only moves forward; a negative or non-finite `dt` is
    /// rejected.
    pub fn advance(&mut self, dt: f64) -> Result<(), EngineError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(EngineError::invalid_state(format!(
                "clock cannot advance by {dt} seconds"
            )));
        }
        self.current_time += dt;
        Ok(())
    }

    // --- Node factories ---

    /// Creates a gain stage (`gain`, default 1).
    pub fn create_gain(&mut self) -> NativeId {
        self.add_node(NativeKind::Gain, 1, 1, &[("gain", 1.0)])
    }

    /// Creates a delay line (`delayTime`, default 0).
    pub fn create_delay(&mut self) -> NativeId {
        self.add_node(NativeKind::Delay, 1, 1, &[("delayTime", 0.0)])
    }

    /// Creates an oscillator (`frequency` 440, `detune` 0).
    pub fn create_oscillator(&mut self) -> NativeId {
        self.add_node(
            NativeKind::Oscillator,
            0,
            1,
            &[("frequency", 440.0), ("detune", 0.0)],
        )
    }

    /// Creates a biquad filter (`frequency` 350, `Q` 1, `gain` 0).
    pub fn create_filter(&mut self) -> NativeId {
        self.add_node(
            NativeKind::Filter,
            1,
            1,
            &[("frequency", 350.0), ("Q", 1.0), ("gain", 0.0)],
        )
    }

    /// Creates a dynamics compressor with engine defaults.
    pub fn create_compressor(&mut self) -> NativeId {
        self.add_node(
            NativeKind::Compressor,
            1,
            1,
            &[
                ("threshold", -24.0),
                ("knee", 30.0),
                ("ratio", 12.0),
                ("attack", 0.003),
                ("release", 0.25),
            ],
        )
    }

    /// Creates a stream processor with the given block size.
    pub fn create_processor(&mut self, buffer_size: usize) -> NativeId {
        self.add_node(NativeKind::Processor { buffer_size }, 1, 1, &[])
    }

    /// Creates a wave shaper with an empty transfer curve.
    pub fn create_wave_shaper(&mut self) -> NativeId {
        self.add_node(NativeKind::WaveShaper { curve: Vec::new() }, 1, 1, &[])
    }

    /// Creates a channel merger with `channels` mono inputs.
    pub fn create_channel_merger(&mut self, channels: u32) -> NativeId {
        self.add_node(
            NativeKind::ChannelMerger { channels },
            channels.max(1),
            1,
            &[],
        )
    }

    /// Creates a channel splitter with `channels` mono outputs.
    pub fn create_channel_splitter(&mut self, channels: u32) -> NativeId {
        self.add_node(
            NativeKind::ChannelSplitter { channels },
            1,
            channels.max(1),
            &[],
        )
    }

    /// Creates an analyser tap.
    pub fn create_analyser(&mut self) -> NativeId {
        self.add_node(NativeKind::Analyser, 1, 1, &[])
    }

    /// Creates a live-capture source node.
    ///
    /// Acquiring the stream itself is the host's concern and out of
    /// scope here; the node is the graph-side anchor for it.
    pub fn create_media_stream_source(&mut self) -> NativeId {
        self.add_node(NativeKind::MediaStreamSource, 0, 1, &[])
    }

    // --- Buffers ---

    /// Allocates a zeroed sample buffer.
    pub fn create_buffer(
        &mut self,
        channels: u32,
        frames: usize,
        sample_rate: f32,
    ) -> Result<BufferId, EngineError> {
        if channels == 0 {
            return Err(EngineError::invalid_state(
                "a buffer needs at least one channel",
            ));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EngineError::invalid_state(format!(
                "buffer sample rate {sample_rate} Hz is not usable"
            )));
        }
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(BufferData {
            channels: vec![vec![0.0; frames]; channels as usize],
            sample_rate,
        });
        Ok(id)
    }

    /// Number of channels in a buffer.
    pub fn buffer_channels(&self, buffer: BufferId) -> Result<u32, EngineError> {
        Ok(self.buffer_data(buffer)?.channels.len() as u32)
    }

    /// Number of frames in a buffer.
    pub fn buffer_frames(&self, buffer: BufferId) -> Result<usize, EngineError> {
        Ok(self
            .buffer_data(buffer)?
            .channels
            .first()
            .map_or(0, Vec::len))
    }

    /// Sample rate a buffer's data was produced at.
    pub fn buffer_sample_rate(&self, buffer: BufferId) -> Result<f32, EngineError> {
        Ok(self.buffer_data(buffer)?.sample_rate)
    }

    /// Read access to one channel of a buffer.
    pub fn buffer_channel(&self, buffer: BufferId, channel: u32) -> Result<&[f32], EngineError> {
        let data = self.buffer_data(buffer)?;
        data.channels
            .get(channel as usize)
            .map(Vec::as_slice)
            .ok_or(EngineError::BufferChannel {
                buffer,
                index: channel,
                channels: data.channels.len() as u32,
            })
    }

    /// Write access to one channel of a buffer.
    pub fn buffer_channel_mut(
        &mut self,
        buffer: BufferId,
        channel: u32,
    ) -> Result<&mut [f32], EngineError> {
        let data = self
            .buffers
            .get_mut(buffer.0 as usize)
            .ok_or(EngineError::BufferNotFound(buffer))?;
        let channels = data.channels.len() as u32;
        data.channels
            .get_mut(channel as usize)
            .map(Vec::as_mut_slice)
            .ok_or(EngineError::BufferChannel {
                buffer,
                index: channel,
                channels,
            })
    }

    /// Creates a one-shot source playing `buffer`.
    pub fn create_buffer_source(&mut self, buffer: BufferId) -> Result<NativeId, EngineError> {
        self.buffer_data(buffer)?;
        Ok(self.add_node(
            NativeKind::BufferSource {
                buffer,
                looping: false,
            },
            0,
            1,
            &[],
        ))
    }

    /// Sets whether a buffer source wraps at the buffer end.
    pub fn set_source_looping(&mut self, node: NativeId, looping: bool) -> Result<(), EngineError> {
        let data = self.node_mut(node)?;
        match &mut data.kind {
            NativeKind::BufferSource { looping: flag, .. } => {
                *flag = looping;
                Ok(())
            }
            other => Err(EngineError::invalid_state(format!(
                "{} node cannot loop",
                other.name()
            ))),
        }
    }

    /// Replaces a wave shaper's transfer curve.
    pub fn set_wave_shaper_curve(
        &mut self,
        node: NativeId,
        curve: Vec<f32>,
    ) -> Result<(), EngineError> {
        let data = self.node_mut(node)?;
        match &mut data.kind {
            NativeKind::WaveShaper { curve: slot } => {
                *slot = curve;
                Ok(())
            }
            other => Err(EngineError::invalid_state(format!(
                "{} node has no transfer curve",
                other.name()
            ))),
        }
    }

    // --- Wiring ---

    /// Connects `source`'s output 0 to `target` (input 0 for nodes).
    pub fn connect(
        &mut self,
        source: NativeId,
        target: impl Into<ConnectTarget>,
    ) -> Result<(), EngineError> {
        self.connect_indexed(source, target.into(), 0, 0)
    }

    /// Connects with explicit output/input channel indices.
    ///
    /// Reconnecting an already-present edge is a no-op; the engine
    /// collapses duplicates.
    pub fn connect_indexed(
        &mut self,
        source: NativeId,
        target: impl Into<ConnectTarget>,
        output_index: u32,
        input_index: u32,
    ) -> Result<(), EngineError> {
        let target = target.into();
        let source_data = self.node_data(source)?;
        if source_data.outputs == 0 {
            return Err(EngineError::invalid_state(format!(
                "{} node has no outputs",
                source_data.kind.name()
            )));
        }
        if output_index >= source_data.outputs {
            return Err(EngineError::InvalidChannel {
                node: source,
                index: output_index,
                channels: source_data.outputs,
            });
        }

        match target {
            ConnectTarget::Node(dest) => {
                let dest_data = self.node_data(dest)?;
                if dest_data.inputs == 0 {
                    return Err(EngineError::invalid_state(format!(
                        "{} node has no inputs",
                        dest_data.kind.name()
                    )));
                }
                if input_index >= dest_data.inputs {
                    return Err(EngineError::InvalidChannel {
                        node: dest,
                        index: input_index,
                        channels: dest_data.inputs,
                    });
                }
            }
            ConnectTarget::Param(param) => {
                self.param_data(param)?;
            }
        }

        let connection = Connection {
            source,
            target,
            output_index,
            input_index,
        };
        if !self.connections.contains(&connection) {
            debug!(%source, ?target, output_index, input_index, "engine_connect");
            self.connections.push(connection);
        }
        Ok(())
    }

    /// Severs every connection leaving `source`.
    pub fn disconnect(&mut self, source: NativeId) -> Result<(), EngineError> {
        self.node_data(source)?;
        let before = self.connections.len();
        self.connections.retain(|c| c.source != source);
        debug!(%source, removed = before - self.connections.len(), "engine_disconnect");
        Ok(())
    }

    /// Severs the specific edges from `source` to `target`, at any
    /// channel indices.
    pub fn disconnect_pair(
        &mut self,
        source: NativeId,
        target: impl Into<ConnectTarget>,
    ) -> Result<(), EngineError> {
        self.node_data(source)?;
        let target = target.into();
        self.connections
            .retain(|c| !(c.source == source && c.target == target));
        Ok(())
    }

    /// The current connection table.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    // --- Parameters ---

    /// Looks up a node's automatable parameter by wire name.
    pub fn param(&self, node: NativeId, name: &str) -> Result<ParamId, EngineError> {
        let data = self.node_data(node)?;
        data.param(name)
            .ok_or_else(|| EngineError::param_not_found(data.id, name))
    }

    /// The parameter names a node exposes, in declaration order.
    pub fn param_names(&self, node: NativeId) -> Result<Vec<&'static str>, EngineError> {
        Ok(self.node_data(node)?.params.iter().map(|&(n, _)| n).collect())
    }

    /// Evaluates a parameter at the current clock time.
    pub fn value(&self, param: ParamId) -> Result<f32, EngineError> {
        Ok(self.param_data(param)?.value_at(self.current_time))
    }

    /// Evaluates a parameter at an arbitrary absolute time.
    pub fn value_at(&self, param: ParamId, time: f64) -> Result<f32, EngineError> {
        Ok(self.param_data(param)?.value_at(time))
    }

    /// Sets a parameter now (a step at the current clock time).
    pub fn set_value(&mut self, param: ParamId, value: f32) -> Result<(), EngineError> {
        let time = self.current_time;
        self.set_value_at_time(param, value, time)
    }

    /// Schedules a step to `value` at absolute time `time`.
    pub fn set_value_at_time(
        &mut self,
        param: ParamId,
        value: f32,
        time: f64,
    ) -> Result<(), EngineError> {
        self.param_data_mut(param)?
            .schedule(AutomationEvent::SetValue { value, time });
        Ok(())
    }

    /// Schedules a linear ramp landing on `value` at `time`.
    pub fn linear_ramp_to_value_at_time(
        &mut self,
        param: ParamId,
        value: f32,
        time: f64,
    ) -> Result<(), EngineError> {
        self.param_data_mut(param)?
            .schedule(AutomationEvent::LinearRamp { value, time });
        Ok(())
    }

    /// Schedules an exponential approach toward `target` from `time`.
    pub fn set_target_at_time(
        &mut self,
        param: ParamId,
        target: f32,
        time: f64,
        time_constant: f64,
    ) -> Result<(), EngineError> {
        self.param_data_mut(param)?.schedule(AutomationEvent::SetTarget {
            target,
            time,
            time_constant,
        });
        Ok(())
    }

    /// Drops every scheduled event at or after `time`. The only
    /// cancellation primitive.
    pub fn cancel_scheduled_values(
        &mut self,
        param: ParamId,
        time: f64,
    ) -> Result<(), EngineError> {
        self.param_data_mut(param)?.cancel_from(time);
        Ok(())
    }

    /// The parameter's scheduled timeline, ordered by time.
    pub fn scheduled_events(&self, param: ParamId) -> Result<&[AutomationEvent], EngineError> {
        Ok(self.param_data(param)?.events())
    }

    // --- Source lifecycle ---

    /// Starts a source at `when` (modern surface).
    ///
    /// # Errors
    ///
    /// [`EngineError::Unsupported`] under the legacy profile. Callers
    /// probe [`capabilities`](Self::capabilities) once and fall back to
    /// [`note_on`](Self::note_on).
    pub fn start_source(&mut self, node: NativeId, when: f64) -> Result<(), EngineError> {
        if self.config.source_api != SourceApi::Modern {
            return Err(EngineError::unsupported(
                "host has no start(); use note_on()",
            ));
        }
        self.begin_source(node, when)
    }

    /// Stops a source at `when` (modern surface).
    pub fn stop_source(&mut self, node: NativeId, when: f64) -> Result<(), EngineError> {
        if self.config.source_api != SourceApi::Modern {
            return Err(EngineError::unsupported(
                "host has no stop(); use note_off()",
            ));
        }
        self.end_source(node, when)
    }

    /// Starts a source at `when` (legacy name, always present).
    pub fn note_on(&mut self, node: NativeId, when: f64) -> Result<(), EngineError> {
        self.begin_source(node, when)
    }

    /// Stops a source at `when` (legacy name, always present).
    pub fn note_off(&mut self, node: NativeId, when: f64) -> Result<(), EngineError> {
        self.end_source(node, when)
    }

    /// Scheduled start time of a source, if it has one.
    pub fn source_started_at(&self, node: NativeId) -> Result<Option<f64>, EngineError> {
        let data = self.node_data(node)?;
        Ok(data.source.and_then(|s| s.started_at))
    }

    /// Scheduled stop time of a source, if it has one.
    pub fn source_stopped_at(&self, node: NativeId) -> Result<Option<f64>, EngineError> {
        let data = self.node_data(node)?;
        Ok(data.source.and_then(|s| s.stopped_at))
    }

    /// A node's kind.
    pub fn node_kind(&self, node: NativeId) -> Result<&NativeKind, EngineError> {
        Ok(&self.node_data(node)?.kind)
    }

    // --- Internals ---

    fn add_node(
        &mut self,
        kind: NativeKind,
        inputs: u32,
        outputs: u32,
        params: &[(&'static str, f32)],
    ) -> NativeId {
        let id = NativeId(self.nodes.len() as u32);
        let mut data = NativeNodeData::new(id, kind, inputs, outputs);
        for &(name, default) in params {
            let param = ParamId(self.params.len() as u32);
            self.params.push(AudioParam::new(default));
            data.params.push((name, param));
        }
        debug!(%id, kind = data.kind.name(), "engine_create");
        self.nodes.push(data);
        id
    }

    fn begin_source(&mut self, node: NativeId, when: f64) -> Result<(), EngineError> {
        let data = self.node_mut(node)?;
        let kind = data.kind.name();
        match &mut data.source {
            Some(state) => {
                if state.started_at.is_some() {
                    return Err(EngineError::invalid_state(format!(
                        "{kind} source already started"
                    )));
                }
                state.started_at = Some(when);
                Ok(())
            }
            None => Err(EngineError::invalid_state(format!(
                "{kind} node is not a source"
            ))),
        }
    }

    fn end_source(&mut self, node: NativeId, when: f64) -> Result<(), EngineError> {
        let data = self.node_mut(node)?;
        let kind = data.kind.name();
        match &mut data.source {
            Some(state) => {
                if state.started_at.is_none() {
                    return Err(EngineError::invalid_state(format!(
                        "{kind} source stopped before it was started"
                    )));
                }
                state.stopped_at = Some(when);
                Ok(())
            }
            None => Err(EngineError::invalid_state(format!(
                "{kind} node is not a source"
            ))),
        }
    }

    fn node_data(&self, node: NativeId) -> Result<&NativeNodeData, EngineError> {
        self.nodes
            .get(node.0 as usize)
            .ok_or(EngineError::NodeNotFound(node))
    }

    fn node_mut(&mut self, node: NativeId) -> Result<&mut NativeNodeData, EngineError> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(EngineError::NodeNotFound(node))
    }

    fn param_data(&self, param: ParamId) -> Result<&AudioParam, EngineError> {
        self.params.get(param.0 as usize).ok_or_else(|| {
            EngineError::invalid_state(format!("{param} does not exist in this context"))
        })
    }

    fn param_data_mut(&mut self, param: ParamId) -> Result<&mut AudioParam, EngineError> {
        self.params.get_mut(param.0 as usize).ok_or_else(|| {
            EngineError::invalid_state(format!("{param} does not exist in this context"))
        })
    }

    fn buffer_data(&self, buffer: BufferId) -> Result<&BufferData, EngineError> {
        self.buffers
            .get(buffer.0 as usize)
            .ok_or(EngineError::BufferNotFound(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AudioContext {
        AudioContext::new(ContextConfig::default()).expect("default context")
    }

    #[test]
    fn rejects_unusable_sample_rate() {
        let config = ContextConfig {
            sample_rate: 0.0,
            ..ContextConfig::default()
        };
        assert!(matches!(
            AudioContext::new(config),
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn clock_is_monotonic() {
        let mut ctx = ctx();
        assert_eq!(ctx.current_time(), 0.0);
        ctx.advance(0.5).unwrap();
        ctx.advance(0.25).unwrap();
        assert!((ctx.current_time() - 0.75).abs() < 1e-12);
        assert!(ctx.advance(-1.0).is_err());
    }

    #[test]
    fn connect_records_one_edge() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator();
        let gain = ctx.create_gain();

        ctx.connect(osc, gain).unwrap();
        assert_eq!(ctx.connections().len(), 1);
        assert_eq!(ctx.connections()[0].source, osc);
        assert_eq!(ctx.connections()[0].target, ConnectTarget::Node(gain));
    }

    #[test]
    fn duplicate_connect_is_collapsed() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator();
        let gain = ctx.create_gain();

        ctx.connect(osc, gain).unwrap();
        ctx.connect(osc, gain).unwrap();
        assert_eq!(ctx.connections().len(), 1);
    }

    #[test]
    fn connect_into_pure_source_fails() {
        let mut ctx = ctx();
        let gain = ctx.create_gain();
        let osc = ctx.create_oscillator();

        assert!(matches!(
            ctx.connect(gain, osc),
            Err(EngineError::InvalidState { .. })
        ));
    }

    #[test]
    fn channel_indices_are_validated() {
        let mut ctx = ctx();
        let gain = ctx.create_gain();
        let merger = ctx.create_channel_merger(2);

        ctx.connect_indexed(gain, merger, 0, 1).unwrap();
        assert!(matches!(
            ctx.connect_indexed(gain, merger, 0, 2),
            Err(EngineError::InvalidChannel { index: 2, .. })
        ));
    }

    #[test]
    fn disconnect_severs_outgoing_only() {
        let mut ctx = ctx();
        let a = ctx.create_gain();
        let b = ctx.create_gain();
        let c = ctx.create_gain();

        ctx.connect(a, b).unwrap();
        ctx.connect(b, c).unwrap();
        ctx.disconnect(b).unwrap();

        assert_eq!(ctx.connections().len(), 1);
        assert_eq!(ctx.connections()[0].source, a);
    }

    #[test]
    fn connect_to_param_is_recorded() {
        let mut ctx = ctx();
        let lfo = ctx.create_oscillator();
        let carrier = ctx.create_oscillator();
        let freq = ctx.param(carrier, "frequency").unwrap();

        ctx.connect(lfo, freq).unwrap();
        assert_eq!(ctx.connections()[0].target, ConnectTarget::Param(freq));

        ctx.disconnect_pair(lfo, freq).unwrap();
        assert!(ctx.connections().is_empty());
    }

    #[test]
    fn scheduled_value_invisible_until_its_time() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator();
        let freq = ctx.param(osc, "frequency").unwrap();

        ctx.set_value_at_time(freq, 880.0, 1.0).unwrap();
        assert_eq!(ctx.value(freq).unwrap(), 440.0);

        ctx.advance(1.0).unwrap();
        assert_eq!(ctx.value(freq).unwrap(), 880.0);
    }

    #[test]
    fn legacy_profile_rejects_modern_names() {
        let config = ContextConfig {
            source_api: SourceApi::Legacy,
            ..ContextConfig::default()
        };
        let mut ctx = AudioContext::new(config).unwrap();
        let osc = ctx.create_oscillator();

        assert!(matches!(
            ctx.start_source(osc, 0.0),
            Err(EngineError::Unsupported { .. })
        ));
        ctx.note_on(osc, 0.0).unwrap();
        assert_eq!(ctx.source_started_at(osc).unwrap(), Some(0.0));
    }

    #[test]
    fn sources_are_one_shot() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator();

        assert!(ctx.stop_source(osc, 0.0).is_err());
        ctx.start_source(osc, 0.0).unwrap();
        assert!(ctx.start_source(osc, 1.0).is_err());
        ctx.stop_source(osc, 2.0).unwrap();
        assert_eq!(ctx.source_stopped_at(osc).unwrap(), Some(2.0));
    }

    #[test]
    fn non_source_cannot_start() {
        let mut ctx = ctx();
        let gain = ctx.create_gain();
        assert!(ctx.start_source(gain, 0.0).is_err());
    }

    #[test]
    fn buffers_round_trip_data() {
        let mut ctx = ctx();
        let buffer = ctx.create_buffer(2, 4, 44100.0).unwrap();

        ctx.buffer_channel_mut(buffer, 0).unwrap()[1] = 0.5;
        assert_eq!(ctx.buffer_channel(buffer, 0).unwrap()[1], 0.5);
        assert_eq!(ctx.buffer_channels(buffer).unwrap(), 2);
        assert_eq!(ctx.buffer_frames(buffer).unwrap(), 4);
        assert!(ctx.buffer_channel(buffer, 2).is_err());
    }

    #[test]
    fn buffer_source_requires_existing_buffer() {
        let mut ctx = ctx();
        assert!(ctx.create_buffer_source(BufferId(7)).is_err());

        let buffer = ctx.create_buffer(1, 8, 44100.0).unwrap();
        let source = ctx.create_buffer_source(buffer).unwrap();
        ctx.set_source_looping(source, true).unwrap();
        assert!(matches!(
            ctx.node_kind(source).unwrap(),
            NativeKind::BufferSource { looping: true, .. }
        ));
    }
}
