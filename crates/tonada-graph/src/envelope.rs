//! ADSR parameter automation.
//!
//! An envelope node carries an immutable [`EnvelopeConfig`] and, once
//! bound, writes an attack/decay/sustain/release curve onto one
//! automatable parameter. Levels are relative: every start recomputes
//! the absolute attack peak and sustain plateau from the stored
//! configuration, so repeated starts produce identical schedules
//! instead of compounding.
//!
//! All times are absolute seconds on the engine clock. The decay and
//! release segments are exponential approaches; they near their target
//! asymptotically and never exactly reach it.

use tracing::debug;

use crate::error::GraphError;
use crate::node::{NodeId, NodeRole, NodeType};
use crate::system::AudioSystem;

/// Relative levels and segment lengths for an envelope.
///
/// Kept immutable for the envelope's lifetime; absolute levels are
/// derived fresh on every start.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeConfig {
    /// Level the curve starts from.
    pub start_level: f32,
    /// Attack peak, relative to `start_level`.
    pub max_level: f32,
    /// Level the release settles toward.
    pub min_level: f32,
    /// Sustain plateau, relative to `start_level`.
    pub sustain_level: f32,
    /// Seconds from start to the attack peak.
    pub attack_time: f64,
    /// Seconds from the peak to the sustain plateau.
    pub decay_time: f64,
    /// Seconds the release segment lasts.
    pub release_time: f64,
    /// When true, the release is scheduled as part of `start` and the
    /// bound node is stopped when it completes; explicit `stop` calls
    /// then do nothing.
    pub auto_stop: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            start_level: 0.0,
            max_level: 1.0,
            min_level: 0.0,
            sustain_level: 0.0,
            attack_time: 0.0,
            decay_time: 0.0,
            release_time: 0.0,
            auto_stop: false,
        }
    }
}

impl AudioSystem {
    /// Creates an envelope node holding `config`. Inert until bound
    /// with [`bind_envelope`](Self::bind_envelope).
    pub fn envelope(&mut self, config: EnvelopeConfig) -> NodeId {
        let id = self.make_node(NodeType::Envelope, None);
        self.nodes[id.0 as usize].role = NodeRole::Envelope {
            config,
            param: None,
            bound: None,
        };
        id
    }

    /// Binds the envelope to `target`'s parameter `param`.
    ///
    /// The target node is also remembered so an auto-stop envelope can
    /// schedule that node's own stop.
    pub fn bind_envelope(
        &mut self,
        envelope: NodeId,
        target: NodeId,
        param: &str,
    ) -> Result<(), GraphError> {
        let param_id = self.resolve_param(target, param)?;
        let data = self.node_data_mut(envelope)?;
        if let NodeRole::Envelope { param, bound, .. } = &mut data.role {
            *param = Some(param_id);
            *bound = Some(target);
            return Ok(());
        }
        Err(self.wrong_type(envelope, "envelope"))
    }

    /// Runs the envelope from `at` (default: now).
    ///
    /// Pending automation on the bound parameter at or after `at` is
    /// cancelled, then the curve is scheduled: step to the start level,
    /// linear ramp to the attack peak, exponential approach to the
    /// sustain plateau. Under `auto_stop` the release ramp and the
    /// bound node's stop are scheduled here as well.
    pub fn start_envelope(&mut self, envelope: NodeId, at: Option<f64>) -> Result<(), GraphError> {
        let (config, param, bound) = self.envelope_state(envelope)?;
        let param = param.ok_or(GraphError::NoBoundParam(envelope))?;

        let start = at.unwrap_or_else(|| self.ctx.current_time());
        let attack_end = start + config.attack_time;
        let decay_end = attack_end + config.decay_time;
        let release_end = decay_end + config.release_time;

        // Absolute levels, derived fresh from the relative config.
        let peak = config.start_level + config.max_level;
        let sustain = config.start_level + config.sustain_level;

        self.ctx.cancel_scheduled_values(param, start)?;
        self.ctx.set_value_at_time(param, config.start_level, start)?;
        self.ctx.linear_ramp_to_value_at_time(param, peak, attack_end)?;

        if config.decay_time > 0.0 {
            self.ctx
                .set_target_at_time(param, sustain, attack_end, config.decay_time / 3.0)?;
        } else {
            self.ctx.set_value_at_time(param, sustain, attack_end)?;
        }

        if config.auto_stop {
            // The release ramp anchors at the previous timeline event.
            // Pin the decay's settled value at its end so the ramp spans
            // the release window only, not the whole decay.
            if config.decay_time > 0.0 {
                let settled = sustain + (peak - sustain) * (-3.0f32).exp();
                self.ctx.set_value_at_time(param, settled, decay_end)?;
            }
            self.ctx
                .linear_ramp_to_value_at_time(param, config.min_level, release_end)?;
            let bound = bound.ok_or(GraphError::NoBoundParam(envelope))?;
            self.stop_node(bound, Some(release_end))?;
        }

        debug!(%envelope, start, "envelope_started");
        Ok(())
    }

    /// Releases the envelope from `at` (default: now).
    ///
    /// Only meaningful when the envelope is not auto-stopping; an
    /// auto-stop envelope scheduled its release at start time and this
    /// call does nothing. The approach begins `release_time` after `at`
    /// with a time constant of a tenth of the release.
    pub fn stop_envelope(&mut self, envelope: NodeId, at: Option<f64>) -> Result<(), GraphError> {
        let (config, param, _) = self.envelope_state(envelope)?;
        if config.auto_stop {
            return Ok(());
        }
        let param = param.ok_or(GraphError::NoBoundParam(envelope))?;

        let release_at = at.unwrap_or_else(|| self.ctx.current_time()) + config.release_time;
        if config.release_time > 0.0 {
            self.ctx.set_target_at_time(
                param,
                config.min_level,
                release_at,
                config.release_time / 10.0,
            )?;
        } else {
            self.ctx.set_value_at_time(param, config.min_level, release_at)?;
        }

        debug!(%envelope, release_at, "envelope_released");
        Ok(())
    }

    /// The immutable configuration an envelope node was built with.
    pub fn envelope_config(&self, envelope: NodeId) -> Result<EnvelopeConfig, GraphError> {
        Ok(self.envelope_state(envelope)?.0)
    }

    fn envelope_state(
        &self,
        envelope: NodeId,
    ) -> Result<
        (
            EnvelopeConfig,
            Option<tonada_engine::ParamId>,
            Option<NodeId>,
        ),
        GraphError,
    > {
        match self.node_data(envelope)?.role {
            NodeRole::Envelope {
                config,
                param,
                bound,
            } => Ok((config, param, bound)),
            _ => Err(self.wrong_type(envelope, "envelope")),
        }
    }

    pub(crate) fn wrong_type(&self, node: NodeId, expected: &'static str) -> GraphError {
        let node_type = self
            .node_data(node)
            .map_or("unknown", |data| data.node_type.name());
        GraphError::WrongNodeType {
            node,
            node_type,
            expected,
        }
    }
}
