//! Low-frequency modulation routes.
//!
//! An LFO node is an oscillator wired into a depth-scaling gain stage.
//! The depth stage stays unconnected until a target parameter is chosen
//! with [`modulate`](AudioSystem::modulate); a route drives at most one
//! target at a time, so retargeting severs the previous connection
//! before wiring the new one.

use tracing::debug;

use crate::error::GraphError;
use crate::node::{AttrValue, NodeId, NodeRole, NodeType};
use crate::system::AudioSystem;

/// Construction settings for an LFO node.
#[derive(Debug, Clone)]
pub struct LfoConfig {
    /// Oscillation rate in Hz.
    pub frequency: f32,
    /// Modulation depth; scales the oscillator's output.
    pub depth: f32,
    /// Waveform name stored on the node.
    pub wave: String,
    /// Start oscillating immediately on creation.
    pub auto_start: bool,
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self {
            frequency: 0.0,
            depth: 1.0,
            wave: "triangle".to_owned(),
            auto_start: false,
        }
    }
}

impl AudioSystem {
    /// Creates an LFO node: an oscillator feeding a depth gain.
    pub fn lfo(&mut self, config: LfoConfig) -> Result<NodeId, GraphError> {
        let osc = self.ctx.create_oscillator();
        let depth = self.ctx.create_gain();
        self.set_native_param(osc, "frequency", config.frequency);
        self.set_native_param(depth, "gain", config.depth);
        self.ctx.connect(osc, depth)?;

        let id = self.make_node(NodeType::Lfo, Some(osc));
        self.adopt_params(id, osc, &["frequency"]);
        let depth_param = self.ctx.param(depth, "gain")?;
        self.nodes[id.0 as usize].params.push(("depth", depth_param));
        self.nodes[id.0 as usize].role = NodeRole::Lfo {
            osc,
            depth,
            target: None,
        };
        self.nodes[id.0 as usize]
            .attrs
            .insert("type".to_owned(), AttrValue::Text(config.wave));

        if config.auto_start {
            self.start_node(id, None)?;
        }
        Ok(id)
    }

    /// Points the route at `target`'s parameter `param`.
    ///
    /// A previously bound target is disconnected first; the depth stage
    /// holds at most one live connection.
    pub fn modulate(
        &mut self,
        lfo: NodeId,
        target: NodeId,
        param: &str,
    ) -> Result<(), GraphError> {
        let param_id = self.resolve_param(target, param)?;

        let (depth, previous) = match self.node_data(lfo)?.role {
            NodeRole::Lfo { depth, target, .. } => (depth, target),
            _ => return Err(self.wrong_type(lfo, "lfo")),
        };

        if let Some(previous) = previous {
            self.ctx.disconnect_pair(depth, previous)?;
            debug!(%lfo, "modulation_retargeted");
        }
        self.ctx.connect(depth, param_id)?;

        if let NodeRole::Lfo { target, .. } = &mut self.node_data_mut(lfo)?.role {
            *target = Some(param_id);
        }
        Ok(())
    }
}
