//! Stereo panning by gain split.
//!
//! A panner fans its input into a left and a right gain stage, feeds
//! each into one channel of a 2-channel merge primitive, and exposes the
//! merge as its output. The scalar pan position drives the two gains:
//! left falls linearly from 1 at full left to 0 at full right, and the
//! right gain is its complement.

use crate::error::GraphError;
use crate::node::{AttrValue, NodeId, NodeRole, NodeType};
use crate::system::AudioSystem;

/// Left and right gains for a pan position.
///
/// `pan` is clamped to `[-1, 1]` before the split is computed.
pub fn stereo_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    let left = 1.0 - 0.01 * ((1.0 + pan) / 2.0) * 100.0;
    (left, 1.0 - left)
}

impl AudioSystem {
    /// Creates a stereo panner at the given pan position.
    pub fn panner(&mut self, pan: f32) -> Result<NodeId, GraphError> {
        let (left_gain, right_gain) = stereo_gains(pan);

        let left = self.ctx.create_gain();
        let right = self.ctx.create_gain();
        let merger = self.ctx.create_channel_merger(2);
        self.set_native_param(left, "gain", left_gain);
        self.set_native_param(right, "gain", right_gain);

        let id = self.make_node(NodeType::Panner, None);
        let data = &self.nodes[id.0 as usize];
        let (input, output) = (data.input, data.output);

        if let Some(input) = input {
            self.ctx.connect(input, left)?;
            self.ctx.connect(input, right)?;
        }
        self.ctx.connect_indexed(left, merger, 0, 0)?;
        self.ctx.connect_indexed(right, merger, 0, 1)?;
        self.ctx.connect(merger, output)?;

        let left_param = self.ctx.param(left, "gain")?;
        let right_param = self.ctx.param(right, "gain")?;
        self.nodes[id.0 as usize].role = NodeRole::Panner {
            left: left_param,
            right: right_param,
        };
        self.nodes[id.0 as usize]
            .attrs
            .insert("pan".to_owned(), AttrValue::Float(pan.clamp(-1.0, 1.0)));
        Ok(id)
    }

    /// Moves the panner to a new pan position.
    pub fn set_pan(&mut self, panner: NodeId, pan: f32) -> Result<(), GraphError> {
        let (left, right) = match self.node_data(panner)?.role {
            NodeRole::Panner { left, right } => (left, right),
            _ => return Err(self.wrong_type(panner, "panner")),
        };

        let (left_gain, right_gain) = stereo_gains(pan);
        self.ctx.set_value(left, left_gain)?;
        self.ctx.set_value(right, right_gain)?;
        self.set_attr(panner, "pan", pan.clamp(-1.0, 1.0))?;
        Ok(())
    }

    /// The panner's current pan position.
    pub fn pan(&self, panner: NodeId) -> Result<f32, GraphError> {
        match self.node_data(panner)?.role {
            NodeRole::Panner { .. } => {}
            _ => return Err(self.wrong_type(panner, "panner")),
        }
        self.attr(panner, "pan")?
            .as_float()
            .ok_or_else(|| GraphError::UnknownAttr {
                node: panner,
                name: "pan".to_owned(),
            })
    }

    /// The left and right gain values currently applied.
    pub fn pan_gains(&self, panner: NodeId) -> Result<(f32, f32), GraphError> {
        match self.node_data(panner)?.role {
            NodeRole::Panner { left, right } => {
                Ok((self.ctx.value(left)?, self.ctx.value(right)?))
            }
            _ => Err(self.wrong_type(panner, "panner")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonada_engine::ContextConfig;

    fn system() -> AudioSystem {
        AudioSystem::new(ContextConfig::default()).expect("default system")
    }

    #[test]
    fn formula_endpoints_and_centre() {
        assert_eq!(stereo_gains(-1.0), (1.0, 0.0));
        assert_eq!(stereo_gains(0.0), (0.5, 0.5));
        assert_eq!(stereo_gains(1.0), (0.0, 1.0));
    }

    #[test]
    fn out_of_range_pans_are_clamped() {
        assert_eq!(stereo_gains(-7.0), stereo_gains(-1.0));
        assert_eq!(stereo_gains(2.5), stereo_gains(1.0));
    }

    #[test]
    fn complementary_gains_sum_to_one() {
        for pan in [-1.0, -0.56, 0.0, 0.2, 0.99, 1.0] {
            let (left, right) = stereo_gains(pan);
            assert!((left + right - 1.0).abs() < 1e-6, "pan {pan}");
        }
    }

    #[test]
    fn panner_applies_the_split() {
        let mut sys = system();
        let panner = sys.panner(0.2).unwrap();

        let (left, right) = sys.pan_gains(panner).unwrap();
        assert!((left - 0.4).abs() < 1e-6);
        assert!((right - 0.6).abs() < 1e-6);
        assert_eq!(sys.pan(panner).unwrap(), 0.2);
    }

    #[test]
    fn set_pan_recomputes_both_gains() {
        let mut sys = system();
        let panner = sys.panner(0.0).unwrap();

        sys.set_pan(panner, -1.0).unwrap();
        assert_eq!(sys.pan_gains(panner).unwrap(), (1.0, 0.0));

        sys.set_pan(panner, 3.0).unwrap();
        assert_eq!(sys.pan(panner).unwrap(), 1.0, "stored pan is clamped");
        assert_eq!(sys.pan_gains(panner).unwrap(), (0.0, 1.0));
    }

    #[test]
    fn only_panners_can_pan() {
        let mut sys = system();
        let gain = sys.gain(1.0);
        assert!(matches!(
            sys.set_pan(gain, 0.0),
            Err(GraphError::WrongNodeType { .. })
        ));
    }
}
