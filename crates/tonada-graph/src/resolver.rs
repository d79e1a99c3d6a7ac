//! The heterogeneous connection resolver.
//!
//! `connect` takes an ordered list of endpoints and wires each adjacent
//! pair, dispatching on the pair of [`EndpointKind`]s. Groups fan out:
//! a group against a single endpoint connects every element to that
//! endpoint individually, recursively, and a group against a group
//! connects pairwise, element i to element i. Channel endpoints only
//! pair with each other and narrow their nodes to one channel each: the
//! source side's index selects the output channel, the target side's
//! index the input channel.
//!
//! Every pair either resolves or fails with a typed error; there is no
//! combination the resolver skips silently.

use tracing::debug;

use tonada_engine::NativeId;

use crate::endpoint::{Endpoint, EndpointKind};
use crate::error::GraphError;
use crate::node::NodeId;
use crate::system::AudioSystem;

impl AudioSystem {
    /// Connects each adjacent pair of `endpoints` in order.
    ///
    /// At least two endpoints are required. Fan-out over groups issues
    /// one engine connect per reached pair; a resolved pair of wrapped
    /// nodes is also recorded in both nodes' `connected_to` bookkeeping.
    pub fn connect<I>(&mut self, endpoints: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let endpoints: Vec<Endpoint> = endpoints.into_iter().collect();
        if endpoints.len() < 2 {
            return Err(GraphError::TooFewEndpoints {
                count: endpoints.len(),
            });
        }
        for pair in endpoints.windows(2) {
            self.link(pair[0].clone(), pair[1].clone())?;
        }
        Ok(())
    }

    /// Disconnects each endpoint from everything it feeds.
    ///
    /// A wrapped node's true connections live on its ports, so both
    /// ports and the wrapped source are severed, and the bookkeeping on
    /// the node and its peers is cleared. Groups and channel endpoints
    /// recurse to the nodes they name.
    pub fn disconnect<I>(&mut self, endpoints: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = Endpoint>,
    {
        for endpoint in endpoints {
            match endpoint {
                Endpoint::Native(native) => {
                    self.ctx.disconnect(native)?;
                }
                Endpoint::Node(id) => self.disconnect_node(id)?,
                Endpoint::Channel { node, .. } => self.disconnect([*node])?,
                Endpoint::Group(items) => self.disconnect(items)?,
            }
        }
        Ok(())
    }

    fn disconnect_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let data = self.node_data(id)?;
        let (input, output, source) = (data.input, data.output, data.source);

        self.ctx.disconnect(output)?;
        if let Some(input) = input {
            self.ctx.disconnect(input)?;
        }
        if let Some(source) = source {
            self.ctx.disconnect(source)?;
        }

        let peers = std::mem::take(&mut self.node_data_mut(id)?.connected_to);
        for peer in peers {
            if let Ok(peer_data) = self.node_data_mut(peer) {
                peer_data.connected_to.retain(|&n| n != id);
            }
        }
        debug!(%id, "node_disconnected");
        Ok(())
    }

    /// Resolves one ordered endpoint pair.
    fn link(&mut self, left: Endpoint, right: Endpoint) -> Result<(), GraphError> {
        match (left, right) {
            // Pairwise zip; fanning both sides out at once has no
            // single defensible meaning.
            (Endpoint::Group(lefts), Endpoint::Group(rights)) => {
                if lefts.len() != rights.len() {
                    return Err(GraphError::GroupLengthMismatch {
                        left: lefts.len(),
                        right: rights.len(),
                    });
                }
                for (l, r) in lefts.into_iter().zip(rights) {
                    self.link(l, r)?;
                }
                Ok(())
            }
            (Endpoint::Group(lefts), right) => {
                for l in lefts {
                    self.link(l, right.clone())?;
                }
                Ok(())
            }
            (left, Endpoint::Group(rights)) => {
                for r in rights {
                    self.link(left.clone(), r)?;
                }
                Ok(())
            }
            (left, right) => {
                let pair = (left.kind(), right.kind());
                // A channel endpoint only pairs with another channel
                // endpoint; a plain peer has no index to honour.
                if (pair.0 == EndpointKind::Channel) != (pair.1 == EndpointKind::Channel) {
                    return Err(GraphError::unsupported_pair(
                        pair.0,
                        pair.1,
                        "channel endpoints pair only with channel endpoints",
                    ));
                }
                let (src, output_index) = self.source_side(&left, pair)?;
                let (dst, input_index) = self.target_side(&right, pair)?;
                self.ctx.connect_indexed(src, dst, output_index, input_index)?;
                debug!(%src, %dst, output_index, input_index, "pair_connected");

                if let (Some(a), Some(b)) = (wrapped_id(&left), wrapped_id(&right)) {
                    self.node_data_mut(a)?.connected_to.push(b);
                    self.node_data_mut(b)?.connected_to.push(a);
                }
                Ok(())
            }
        }
    }

    /// The native primitive and output channel a pair's source side
    /// resolves to.
    fn source_side(
        &self,
        endpoint: &Endpoint,
        pair: (EndpointKind, EndpointKind),
    ) -> Result<(NativeId, u32), GraphError> {
        match endpoint {
            Endpoint::Native(native) => Ok((*native, 0)),
            Endpoint::Node(id) => Ok((self.node_data(*id)?.output, 0)),
            Endpoint::Channel { node, index } => match node.as_ref() {
                Endpoint::Native(native) => Ok((*native, *index)),
                Endpoint::Node(id) => Ok((self.node_data(*id)?.output, *index)),
                nested => Err(GraphError::unsupported_pair(
                    pair.0,
                    pair.1,
                    format!("channel endpoint cannot wrap a {} endpoint", nested.kind()),
                )),
            },
            Endpoint::Group(_) => Err(GraphError::unsupported_pair(
                pair.0,
                pair.1,
                "group reached pair resolution",
            )),
        }
    }

    /// The native primitive and input channel a pair's target side
    /// resolves to.
    fn target_side(
        &self,
        endpoint: &Endpoint,
        pair: (EndpointKind, EndpointKind),
    ) -> Result<(NativeId, u32), GraphError> {
        match endpoint {
            Endpoint::Native(native) => Ok((*native, 0)),
            Endpoint::Node(id) => Ok((self.node_input(*id, pair)?, 0)),
            Endpoint::Channel { node, index } => match node.as_ref() {
                Endpoint::Native(native) => Ok((*native, *index)),
                Endpoint::Node(id) => Ok((self.node_input(*id, pair)?, *index)),
                nested => Err(GraphError::unsupported_pair(
                    pair.0,
                    pair.1,
                    format!("channel endpoint cannot wrap a {} endpoint", nested.kind()),
                )),
            },
            Endpoint::Group(_) => Err(GraphError::unsupported_pair(
                pair.0,
                pair.1,
                "group reached pair resolution",
            )),
        }
    }

    fn node_input(
        &self,
        id: NodeId,
        pair: (EndpointKind, EndpointKind),
    ) -> Result<NativeId, GraphError> {
        let data = self.node_data(id)?;
        data.input.ok_or_else(|| {
            GraphError::unsupported_pair(
                pair.0,
                pair.1,
                format!("{} node has no input", data.node_type),
            )
        })
    }
}

/// The graph node an endpoint names directly, if any.
fn wrapped_id(endpoint: &Endpoint) -> Option<NodeId> {
    match endpoint {
        Endpoint::Node(id) => Some(*id),
        Endpoint::Channel { node, .. } => match node.as_ref() {
            Endpoint::Node(id) => Some(*id),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonada_engine::{ConnectTarget, ContextConfig};

    fn system() -> AudioSystem {
        AudioSystem::new(ContextConfig::default()).expect("default system")
    }

    /// Engine edges from `src` to `dst`, ignoring internal wiring.
    fn edges(sys: &AudioSystem, src: NativeId, dst: NativeId) -> usize {
        sys.engine()
            .connections()
            .iter()
            .filter(|c| c.source == src && c.target == ConnectTarget::Node(dst))
            .count()
    }

    #[test]
    fn node_to_node_is_one_output_to_input_edge() {
        let mut sys = system();
        let a = sys.gain(1.0);
        let b = sys.gain(1.0);

        sys.connect([a.into(), b.into()]).unwrap();

        let a_out = sys.output_port(a).unwrap();
        let b_in = sys.input_port(b).unwrap().unwrap();
        assert_eq!(edges(&sys, a_out, b_in), 1);
        assert_eq!(sys.connected_to(a).unwrap(), &[b]);
        assert_eq!(sys.connected_to(b).unwrap(), &[a]);
    }

    #[test]
    fn fan_out_connects_each_group_element_once() {
        let mut sys = system();
        let a = sys.gain(1.0);
        let b = sys.gain(1.0);
        let c = sys.gain(1.0);

        sys.connect([a.into(), vec![b, c].into()]).unwrap();

        let a_out = sys.output_port(a).unwrap();
        assert_eq!(edges(&sys, a_out, sys.input_port(b).unwrap().unwrap()), 1);
        assert_eq!(edges(&sys, a_out, sys.input_port(c).unwrap().unwrap()), 1);
    }

    #[test]
    fn chain_connects_each_adjacent_pair() {
        let mut sys = system();
        let osc = sys.oscillator("sine", 440.0);
        let filter = sys.filter("lowpass", 1000.0, 0.0);
        let amp = sys.gain(0.5);

        sys.connect([osc.into(), filter.into(), amp.into(), sys.speakers()])
            .unwrap();

        let osc_out = sys.output_port(osc).unwrap();
        let amp_out = sys.output_port(amp).unwrap();
        assert_eq!(edges(&sys, osc_out, sys.input_port(filter).unwrap().unwrap()), 1);
        assert_eq!(edges(&sys, amp_out, sys.engine().destination()), 1);
    }

    #[test]
    fn group_to_group_zips_pairwise() {
        let mut sys = system();
        let a = sys.gain(1.0);
        let b = sys.gain(1.0);
        let c = sys.gain(1.0);
        let d = sys.gain(1.0);

        sys.connect([vec![a, b].into(), vec![c, d].into()]).unwrap();

        assert_eq!(
            edges(
                &sys,
                sys.output_port(a).unwrap(),
                sys.input_port(c).unwrap().unwrap()
            ),
            1
        );
        assert_eq!(
            edges(
                &sys,
                sys.output_port(b).unwrap(),
                sys.input_port(d).unwrap().unwrap()
            ),
            1
        );
        // No cross edges.
        assert_eq!(
            edges(
                &sys,
                sys.output_port(a).unwrap(),
                sys.input_port(d).unwrap().unwrap()
            ),
            0
        );
    }

    #[test]
    fn group_length_mismatch_is_an_error() {
        let mut sys = system();
        let a = sys.gain(1.0);
        let b = sys.gain(1.0);
        let c = sys.gain(1.0);

        assert!(matches!(
            sys.connect([vec![a, b].into(), vec![c].into()]),
            Err(GraphError::GroupLengthMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn channel_endpoints_carry_their_indices() {
        let mut sys = system();
        let gain = sys.gain(1.0);
        let merger = sys.channel_merger(2);

        sys.connect([
            Endpoint::channel(gain, 0),
            Endpoint::channel(merger, 1),
        ])
        .unwrap();

        let gain_out = sys.output_port(gain).unwrap();
        let edge = sys
            .engine()
            .connections()
            .iter()
            .find(|c| c.source == gain_out && c.target == ConnectTarget::Node(merger))
            .expect("edge into the merger");
        assert_eq!(edge.output_index, 0);
        assert_eq!(edge.input_index, 1);
    }

    #[test]
    fn channel_against_plain_endpoint_is_rejected() {
        let mut sys = system();
        let gain = sys.gain(1.0);
        let merger = sys.channel_merger(2);

        let err = sys
            .connect([gain.into(), Endpoint::channel(merger, 1)])
            .unwrap_err();
        match err {
            GraphError::UnsupportedPair { left, right, .. } => {
                assert_eq!(left, EndpointKind::Node);
                assert_eq!(right, EndpointKind::Channel);
            }
            other => panic!("expected UnsupportedPair, got {other}"),
        }
    }

    #[test]
    fn connecting_into_a_pure_source_fails_loudly() {
        let mut sys = system();
        let gain = sys.gain(1.0);
        let osc = sys.oscillator("sine", 440.0);

        let err = sys.connect([gain.into(), osc.into()]).unwrap_err();
        match err {
            GraphError::UnsupportedPair { left, right, reason } => {
                assert_eq!(left, EndpointKind::Node);
                assert_eq!(right, EndpointKind::Node);
                assert!(reason.contains("no input"), "got: {reason}");
            }
            other => panic!("expected UnsupportedPair, got {other}"),
        }
    }

    #[test]
    fn single_endpoint_is_rejected() {
        let mut sys = system();
        let gain = sys.gain(1.0);
        assert!(matches!(
            sys.connect([Endpoint::from(gain)]),
            Err(GraphError::TooFewEndpoints { count: 1 })
        ));
    }

    #[test]
    fn disconnect_severs_ports_and_bookkeeping() {
        let mut sys = system();
        let a = sys.gain(1.0);
        let b = sys.gain(1.0);
        sys.connect([a.into(), b.into()]).unwrap();

        sys.disconnect([Endpoint::from(a)]).unwrap();

        let a_out = sys.output_port(a).unwrap();
        let b_in = sys.input_port(b).unwrap().unwrap();
        assert_eq!(edges(&sys, a_out, b_in), 0);
        assert!(sys.connected_to(a).unwrap().is_empty());
        assert!(sys.connected_to(b).unwrap().is_empty());
    }
}
