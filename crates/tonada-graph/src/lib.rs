//! Tonada Graph - convenience layer over the tonada audio engine
//!
//! This crate lets a caller build a graph of signal-processing nodes
//! and wire them together without knowing each node's concrete shape.
//! Every node the system hands out follows the same contract: an input
//! port (absent on pure sources), an output port, named automatable
//! parameters behind uniform get/set/schedule accessors, and an open
//! attribute map. The wiring API accepts any mix of wrapped nodes, raw
//! engine primitives, channel-narrowed endpoints and collections, and
//! resolves every pair or fails with a typed error.
//!
//! # Core Abstractions
//!
//! - [`AudioSystem`] - owns the engine context, the graph nodes and the
//!   deferred disconnect queue; all mutation goes through it
//! - [`Endpoint`] - the closed union of connectable shapes consumed by
//!   [`AudioSystem::connect`]
//! - [`EnvelopeConfig`] - immutable ADSR settings; every envelope start
//!   recomputes absolute levels from it
//! - [`LfoConfig`] - oscillator-into-depth-gain modulation routes that
//!   drive one parameter at a time
//!
//! # Example
//!
//! ```rust
//! use tonada_engine::ContextConfig;
//! use tonada_graph::AudioSystem;
//!
//! let mut sys = AudioSystem::new(ContextConfig::default())?;
//! let osc = sys.oscillator("sine", 440.0);
//! let filter = sys.filter("lowpass", 1000.0, 0.0);
//! let amp = sys.gain(0.5);
//!
//! sys.connect([osc.into(), filter.into(), amp.into(), sys.speakers()])?;
//! sys.start_node(osc, None)?;
//!
//! // Fade out over two seconds, then tear the chain down.
//! sys.param_schedule(amp, "gain", 0.0, sys.now() + 2.0)?;
//! sys.disconnect_after_time(amp, sys.now() + 2.0);
//! # Ok::<(), tonada_graph::GraphError>(())
//! ```

pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod lfo;
pub mod node;
pub mod panner;
pub mod resolver;
pub mod scheduler;
pub mod system;

pub use endpoint::{Endpoint, EndpointKind};
pub use envelope::EnvelopeConfig;
pub use error::GraphError;
pub use lfo::LfoConfig;
pub use node::{AttrValue, NodeId, NodeType};
pub use panner::stereo_gains;
pub use scheduler::POLL_INTERVAL;
pub use system::{AudioSystem, CompressorConfig};
