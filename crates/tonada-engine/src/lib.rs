//! Tonada Engine - control-plane model of a native audio engine
//!
//! This crate models the surface a real-time audio engine exposes to a
//! control layer: creation of primitive processing nodes, wiring between
//! them, automatable parameters with absolute-time scheduling, and a
//! monotonic clock. It keeps the books (node records, the connection
//! table, per-parameter automation timelines) without rendering samples,
//! so the graph layer built on top of it can be driven and tested
//! deterministically.
//!
//! # Core Abstractions
//!
//! - [`AudioContext`] - the engine context: owns every native node and
//!   parameter, the connection table, and the clock
//! - [`NativeId`] / [`NativeKind`] - handles to engine-owned primitives
//!   (gain, delay, oscillator, filter, buffer source, compressor, ...)
//! - [`ParamId`] / automation timeline - `set_value_at_time`,
//!   `linear_ramp_to_value_at_time`, `set_target_at_time`,
//!   `cancel_scheduled_values`, evaluated lazily against the clock
//! - [`ConnectTarget`] - a connection destination: another node, or an
//!   automatable parameter
//!
//! # Capability Profiles
//!
//! Hosts differ in which source-lifecycle surface they expose. A context
//! built with [`SourceApi::Modern`] supports `start_source`/`stop_source`;
//! a [`SourceApi::Legacy`] context only answers to the older
//! `note_on`/`note_off` names. Capability detection happens once, at
//! [`AudioContext::new`]: callers probe [`AudioContext::capabilities`]
//! and store their dispatch decision instead of re-checking per call.
//!
//! # Example
//!
//! ```rust
//! use tonada_engine::{AudioContext, ContextConfig};
//!
//! let mut ctx = AudioContext::new(ContextConfig::default())?;
//! let osc = ctx.create_oscillator();
//! let gain = ctx.create_gain();
//!
//! ctx.connect(osc, gain)?;
//! ctx.connect(gain, ctx.destination())?;
//!
//! let freq = ctx.param(osc, "frequency")?;
//! ctx.set_value_at_time(freq, 880.0, ctx.current_time() + 0.5)?;
//! # Ok::<(), tonada_engine::EngineError>(())
//! ```

pub mod context;
pub mod error;
pub mod node;
pub mod param;

pub use context::{
    AudioContext, Capabilities, Connection, ConnectTarget, ContextConfig, SourceApi,
};
pub use error::EngineError;
pub use node::{BufferId, NativeId, NativeKind};
pub use param::{AutomationEvent, ParamId};
