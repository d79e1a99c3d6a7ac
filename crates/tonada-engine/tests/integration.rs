//! Integration tests for the tonada-engine context.
//!
//! Exercises the pieces together the way the graph layer drives them:
//! automation timelines read back through the clock, the connection
//! table under wiring and rewiring, capability-profile dispatch, and
//! source lifecycle scheduling.

use tonada_engine::{
    AudioContext, ConnectTarget, ContextConfig, EngineError, NativeKind, SourceApi,
};

fn modern() -> AudioContext {
    AudioContext::new(ContextConfig::default()).expect("default context")
}

fn legacy() -> AudioContext {
    AudioContext::new(ContextConfig {
        source_api: SourceApi::Legacy,
        ..ContextConfig::default()
    })
    .expect("legacy context")
}

// ============================================================================
// 1. Automation timelines against the clock
// ============================================================================

#[test]
fn ramp_reads_back_through_the_clock() {
    let mut ctx = modern();
    let gain = ctx.create_gain();
    let amp = ctx.param(gain, "gain").unwrap();

    // Anchor at 1, then ramp to 0 over [1s, 3s].
    ctx.set_value_at_time(amp, 1.0, 1.0).unwrap();
    ctx.linear_ramp_to_value_at_time(amp, 0.0, 3.0).unwrap();

    ctx.advance(1.0).unwrap();
    assert!((ctx.value(amp).unwrap() - 1.0).abs() < 1e-6);

    ctx.advance(1.0).unwrap();
    assert!(
        (ctx.value(amp).unwrap() - 0.5).abs() < 1e-6,
        "midpoint of the ramp should read 0.5, got {}",
        ctx.value(amp).unwrap()
    );

    ctx.advance(2.0).unwrap();
    assert!(ctx.value(amp).unwrap().abs() < 1e-6, "ramp holds its endpoint");
}

#[test]
fn cancel_discards_the_future_only() {
    let mut ctx = modern();
    let osc = ctx.create_oscillator();
    let freq = ctx.param(osc, "frequency").unwrap();

    ctx.set_value_at_time(freq, 220.0, 1.0).unwrap();
    ctx.set_value_at_time(freq, 880.0, 2.0).unwrap();
    ctx.cancel_scheduled_values(freq, 1.5).unwrap();

    ctx.advance(3.0).unwrap();
    assert_eq!(ctx.value(freq).unwrap(), 220.0);
    assert_eq!(ctx.scheduled_events(freq).unwrap().len(), 1);
}

#[test]
fn exponential_target_converges() {
    let mut ctx = modern();
    let gain = ctx.create_gain();
    let amp = ctx.param(gain, "gain").unwrap();

    ctx.set_value_at_time(amp, 1.0, 0.0).unwrap();
    ctx.set_target_at_time(amp, 0.0, 0.0, 0.1).unwrap();

    // After many time constants the value is effectively at the target.
    assert!(ctx.value_at(amp, 2.0).unwrap() < 1e-6);
    // And always between start and target on the way there.
    let mid = ctx.value_at(amp, 0.1).unwrap();
    assert!(mid > 0.0 && mid < 1.0);
}

#[test]
fn timelines_are_per_parameter() {
    let mut ctx = modern();
    let a = ctx.create_gain();
    let b = ctx.create_gain();
    let amp_a = ctx.param(a, "gain").unwrap();
    let amp_b = ctx.param(b, "gain").unwrap();

    ctx.set_value(amp_a, 0.2).unwrap();
    assert_eq!(ctx.value(amp_a).unwrap(), 0.2);
    assert_eq!(ctx.value(amp_b).unwrap(), 1.0);
}

// ============================================================================
// 2. Connection table
// ============================================================================

#[test]
fn fan_out_and_fan_in_coexist() {
    let mut ctx = modern();
    let osc = ctx.create_oscillator();
    let left = ctx.create_gain();
    let right = ctx.create_gain();
    let sum = ctx.create_gain();

    ctx.connect(osc, left).unwrap();
    ctx.connect(osc, right).unwrap();
    ctx.connect(left, sum).unwrap();
    ctx.connect(right, sum).unwrap();
    ctx.connect(sum, ctx.destination()).unwrap();

    assert_eq!(ctx.connections().len(), 5);
    let from_osc = ctx.connections().iter().filter(|c| c.source == osc).count();
    assert_eq!(from_osc, 2);
}

#[test]
fn splitter_to_merger_uses_channel_indices() {
    let mut ctx = modern();
    let splitter = ctx.create_channel_splitter(2);
    let merger = ctx.create_channel_merger(2);

    // Cross the channels.
    ctx.connect_indexed(splitter, merger, 0, 1).unwrap();
    ctx.connect_indexed(splitter, merger, 1, 0).unwrap();

    assert_eq!(ctx.connections().len(), 2);
    assert!(matches!(
        ctx.connect_indexed(splitter, merger, 2, 0),
        Err(EngineError::InvalidChannel { index: 2, .. })
    ));
}

#[test]
fn rewiring_a_modulator_leaves_other_edges() {
    let mut ctx = modern();
    let lfo = ctx.create_oscillator();
    let carrier = ctx.create_oscillator();
    let out = ctx.create_gain();
    let freq = ctx.param(carrier, "frequency").unwrap();
    let amp = ctx.param(out, "gain").unwrap();

    ctx.connect(carrier, out).unwrap();
    ctx.connect(lfo, freq).unwrap();

    // Retarget: sever the old param edge, add the new one.
    ctx.disconnect_pair(lfo, freq).unwrap();
    ctx.connect(lfo, amp).unwrap();

    let param_edges: Vec<_> = ctx
        .connections()
        .iter()
        .filter(|c| matches!(c.target, ConnectTarget::Param(_)))
        .collect();
    assert_eq!(param_edges.len(), 1);
    assert_eq!(param_edges[0].target, ConnectTarget::Param(amp));
    assert_eq!(ctx.connections().len(), 2, "node edge survives the rewire");
}

#[test]
fn destination_accepts_input_but_never_outputs() {
    let mut ctx = modern();
    let gain = ctx.create_gain();

    ctx.connect(gain, ctx.destination()).unwrap();
    assert!(matches!(
        ctx.connect(ctx.destination(), gain),
        Err(EngineError::InvalidState { .. })
    ));
}

// ============================================================================
// 3. Capability profiles and source lifecycle
// ============================================================================

#[test]
fn capabilities_reflect_the_profile() {
    assert!(modern().capabilities().modern_source_api);
    assert!(!legacy().capabilities().modern_source_api);
}

#[test]
fn legacy_names_schedule_the_same_lifecycle() {
    let mut ctx = legacy();
    let osc = ctx.create_oscillator();

    ctx.note_on(osc, 0.5).unwrap();
    ctx.note_off(osc, 2.5).unwrap();
    assert_eq!(ctx.source_started_at(osc).unwrap(), Some(0.5));
    assert_eq!(ctx.source_stopped_at(osc).unwrap(), Some(2.5));
}

#[test]
fn buffer_source_plays_a_real_buffer() {
    let mut ctx = modern();
    let buffer = ctx.create_buffer(1, 4, 44100.0).unwrap();
    {
        let channel = ctx.buffer_channel_mut(buffer, 0).unwrap();
        channel.copy_from_slice(&[0.1, 0.2, 0.3, 0.4]);
    }

    let source = ctx.create_buffer_source(buffer).unwrap();
    ctx.connect(source, ctx.destination()).unwrap();
    ctx.start_source(source, 0.0).unwrap();

    match ctx.node_kind(source).unwrap() {
        NativeKind::BufferSource { buffer: b, looping } => {
            assert_eq!(*b, buffer);
            assert!(!looping);
        }
        other => panic!("expected a buffer source, got {}", other.name()),
    }
}

#[test]
fn wave_shaper_curve_replaces_whole() {
    let mut ctx = modern();
    let shaper = ctx.create_wave_shaper();

    ctx.set_wave_shaper_curve(shaper, vec![-1.0, 0.0, 1.0]).unwrap();
    match ctx.node_kind(shaper).unwrap() {
        NativeKind::WaveShaper { curve } => assert_eq!(curve.len(), 3),
        other => panic!("expected a wave shaper, got {}", other.name()),
    }
}
