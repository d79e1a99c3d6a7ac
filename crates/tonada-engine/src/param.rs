//! Automatable parameters and their scheduling timelines.
//!
//! Every automatable parameter owns an event timeline keyed by absolute
//! engine time. Writes append events; reads evaluate the timeline
//! lazily at the clock's current position. This gives the scheduling
//! semantics a control layer expects from a real engine:
//!
//! - events take effect at their own time, not at call time: a change
//!   scheduled for the future is invisible to reads until the clock
//!   reaches it;
//! - a later-issued event with an earlier time pre-empts pending ones
//!   (the timeline is ordered by time, with call order breaking ties);
//! - `cancel_scheduled_values(t)` drops every event at or after `t` and
//!   is the only cancellation primitive.
//!
//! Three event families exist, mirroring standard control-rate
//! automation: an instantaneous step, a linear ramp that starts at the
//! previous event and lands exactly on its target, and a target-seeking
//! exponential approach that nears its target asymptotically and never
//! exactly reaches it.

use core::fmt;

/// Unique identifier for an automatable parameter within a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamId(pub(crate) u32);

impl ParamId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamId({})", self.0)
    }
}

/// One scheduled change on a parameter's timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Step to `value` exactly at `time`.
    SetValue {
        /// Value the parameter jumps to.
        value: f32,
        /// Absolute time of the step.
        time: f64,
    },
    /// Ramp linearly from the previous event to `value`, landing at `time`.
    LinearRamp {
        /// Value reached exactly at `time`.
        value: f32,
        /// Absolute time the ramp completes.
        time: f64,
    },
    /// From `time` onward, approach `target` exponentially with the
    /// given time constant. Asymptotic; the target is never reached.
    SetTarget {
        /// Value being approached.
        target: f32,
        /// Absolute time the approach begins.
        time: f64,
        /// Time constant in seconds; ~63% of the distance is covered
        /// per constant.
        time_constant: f64,
    },
}

impl AutomationEvent {
    /// The absolute time this event takes (or begins to take) effect.
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. }
            | AutomationEvent::LinearRamp { time, .. }
            | AutomationEvent::SetTarget { time, .. } => time,
        }
    }
}

/// How the parameter's value evolves after the last applied event.
#[derive(Debug, Clone, Copy)]
enum Tail {
    /// Holds the last computed value.
    Hold,
    /// Approaches `target` from the value at `start`.
    Target {
        target: f32,
        start: f64,
        time_constant: f64,
    },
}

/// An automatable parameter: a base value plus an event timeline.
#[derive(Debug, Clone)]
pub(crate) struct AudioParam {
    /// Value before any event applies.
    base: f32,
    /// Events ordered by time; call order breaks ties.
    events: Vec<AutomationEvent>,
}

impl AudioParam {
    pub fn new(default: f32) -> Self {
        Self {
            base: default,
            events: Vec::new(),
        }
    }

    /// Inserts an event, keeping the timeline ordered by time.
    ///
    /// Among events with equal times, later calls land after earlier
    /// ones; among differing times, a late call with an early time is
    /// placed where its time says, pre-empting pending events.
    pub fn schedule(&mut self, event: AutomationEvent) {
        let at = self
            .events
            .partition_point(|existing| existing.time() <= event.time());
        self.events.insert(at, event);
    }

    /// Drops every event whose time is at or after `time`.
    pub fn cancel_from(&mut self, time: f64) {
        self.events.retain(|event| event.time() < time);
    }

    /// The scheduled timeline, ordered by time.
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Evaluates the timeline at absolute time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        // `current` is the value as of `prev_time`; `tail` describes
        // how it evolves until the next event.
        let mut current = self.base;
        let mut prev_time = f64::NEG_INFINITY;
        let mut tail = Tail::Hold;

        for event in &self.events {
            let at = event.time();
            if at > t {
                // `t` falls before this event. A pending linear ramp is
                // already in progress from the previous event.
                if let AutomationEvent::LinearRamp { value, time } = *event {
                    return ramp_value(current, prev_time, value, time, t);
                }
                return tail_value(current, tail, t);
            }
            match *event {
                AutomationEvent::SetValue { value, .. } => {
                    current = value;
                    tail = Tail::Hold;
                }
                AutomationEvent::LinearRamp { value, .. } => {
                    // The ramp lands exactly on its target at its time.
                    current = value;
                    tail = Tail::Hold;
                }
                AutomationEvent::SetTarget {
                    target,
                    time,
                    time_constant,
                } => {
                    current = tail_value(current, tail, time);
                    tail = Tail::Target {
                        target,
                        start: time,
                        time_constant,
                    };
                }
            }
            prev_time = at;
        }

        tail_value(current, tail, t)
    }
}

/// Value of an in-progress linear ramp at time `t`.
fn ramp_value(from: f32, from_time: f64, to: f32, to_time: f64, t: f64) -> f32 {
    let span = to_time - from_time;
    if !span.is_finite() || span <= 0.0 {
        // No prior event to ramp from; the ramp degenerates to a step
        // at its own time.
        return if t >= to_time { to } else { from };
    }
    let frac = ((t - from_time) / span).clamp(0.0, 1.0) as f32;
    from + (to - from) * frac
}

/// Value of the post-event tail at time `t`.
fn tail_value(current: f32, tail: Tail, t: f64) -> f32 {
    match tail {
        Tail::Hold => current,
        Tail::Target {
            target,
            start,
            time_constant,
        } => {
            if time_constant <= 0.0 {
                return target;
            }
            let decay = (-(t - start).max(0.0) / time_constant).exp() as f32;
            target + (current - target) * decay
        }
    }
}
