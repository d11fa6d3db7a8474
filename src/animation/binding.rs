use crate::foundation::core::{Seconds, Vec2};
use crate::foundation::error::{SaccadeError, SaccadeResult};
use crate::foundation::math;
use crate::scene::transform::Transform;

/// Parameter set for the parametric animation of one object.
///
/// Each variant carries its own typed parameters; mutually exclusive modes
/// within a kind are separate enum variants, so they cannot both be set.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimKind {
    /// Z-axis rotation driven by elapsed time.
    Rotation(RotationParams),
    /// Uniform pulsing applied multiplicatively to the base scale.
    Scale(ScaleParams),
    /// Translation driven by elapsed time.
    Position(PositionParams),
    /// Square-wave visibility toggle.
    Blink(BlinkParams),
}

impl AnimKind {
    /// Short identifier of the kind, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rotation(_) => "rotation",
            Self::Scale(_) => "scale",
            Self::Position(_) => "position",
            Self::Blink(_) => "blink",
        }
    }

    /// Validate parameter ranges. Called at bind time, before any mutation.
    pub fn validate(&self) -> SaccadeResult<()> {
        match self {
            Self::Rotation(RotationParams::Continuous { speed_deg_per_sec }) => {
                require_finite("rotation speed", *speed_deg_per_sec)
            }
            Self::Rotation(RotationParams::Oscillate {
                amplitude_deg,
                freq_hz,
            }) => {
                require_finite("rotation amplitude", *amplitude_deg)?;
                require_positive("rotation frequency", *freq_hz)
            }
            Self::Scale(p) => {
                require_finite("scale min", p.min)?;
                require_finite("scale max", p.max)?;
                require_positive("scale frequency", p.freq_hz)
            }
            Self::Position(PositionParams::Velocity { velocity }) => {
                require_finite("velocity x", velocity.x)?;
                require_finite("velocity y", velocity.y)
            }
            Self::Position(PositionParams::Orbit {
                radius,
                speed_deg_per_sec,
                center,
            }) => {
                require_finite("orbit radius", *radius)?;
                require_finite("orbit speed", *speed_deg_per_sec)?;
                if let Some(c) = center {
                    require_finite("orbit center x", c.x)?;
                    require_finite("orbit center y", c.y)?;
                }
                Ok(())
            }
            Self::Blink(p) => {
                if !(0.0..=1.0).contains(&p.duty) {
                    return Err(SaccadeError::invalid_argument(format!(
                        "blink duty must be in [0, 1], got {}",
                        p.duty
                    )));
                }
                match p.rate {
                    BlinkRate::Hz(hz) => require_positive("blink rate", hz),
                    BlinkRate::FramesPerCycle(n) => {
                        if n == 0 {
                            return Err(SaccadeError::invalid_argument(
                                "blink frames-per-cycle must be >= 1",
                            ));
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}

fn require_finite(what: &str, v: f64) -> SaccadeResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(SaccadeError::invalid_argument(format!(
            "{what} must be finite, got {v}"
        )))
    }
}

fn require_positive(what: &str, v: f64) -> SaccadeResult<()> {
    require_finite(what, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(SaccadeError::invalid_argument(format!(
            "{what} must be > 0, got {v}"
        )))
    }
}

/// Rotation modes. Continuous and oscillating are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationParams {
    /// `angle(t) = speed * t` degrees, wrapped to `[0, 360)` on the object.
    /// The internal phase stays monotonic.
    Continuous {
        /// Angular speed in degrees per second.
        speed_deg_per_sec: f64,
    },
    /// `angle(t) = amplitude * sin(2π * freq * t)` degrees.
    Oscillate {
        /// Peak deflection in degrees.
        amplitude_deg: f64,
        /// Oscillation frequency in Hz.
        freq_hz: f64,
    },
}

/// Pulsing scale: `s(t) = lerp(min, max, (sin(2π * freq * t) + 1) / 2)`,
/// applied as a factor on the scale captured at bind time so a non-uniform
/// base aspect is preserved.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleParams {
    /// Factor at the trough of the pulse.
    pub min: f64,
    /// Factor at the crest of the pulse.
    pub max: f64,
    /// Pulse frequency in Hz.
    pub freq_hz: f64,
}

/// Position modes. Linear drift and orbit are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionParams {
    /// `pos(t) = pos0 + velocity * t`, anchored at the pre-binding position.
    /// No origin reset.
    Velocity {
        /// Drift velocity in scene units per second.
        velocity: Vec2,
    },
    /// `pos(t) = center + radius * (cos ωt, sin ωt)` with ω given in degrees
    /// per second and converted to radians internally.
    Orbit {
        /// Orbit radius in scene units.
        radius: f64,
        /// Angular speed in degrees per second.
        speed_deg_per_sec: f64,
        /// Orbit center; defaults to the object's pre-binding position.
        center: Option<Vec2>,
    },
}

/// Square-wave visibility toggle: visible iff `frac(t * rate) < duty`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlinkParams {
    /// Blink rate, wall-clock or frame-count driven.
    pub rate: BlinkRate,
    /// Fraction of each cycle spent visible, in `[0, 1]`.
    pub duty: f64,
}

/// Blink rate modes. The two are mutually exclusive per binding; re-binding
/// with the other mode without clearing first is rejected rather than
/// silently reinterpreting the rate.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkRate {
    /// Cycles per second of scheduler time.
    Hz(f64),
    /// Frames per full cycle, driven by the tick counter.
    FramesPerCycle(u32),
}

impl BlinkRate {
    pub(crate) fn same_mode(self, other: BlinkRate) -> bool {
        matches!(
            (self, other),
            (BlinkRate::Hz(_), BlinkRate::Hz(_))
                | (BlinkRate::FramesPerCycle(_), BlinkRate::FramesPerCycle(_))
        )
    }
}

/// Object state captured at bind time that update rules anchor to.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub(crate) struct AnimBase {
    pub(crate) position: Vec2,
    pub(crate) scale: Vec2,
}

/// The bound animation state machine of one object.
///
/// All update rules are pure functions of elapsed time since [`phase_origin`],
/// not of accumulated per-frame deltas, so replays under a different frame
/// rate land on identical values. Each tick re-applies the rule from the
/// unbroken origin, overwriting external transform mutations made in between;
/// bindings are idempotent-from-origin, not incremental.
///
/// [`phase_origin`]: AnimBinding::phase_origin
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimBinding {
    pub(crate) kind: AnimKind,
    /// Scheduler time at which this binding started or was last reset.
    pub(crate) phase_origin: Seconds,
    /// Tick counter at bind time, used by frame-driven blink.
    pub(crate) origin_frame: u64,
    pub(crate) active: bool,
    pub(crate) base: AnimBase,
}

impl AnimBinding {
    pub(crate) fn new(
        kind: AnimKind,
        phase_origin: Seconds,
        origin_frame: u64,
        base: AnimBase,
    ) -> Self {
        Self {
            kind,
            phase_origin,
            origin_frame,
            active: true,
            base,
        }
    }

    /// Current parameter set, as bound (not a derived instantaneous value).
    pub fn kind(&self) -> &AnimKind {
        &self.kind
    }

    /// Whether the binding mutates its object on tick. Inactive bindings are
    /// retained so parameters remain queryable.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Scheduler time this binding is anchored to.
    pub fn phase_origin(&self) -> Seconds {
        self.phase_origin
    }

    /// Apply this binding's update rule for scheduler time `now` and tick
    /// counter `frame_count`, mutating the target state in place.
    pub(crate) fn apply_to(
        &self,
        local: &mut Transform,
        visible: &mut bool,
        now: Seconds,
        frame_count: u64,
    ) {
        let t = now - self.phase_origin;
        match &self.kind {
            AnimKind::Rotation(RotationParams::Continuous { speed_deg_per_sec }) => {
                local.set_rotation_deg(math::wrap_deg(speed_deg_per_sec * t));
            }
            AnimKind::Rotation(RotationParams::Oscillate {
                amplitude_deg,
                freq_hz,
            }) => {
                local.set_rotation_deg(amplitude_deg * (math::TAU * freq_hz * t).sin());
            }
            AnimKind::Scale(p) => {
                let phase = ((math::TAU * p.freq_hz * t).sin() + 1.0) / 2.0;
                let factor = math::lerp(p.min, p.max, phase);
                local.scale = Vec2::new(self.base.scale.x * factor, self.base.scale.y * factor);
            }
            AnimKind::Position(PositionParams::Velocity { velocity }) => {
                local.translate = self.base.position + *velocity * t;
            }
            AnimKind::Position(PositionParams::Orbit {
                radius,
                speed_deg_per_sec,
                center,
            }) => {
                let angle = speed_deg_per_sec.to_radians() * t;
                let c = center.unwrap_or(self.base.position);
                local.translate =
                    c + Vec2::new(radius * angle.cos(), radius * angle.sin());
            }
            AnimKind::Blink(p) => {
                let cycles = match p.rate {
                    BlinkRate::Hz(hz) => t * hz,
                    BlinkRate::FramesPerCycle(n) => {
                        frame_count.saturating_sub(self.origin_frame) as f64 / f64::from(n)
                    }
                };
                *visible = math::frac(cycles) < p.duty;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/binding.rs"]
mod tests;
