//! Saccade is the scene graph and per-frame animation scheduler of a
//! real-time stimulus presentation engine.
//!
//! It owns renderable objects in an arena-addressed scene, composes their
//! transforms hierarchically through metagroups, advances time-based
//! animation bindings every frame, runs attached script hooks at fixed points
//! in the tick, and flattens the hierarchy into a priority-sorted draw list
//! for an external renderer. The API is scheduler-oriented:
//!
//! - Build a [`Scene`]: create objects and metagroups, place them in the
//!   [`DisplayList`]'s group slots
//! - Bind animations ([`AnimKind`]) and script hooks
//! - Drive a [`FrameScheduler`] once per video frame and hand each tick's
//!   [`DrawList`] to a [`Renderer`]
//!
//! Everything is single-threaded and deterministic: time is an input, every
//! update rule is a pure function of elapsed time since its binding's phase
//! origin, and replaying the same calls at the same times reproduces the same
//! draw-list transforms exactly.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub mod animation;
pub mod display;
pub mod render;
pub mod scene;
pub mod scheduler;
pub mod script;

pub use crate::foundation::core::{Affine, HookId, ObjectId, Point, Seconds, Vec2};
pub use crate::foundation::error::{SaccadeError, SaccadeResult};

pub use crate::animation::binding::{
    AnimBinding, AnimKind, BlinkParams, BlinkRate, PositionParams, RotationParams, ScaleParams,
};
pub use crate::animation::custom::{CustomAnimFn, CustomBinding};
pub use crate::display::glist::{DisplayList, GroupSlot};
pub use crate::render::draw::{DrawItem, DrawList, NullRenderer, Renderer};
pub use crate::scene::graph::Scene;
pub use crate::scene::object::{NullPayload, Payload, PropValue, SceneObject};
pub use crate::scene::transform::Transform;
pub use crate::scheduler::clock::{Clock, ManualClock, SystemClock};
pub use crate::scheduler::frame::{
    FrameScheduler, HookReport, SchedulerOpts, TickCtx, TickOutput, TickStats,
};
pub use crate::script::hooks::{PostHookFn, PreHookFn};
