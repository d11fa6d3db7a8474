use crate::foundation::core::{ObjectId, Seconds};
use crate::scene::graph::Scene;
use crate::scheduler::frame::TickCtx;

/// Per-tick callback signature for custom animations.
///
/// Invoked once per tick with the frozen tick context and the params given at
/// bind time. The callback may mutate arbitrary properties of its object or
/// of related objects; the core performs no validation of its effects. This
/// is a deliberate extension point: a callback that performs unbounded work
/// stalls the presentation loop unless the scheduler's hook budget is set.
pub type CustomAnimFn =
    Box<dyn FnMut(&mut Scene, ObjectId, TickCtx, &serde_json::Value) -> anyhow::Result<()>>;

/// A user-supplied callback animation bound to one object, independent of the
/// object's parametric binding.
pub struct CustomBinding {
    pub(crate) params: serde_json::Value,
    pub(crate) phase_origin: Seconds,
    pub(crate) active: bool,
    /// `None` while the callback is checked out for invocation.
    pub(crate) callback: Option<CustomAnimFn>,
}

impl CustomBinding {
    pub(crate) fn new(params: serde_json::Value, phase_origin: Seconds, callback: CustomAnimFn) -> Self {
        Self {
            params,
            phase_origin,
            active: true,
            callback: Some(callback),
        }
    }

    /// Params given at bind time.
    pub fn params(&self) -> &serde_json::Value {
        &self.params
    }

    /// Whether the callback runs on tick.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl std::fmt::Debug for CustomBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomBinding")
            .field("params", &self.params)
            .field("phase_origin", &self.phase_origin)
            .field("active", &self.active)
            .field("checked_out", &self.callback.is_none())
            .finish()
    }
}
