use crate::foundation::core::{HookId, ObjectId};
use crate::scene::graph::Scene;
use crate::scheduler::frame::TickCtx;

/// Callback signature for object pre-frame hooks. Runs before that tick's
/// animation advance for every object reachable from a dynamic group slot.
pub type PreHookFn =
    Box<dyn FnMut(&mut Scene, ObjectId, TickCtx) -> anyhow::Result<()>>;

/// Callback signature for frame-level post-frame hooks. Runs after animation
/// advance, before draw-list assembly.
pub type PostHookFn = Box<dyn FnMut(&mut Scene, TickCtx) -> anyhow::Result<()>>;

/// One registered hook: identity, slot name, enable toggle, callback.
pub(crate) struct HookEntry<F> {
    pub(crate) id: HookId,
    pub(crate) slot: String,
    pub(crate) enabled: bool,
    pub(crate) callback: F,
}

impl<F> std::fmt::Debug for HookEntry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookEntry")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Push a new entry; invocation order is registration order.
pub(crate) fn add<F>(list: &mut Vec<HookEntry<F>>, id: HookId, slot: impl Into<String>, callback: F) {
    list.push(HookEntry {
        id,
        slot: slot.into(),
        enabled: true,
        callback,
    });
}

/// Swap the callback of the first entry named `slot`, preserving its position
/// and enable state. Returns `false` when no entry holds that slot name.
pub(crate) fn replace<F>(list: &mut [HookEntry<F>], slot: &str, callback: F) -> bool {
    match list.iter_mut().find(|e| e.slot == slot) {
        Some(entry) => {
            entry.callback = callback;
            true
        }
        None => false,
    }
}

/// Toggle an entry by id. Returns `false` on miss.
pub(crate) fn set_enabled<F>(list: &mut [HookEntry<F>], id: HookId, enabled: bool) -> bool {
    match list.iter_mut().find(|e| e.id == id) {
        Some(entry) => {
            entry.enabled = enabled;
            true
        }
        None => false,
    }
}

/// Remove an entry by id. Returns `false` on miss.
pub(crate) fn remove<F>(list: &mut Vec<HookEntry<F>>, id: HookId) -> bool {
    match list.iter().position(|e| e.id == id) {
        Some(i) => {
            list.remove(i);
            true
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/hooks.rs"]
mod tests;
