use std::collections::HashMap;

use smallvec::SmallVec;

use crate::animation::binding::{AnimBase, AnimBinding, AnimKind};
use crate::animation::custom::{CustomAnimFn, CustomBinding};
use crate::display::glist::DisplayList;
use crate::foundation::core::{Affine, HookId, ObjectId, Seconds};
use crate::foundation::error::{SaccadeError, SaccadeResult};
use crate::scene::object::{NullPayload, Payload, SceneObject};
use crate::scene::transform::Transform;
use crate::script::hooks::{self, PreHookFn};

struct Slot {
    generation: u32,
    obj: Option<SceneObject>,
}

/// Arena-owned scene state: the object store, the name registry, and the
/// display list.
///
/// Objects live in a flat slot arena addressed by generational [`ObjectId`]
/// handles; metagroups store handles, not owning pointers, which rules out
/// ownership cycles structurally. An explicit check in [`Scene::set_parent`]
/// rejects handle cycles, and traversals carry a defensive check of their
/// own.
///
/// The scene is owned by the frame scheduler's single thread of control;
/// script hooks and custom animations receive `&mut Scene` and may call every
/// operation here.
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    names: HashMap<String, ObjectId>,
    glist: DisplayList,
    next_hook_id: u64,
    /// Frozen tick time, mirrored in by the scheduler so bind operations can
    /// stamp phase origins without reading a wall clock.
    pub(crate) clock_now: Seconds,
    pub(crate) clock_frame: u64,
}

impl Scene {
    /// Empty scene with a single-slot display list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            names: HashMap::new(),
            glist: DisplayList::default(),
            next_hook_id: 0,
            clock_now: 0.0,
            clock_frame: 0,
        }
    }

    // ---- lifecycle ----

    /// Create a renderable object with default transform, visible, priority
    /// 0, no parent.
    pub fn create(&mut self) -> ObjectId {
        self.create_impl(false, Box::new(NullPayload))
    }

    /// Create a metagroup: an object that owns an ordered list of children
    /// and composes its transform with theirs at draw time.
    pub fn create_group(&mut self) -> ObjectId {
        self.create_impl(true, Box::new(NullPayload))
    }

    /// Create a renderable object carrying opaque content.
    pub fn create_with_payload(&mut self, payload: Box<dyn Payload>) -> ObjectId {
        self.create_impl(false, payload)
    }

    fn create_impl(&mut self, group: bool, payload: Box<dyn Payload>) -> ObjectId {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    obj: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let generation = self.slots[index as usize].generation;
        let id = ObjectId { index, generation };
        self.slots[index as usize].obj = Some(SceneObject::new(id, group, payload));
        self.live += 1;
        tracing::debug!(%id, group, "created scene object");
        id
    }

    /// Destroy an object: detach it from its parent and the display list,
    /// drain its bindings and hooks, orphan its children (they become
    /// top-level), and invalidate the handle.
    ///
    /// Fails with [`DanglingReference`](SaccadeError::DanglingReference) when
    /// the object's callbacks are checked out for invocation at this moment,
    /// i.e. one of its own hooks is destroying it mid-call.
    pub fn destroy(&mut self, id: ObjectId) -> SaccadeResult<()> {
        if self.get(id)?.pinned {
            return Err(SaccadeError::dangling(format!(
                "{id} has callbacks checked out for invocation"
            )));
        }

        let slot = &mut self.slots[id.index as usize];
        let Some(obj) = slot.obj.take() else {
            return Err(SaccadeError::unknown_object(format!("{id} does not exist")));
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;

        if let Some(p) = obj.parent
            && let Some(pobj) = self.get_mut_opt(p)
            && let Some(children) = pobj.children.as_mut()
        {
            children.retain(|c| *c != id);
        }
        if let Some(children) = &obj.children {
            for &c in children {
                if let Some(cobj) = self.get_mut_opt(c) {
                    cobj.parent = None;
                }
            }
        }
        self.glist.remove(id);
        if let Some(n) = &obj.name
            && self.names.get(n) == Some(&id)
        {
            self.names.remove(n);
        }
        tracing::debug!(%id, "destroyed scene object");
        Ok(())
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the scene holds no objects.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ---- lookup ----

    /// Borrow an object. Stale handles to destroyed objects miss.
    pub fn get(&self, id: ObjectId) -> SaccadeResult<&SceneObject> {
        self.get_opt(id)
            .ok_or_else(|| SaccadeError::unknown_object(format!("{id} does not exist")))
    }

    /// Mutably borrow an object.
    pub fn get_mut(&mut self, id: ObjectId) -> SaccadeResult<&mut SceneObject> {
        self.get_mut_opt(id)
            .ok_or_else(|| SaccadeError::unknown_object(format!("{id} does not exist")))
    }

    pub(crate) fn get_opt(&self, id: ObjectId) -> Option<&SceneObject> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.obj.as_ref())
    }

    pub(crate) fn get_mut_opt(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.obj.as_mut())
    }

    /// Iterate over all live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.slots.iter().filter_map(|s| s.obj.as_ref())
    }

    // ---- names ----

    /// Bind a human label to an object. At most one object holds a given name
    /// at a time; rebinding is last-write-wins and silently unlabels the
    /// previous holder.
    pub fn set_name(&mut self, id: ObjectId, name: impl Into<String>) -> SaccadeResult<()> {
        let name = name.into();
        self.get(id)?;
        let old = self.get_mut_opt(id).and_then(|o| o.name.take());
        if let Some(old) = old
            && self.names.get(&old) == Some(&id)
        {
            self.names.remove(&old);
        }
        if let Some(prev) = self.names.insert(name.clone(), id)
            && prev != id
            && let Some(pobj) = self.get_mut_opt(prev)
        {
            pobj.name = None;
        }
        if let Some(obj) = self.get_mut_opt(id) {
            obj.name = Some(name);
        }
        Ok(())
    }

    /// Resolve a name to a handle. The thin lookup the scripting front end
    /// calls; the core does not otherwise participate in name resolution.
    pub fn find(&self, name: &str) -> SaccadeResult<ObjectId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| SaccadeError::unknown_object(format!("no object named {name:?}")))
    }

    // ---- hierarchy ----

    /// Attach `child` to a metagroup, or detach it with `None`.
    ///
    /// Fails with [`Cycle`](SaccadeError::Cycle) when `parent` is `child` or
    /// a descendant of `child`; the hierarchy is left exactly as it was. An
    /// object belongs to at most one metagroup, so attaching detaches from
    /// any previous parent; re-attaching to the unchanged parent is a no-op
    /// on child order.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> SaccadeResult<()> {
        self.get(child)?;
        if let Some(p) = parent {
            if !self.get(p)?.is_group() {
                return Err(SaccadeError::invalid_argument(format!(
                    "{p} is not a metagroup"
                )));
            }
            let mut seen = SmallVec::<[ObjectId; 8]>::new();
            let mut cur = Some(p);
            while let Some(c) = cur {
                if c == child {
                    return Err(SaccadeError::cycle(format!(
                        "{p} is {child} or one of its descendants"
                    )));
                }
                if seen.contains(&c) {
                    return Err(SaccadeError::cycle(format!("parent chain of {p} is cyclic")));
                }
                seen.push(c);
                cur = self.get(c)?.parent;
            }
        }

        let old = self.get(child)?.parent;
        if old == parent {
            return Ok(());
        }
        if let Some(op) = old
            && let Some(oobj) = self.get_mut_opt(op)
            && let Some(children) = oobj.children.as_mut()
        {
            children.retain(|c| *c != child);
        }
        if let Some(np) = parent
            && let Some(nobj) = self.get_mut_opt(np)
            && let Some(children) = nobj.children.as_mut()
        {
            children.push(child);
        }
        if let Some(cobj) = self.get_mut_opt(child) {
            cobj.parent = parent;
        }
        Ok(())
    }

    /// World transform of an object: the parent chain composed root to leaf.
    ///
    /// Depth is unbounded but expected small. A defensive check aborts with
    /// [`Cycle`](SaccadeError::Cycle) instead of looping forever, even though
    /// [`Scene::set_parent`] should have prevented cycles at construction
    /// time.
    pub fn world_transform(&self, id: ObjectId) -> SaccadeResult<Affine> {
        let mut chain = SmallVec::<[ObjectId; 8]>::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            if chain.contains(&c) {
                return Err(SaccadeError::cycle(format!(
                    "parent chain of {id} is cyclic at {c}"
                )));
            }
            chain.push(c);
            cur = self.get(c)?.parent;
        }
        let mut world = Affine::IDENTITY;
        for oid in chain.iter().rev() {
            world = Transform::compose(world, &self.get(*oid)?.local);
        }
        Ok(world)
    }

    // ---- plain mutations ----

    /// Set the draw-order key. No recursive effect on children; a child's
    /// priority is independent of its parent's.
    pub fn set_priority(&mut self, id: ObjectId, priority: f64) -> SaccadeResult<()> {
        if !priority.is_finite() {
            return Err(SaccadeError::invalid_argument(format!(
                "priority must be finite, got {priority}"
            )));
        }
        self.get_mut(id)?.priority = priority;
        Ok(())
    }

    /// Toggle draw-list membership. Invisible objects still receive animation
    /// and script updates when their group slot is dynamic.
    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> SaccadeResult<()> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    /// Replace the local transform.
    pub fn set_local(&mut self, id: ObjectId, local: Transform) -> SaccadeResult<()> {
        self.get_mut(id)?.local = local;
        Ok(())
    }

    /// The local transform.
    pub fn local(&self, id: ObjectId) -> SaccadeResult<Transform> {
        Ok(self.get(id)?.local)
    }

    // ---- display list ----

    /// The display list.
    pub fn display_list(&self) -> &DisplayList {
        &self.glist
    }

    /// Mutable access to the display list.
    pub fn display_list_mut(&mut self) -> &mut DisplayList {
        &mut self.glist
    }

    /// Re-initialize the display list with `slot_count` empty group slots.
    /// Objects the old slots referenced stay alive.
    pub fn glist_init(&mut self, slot_count: usize) {
        self.glist.init(slot_count);
    }

    // ---- animation bindings ----

    /// Bind or atomically replace the parametric animation of an object. The
    /// phase origin is stamped from the current tick's frozen time, and the
    /// object's position/scale are captured as the anchor the update rules
    /// derive from.
    ///
    /// Parameters are validated first; on failure nothing is mutated. Blink
    /// bindings cannot change rate mode (Hz vs frames-per-cycle) without
    /// being cleared first.
    pub fn bind_animation(&mut self, id: ObjectId, kind: AnimKind) -> SaccadeResult<()> {
        kind.validate()?;
        let (now, frame) = (self.clock_now, self.clock_frame);
        let obj = self.get_mut(id)?;
        if let Some(existing) = &obj.binding
            && let (AnimKind::Blink(old), AnimKind::Blink(new)) = (&existing.kind, &kind)
            && !old.rate.same_mode(new.rate)
        {
            return Err(SaccadeError::invalid_argument(
                "blink rate mode cannot change without clearing the binding first",
            ));
        }
        let base = AnimBase {
            position: obj.local.translate,
            scale: obj.local.scale,
        };
        obj.binding = Some(AnimBinding::new(kind, now, frame, base));
        Ok(())
    }

    /// Query the current parameter set of the parametric binding, as bound.
    pub fn animation(&self, id: ObjectId) -> SaccadeResult<Option<&AnimKind>> {
        Ok(self.get(id)?.binding.as_ref().map(AnimBinding::kind))
    }

    /// Pause or resume the parametric binding. Paused bindings are retained,
    /// so parameters remain queryable; resuming does not move the phase
    /// origin, and the next tick jumps to the value for the current elapsed
    /// time.
    pub fn set_animation_active(&mut self, id: ObjectId, active: bool) -> SaccadeResult<()> {
        match self.get_mut(id)?.binding.as_mut() {
            Some(b) => {
                b.active = active;
                Ok(())
            }
            None => Err(SaccadeError::invalid_argument(format!(
                "{id} has no animation bound"
            ))),
        }
    }

    /// Remove the parametric binding. The object keeps whatever state the
    /// last advance applied.
    pub fn clear_animation(&mut self, id: ObjectId) -> SaccadeResult<()> {
        self.get_mut(id)?.binding = None;
        Ok(())
    }

    /// Re-anchor the binding's phase origin to the current tick time and
    /// re-capture the object's position/scale as the new base state.
    pub fn reset_animation_phase(&mut self, id: ObjectId) -> SaccadeResult<()> {
        let (now, frame) = (self.clock_now, self.clock_frame);
        let obj = self.get_mut(id)?;
        let base = AnimBase {
            position: obj.local.translate,
            scale: obj.local.scale,
        };
        match obj.binding.as_mut() {
            Some(b) => {
                b.phase_origin = now;
                b.origin_frame = frame;
                b.base = base;
                Ok(())
            }
            None => Err(SaccadeError::invalid_argument(format!(
                "{id} has no animation bound"
            ))),
        }
    }

    // ---- custom animation ----

    /// Bind or replace the custom callback animation of an object,
    /// independent of its parametric binding.
    pub fn bind_custom(
        &mut self,
        id: ObjectId,
        params: serde_json::Value,
        callback: CustomAnimFn,
    ) -> SaccadeResult<()> {
        let now = self.clock_now;
        self.get_mut(id)?.custom = Some(CustomBinding::new(params, now, callback));
        Ok(())
    }

    /// Query the params the custom animation was bound with.
    pub fn custom_params(&self, id: ObjectId) -> SaccadeResult<Option<&serde_json::Value>> {
        Ok(self.get(id)?.custom.as_ref().map(CustomBinding::params))
    }

    /// Pause or resume the custom animation.
    pub fn set_custom_active(&mut self, id: ObjectId, active: bool) -> SaccadeResult<()> {
        match self.get_mut(id)?.custom.as_mut() {
            Some(c) => {
                c.active = active;
                Ok(())
            }
            None => Err(SaccadeError::invalid_argument(format!(
                "{id} has no custom animation bound"
            ))),
        }
    }

    /// Remove the custom callback animation.
    pub fn clear_custom(&mut self, id: ObjectId) -> SaccadeResult<()> {
        self.get_mut(id)?.custom = None;
        Ok(())
    }

    // ---- object pre-frame hooks ----

    pub(crate) fn alloc_hook_id(&mut self) -> HookId {
        self.next_hook_id += 1;
        HookId(self.next_hook_id)
    }

    /// Register a pre-frame hook on an object. Hooks in one slot run in
    /// registration order, before that tick's animation advance.
    pub fn add_pre_hook(
        &mut self,
        id: ObjectId,
        slot: impl Into<String>,
        callback: PreHookFn,
    ) -> SaccadeResult<HookId> {
        self.get(id)?;
        let hid = self.alloc_hook_id();
        let slot = slot.into();
        if let Some(obj) = self.get_mut_opt(id) {
            hooks::add(&mut obj.pre_hooks, hid, slot, callback);
        }
        Ok(hid)
    }

    /// Swap the callback of the named pre-frame hook slot, keeping its
    /// position and enable state.
    pub fn replace_pre_hook(
        &mut self,
        id: ObjectId,
        slot: &str,
        callback: PreHookFn,
    ) -> SaccadeResult<()> {
        let obj = self.get_mut(id)?;
        if hooks::replace(&mut obj.pre_hooks, slot, callback) {
            Ok(())
        } else {
            Err(SaccadeError::invalid_argument(format!(
                "{id} has no pre-frame hook in slot {slot:?}"
            )))
        }
    }

    /// Toggle a pre-frame hook by id without removing it.
    pub fn set_hook_enabled(&mut self, hook: HookId, enabled: bool) -> SaccadeResult<()> {
        for slot in &mut self.slots {
            if let Some(obj) = slot.obj.as_mut()
                && hooks::set_enabled(&mut obj.pre_hooks, hook, enabled)
            {
                return Ok(());
            }
        }
        Err(unknown_hook(hook))
    }

    /// Remove a pre-frame hook by id.
    pub fn remove_hook(&mut self, hook: HookId) -> SaccadeResult<()> {
        for slot in &mut self.slots {
            if let Some(obj) = slot.obj.as_mut()
                && hooks::remove(&mut obj.pre_hooks, hook)
            {
                return Ok(());
            }
        }
        Err(unknown_hook(hook))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn unknown_hook(hook: HookId) -> SaccadeError {
    SaccadeError::invalid_argument(format!("no hook registered with id {hook:?}"))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
