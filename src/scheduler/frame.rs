use std::collections::HashSet;
use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::foundation::core::{Affine, HookId, ObjectId, Seconds};
use crate::foundation::error::{SaccadeError, SaccadeResult};
use crate::render::draw::{DrawItem, DrawList, Renderer};
use crate::scene::graph::Scene;
use crate::scene::transform::Transform;
use crate::scheduler::clock::Clock;
use crate::script::hooks::{self, HookEntry, PostHookFn};

/// Per-tick time context, frozen at the top of the tick and passed
/// identically to every hook and animation invoked during it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickCtx {
    /// Scheduler time of this tick in seconds.
    pub now: Seconds,
    /// Time since the previous tick; zero on the first tick.
    pub dt: Seconds,
    /// Count of ticks including this one. The first tick is 1.
    pub frame_count: u64,
}

/// Tunables for the per-tick driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchedulerOpts {
    /// Optional wall-clock budget for script and custom-animation callbacks
    /// within one tick. When a callback returns past the budget, the
    /// remaining callbacks of that tick are skipped (each skip is reported)
    /// and a best-effort draw list is still produced. `None` disables the
    /// cap: a callback performing unbounded work then stalls the whole
    /// presentation loop.
    pub hook_budget: Option<Duration>,
}

/// Report for a callback that faulted or was skipped during a tick.
#[derive(Debug)]
pub struct HookReport {
    /// Object the callback was attached to; `None` for frame-level hooks.
    pub object: Option<ObjectId>,
    /// Slot name of the hook, or `"custom"` for a custom animation.
    pub slot: String,
    /// What happened.
    pub error: SaccadeError,
}

/// Counters for one completed tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// The tick's frame count.
    pub frame_count: u64,
    /// Script hooks invoked (pre and post), including ones that faulted.
    pub hooks_run: usize,
    /// Hooks and custom callbacks that faulted.
    pub hook_failures: usize,
    /// Parametric bindings advanced.
    pub animations_advanced: usize,
    /// Custom-animation callbacks invoked.
    pub customs_run: usize,
    /// Items in the emitted draw list.
    pub draw_items: usize,
}

/// Output of one tick: the sorted draw list plus diagnostics.
///
/// A tick that reaches the caller always carries a complete draw list; hook
/// faults are contained per hook and surface in `failures`, never as a blank
/// or partial frame.
#[derive(Debug)]
pub struct TickOutput {
    /// Priority-sorted draw commands for the external renderer.
    pub draw_list: DrawList,
    /// Counters for this tick.
    pub stats: TickStats,
    /// Callbacks that faulted or were skipped this tick.
    pub failures: Vec<HookReport>,
}

/// The per-tick driver: owns the scene, computes frame time, runs hooks and
/// animations in the contract order, and flattens the hierarchy into a
/// priority-sorted draw list.
///
/// Single-threaded and cooperative: one tick per video frame, never
/// re-entered, no blocking mid-tick. Within a tick, pre-frame hooks precede
/// animation advance, which precedes post-frame hooks, which precede
/// draw-list assembly, for every object; cross-object order is the
/// depth-first traversal of the display list's slots.
pub struct FrameScheduler {
    scene: Scene,
    post_hooks: Vec<HookEntry<PostHookFn>>,
    previous_now: Option<Seconds>,
    frame_count: u64,
    ticking: bool,
    opts: SchedulerOpts,
}

impl FrameScheduler {
    /// Scheduler over an empty scene, default options.
    pub fn new() -> Self {
        Self::with_opts(SchedulerOpts::default())
    }

    /// Scheduler over an empty scene with explicit options.
    pub fn with_opts(opts: SchedulerOpts) -> Self {
        Self {
            scene: Scene::new(),
            post_hooks: Vec::new(),
            previous_now: None,
            frame_count: 0,
            ticking: false,
            opts,
        }
    }

    /// The owned scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the owned scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Ticks completed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Time of the most recent completed tick, if any.
    pub fn previous_now(&self) -> Option<Seconds> {
        self.previous_now
    }

    // ---- frame-level hooks ----

    /// Register a frame-level post-frame hook. Post-frame hooks run after the
    /// animation advance of every object and before draw-list assembly, in
    /// registration order.
    pub fn add_post_hook(&mut self, slot: impl Into<String>, callback: PostHookFn) -> HookId {
        let id = self.scene.alloc_hook_id();
        hooks::add(&mut self.post_hooks, id, slot, callback);
        id
    }

    /// Swap the callback of the named post-frame hook slot, keeping its
    /// position and enable state.
    pub fn replace_post_hook(&mut self, slot: &str, callback: PostHookFn) -> SaccadeResult<()> {
        if hooks::replace(&mut self.post_hooks, slot, callback) {
            Ok(())
        } else {
            Err(SaccadeError::invalid_argument(format!(
                "no post-frame hook in slot {slot:?}"
            )))
        }
    }

    /// Toggle any hook (frame-level or object pre-frame) by id without
    /// removing it.
    pub fn set_hook_enabled(&mut self, hook: HookId, enabled: bool) -> SaccadeResult<()> {
        if hooks::set_enabled(&mut self.post_hooks, hook, enabled) {
            return Ok(());
        }
        self.scene.set_hook_enabled(hook, enabled)
    }

    /// Remove any hook (frame-level or object pre-frame) by id.
    pub fn remove_hook(&mut self, hook: HookId) -> SaccadeResult<()> {
        if hooks::remove(&mut self.post_hooks, hook) {
            return Ok(());
        }
        self.scene.remove_hook(hook)
    }

    // ---- the tick ----

    /// Run one tick at scheduler time `now` and return the sorted draw list.
    ///
    /// The tick either completes fully or is aborted by a fatal error before
    /// producing a draw list; partial draw lists are never emitted. Hook and
    /// custom-animation faults are not fatal: they are caught per callback,
    /// logged, reported in the output, and the tick continues.
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self, now: Seconds) -> SaccadeResult<TickOutput> {
        if self.ticking {
            return Err(SaccadeError::invalid_argument("tick is not re-entrant"));
        }
        self.ticking = true;
        let out = self.tick_inner(now);
        self.ticking = false;
        out
    }

    /// Run one tick using a [`Clock`] as the time source.
    pub fn tick_with(&mut self, clock: &mut dyn Clock) -> SaccadeResult<TickOutput> {
        let now = clock.now();
        self.tick(now)
    }

    /// Run one tick and hand the draw list to a renderer.
    pub fn run_frame(
        &mut self,
        now: Seconds,
        renderer: &mut dyn Renderer,
    ) -> SaccadeResult<TickOutput> {
        let out = self.tick(now)?;
        renderer
            .draw(&self.scene, &out.draw_list)
            .map_err(SaccadeError::Other)?;
        Ok(out)
    }

    fn tick_inner(&mut self, now: Seconds) -> SaccadeResult<TickOutput> {
        let dt = self.previous_now.map_or(0.0, |prev| now - prev);
        self.frame_count += 1;
        let ctx = TickCtx {
            now,
            dt,
            frame_count: self.frame_count,
        };
        self.scene.clock_now = now;
        self.scene.clock_frame = self.frame_count;

        let deadline = self.opts.hook_budget.map(|budget| Instant::now() + budget);
        let mut budget_spent = false;
        let mut stats = TickStats {
            frame_count: self.frame_count,
            ..TickStats::default()
        };
        let mut failures = Vec::new();

        let order = self.dynamic_order()?;

        for &id in &order {
            self.run_pre_hooks_for(id, ctx, deadline, &mut stats, &mut failures, &mut budget_spent);
        }

        for &id in &order {
            if let Some(obj) = self.scene.get_mut_opt(id)
                && let Some(binding) = obj.binding.clone()
                && binding.is_active()
            {
                binding.apply_to(&mut obj.local, &mut obj.visible, now, ctx.frame_count);
                stats.animations_advanced += 1;
            }
            self.run_custom_for(id, ctx, deadline, &mut stats, &mut failures, &mut budget_spent);
        }

        self.run_post_hooks(ctx, deadline, &mut stats, &mut failures, &mut budget_spent);

        let mut draw_list = self.assemble()?;
        // Stable sort: within-slot depth-first order is the tie-break.
        draw_list.sort_by(|a, b| a.priority.total_cmp(&b.priority));
        stats.draw_items = draw_list.len();

        self.previous_now = Some(now);
        Ok(TickOutput {
            draw_list,
            stats,
            failures,
        })
    }

    /// Depth-first, parent-before-children order over every object reachable
    /// from a dynamic group slot, visible or not. Objects reachable more than
    /// once (for instance from two slots) are visited once.
    fn dynamic_order(&self) -> SaccadeResult<Vec<ObjectId>> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        for slot in self.scene.display_list().slots() {
            if !slot.dynamic {
                continue;
            }
            for &root in slot.members() {
                self.push_subtree(root, &mut order, &mut visited)?;
            }
        }
        Ok(order)
    }

    fn push_subtree(
        &self,
        root: ObjectId,
        order: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
    ) -> SaccadeResult<()> {
        let mut stack: SmallVec<[(ObjectId, usize); 16]> = SmallVec::new();
        let mut path: SmallVec<[ObjectId; 8]> = SmallVec::new();
        stack.push((root, 0));
        while let Some((id, depth)) = stack.pop() {
            path.truncate(depth);
            if path.contains(&id) {
                return Err(SaccadeError::cycle(format!(
                    "child graph under {root} is cyclic at {id}"
                )));
            }
            if !visited.insert(id) {
                continue;
            }
            // Stale display-list entries are skipped, not an error.
            let Some(obj) = self.scene.get_opt(id) else {
                continue;
            };
            order.push(id);
            let children = obj.children();
            if !children.is_empty() {
                path.push(id);
                for &c in children.iter().rev() {
                    stack.push((c, depth + 1));
                }
            }
        }
        Ok(())
    }

    fn run_pre_hooks_for(
        &mut self,
        id: ObjectId,
        ctx: TickCtx,
        deadline: Option<Instant>,
        stats: &mut TickStats,
        failures: &mut Vec<HookReport>,
        budget_spent: &mut bool,
    ) {
        let Some(obj) = self.scene.get_mut_opt(id) else {
            return;
        };
        if obj.pre_hooks.is_empty() {
            return;
        }
        // Check the hook list out of the object so the callback can borrow
        // the whole scene; the object is pinned against destroy meanwhile.
        let mut entries = std::mem::take(&mut obj.pre_hooks);
        obj.pinned = true;
        for entry in entries.iter_mut() {
            if !entry.enabled {
                continue;
            }
            if *budget_spent {
                failures.push(skipped_report(Some(id), &entry.slot));
                continue;
            }
            stats.hooks_run += 1;
            if let Err(err) = (entry.callback)(&mut self.scene, id, ctx) {
                stats.hook_failures += 1;
                tracing::warn!(%id, slot = %entry.slot, error = %err, "pre-frame hook failed");
                failures.push(HookReport {
                    object: Some(id),
                    slot: entry.slot.clone(),
                    error: SaccadeError::hook_failure(format!(
                        "pre-frame hook {:?} on {id}: {err:#}",
                        entry.slot
                    )),
                });
            }
            check_budget(deadline, budget_spent, Some(id), &entry.slot, failures);
        }
        // Hooks registered during the invocation land after the originals,
        // preserving registration order.
        if let Some(obj) = self.scene.get_mut_opt(id) {
            obj.pinned = false;
            let mut added = std::mem::take(&mut obj.pre_hooks);
            entries.append(&mut added);
            obj.pre_hooks = entries;
        }
    }

    fn run_custom_for(
        &mut self,
        id: ObjectId,
        ctx: TickCtx,
        deadline: Option<Instant>,
        stats: &mut TickStats,
        failures: &mut Vec<HookReport>,
        budget_spent: &mut bool,
    ) {
        let Some(obj) = self.scene.get_mut_opt(id) else {
            return;
        };
        let Some(custom) = obj.custom.as_mut() else {
            return;
        };
        if !custom.active {
            return;
        }
        if *budget_spent {
            failures.push(skipped_report(Some(id), "custom"));
            return;
        }
        let Some(mut callback) = custom.callback.take() else {
            return;
        };
        let params = custom.params.clone();
        obj.pinned = true;

        stats.customs_run += 1;
        if let Err(err) = callback(&mut self.scene, id, ctx, &params) {
            stats.hook_failures += 1;
            tracing::warn!(%id, error = %err, "custom animation failed");
            failures.push(HookReport {
                object: Some(id),
                slot: "custom".to_owned(),
                error: SaccadeError::hook_failure(format!("custom animation on {id}: {err:#}")),
            });
        }
        check_budget(deadline, budget_spent, Some(id), "custom", failures);

        if let Some(obj) = self.scene.get_mut_opt(id) {
            obj.pinned = false;
            if let Some(custom) = obj.custom.as_mut()
                && custom.callback.is_none()
            {
                // Re-install unless the callback re-bound itself meanwhile.
                custom.callback = Some(callback);
            }
        }
    }

    fn run_post_hooks(
        &mut self,
        ctx: TickCtx,
        deadline: Option<Instant>,
        stats: &mut TickStats,
        failures: &mut Vec<HookReport>,
        budget_spent: &mut bool,
    ) {
        let scene = &mut self.scene;
        for entry in self.post_hooks.iter_mut() {
            if !entry.enabled {
                continue;
            }
            if *budget_spent {
                failures.push(skipped_report(None, &entry.slot));
                continue;
            }
            stats.hooks_run += 1;
            if let Err(err) = (entry.callback)(scene, ctx) {
                stats.hook_failures += 1;
                tracing::warn!(slot = %entry.slot, error = %err, "post-frame hook failed");
                failures.push(HookReport {
                    object: None,
                    slot: entry.slot.clone(),
                    error: SaccadeError::hook_failure(format!(
                        "post-frame hook {:?}: {err:#}",
                        entry.slot
                    )),
                });
            }
            check_budget(deadline, budget_spent, None, &entry.slot, failures);
        }
    }

    /// Walk every visible slot's hierarchy, composing world transforms, and
    /// collect visible leaves in traversal order. An invisible metagroup
    /// hides its whole subtree; metagroups themselves emit no items.
    fn assemble(&self) -> SaccadeResult<DrawList> {
        let mut items = DrawList::new();
        let mut visited = HashSet::new();
        for slot in self.scene.display_list().slots() {
            if !slot.visible {
                continue;
            }
            for &root in slot.members() {
                self.collect_draw(root, &mut items, &mut visited)?;
            }
        }
        Ok(items)
    }

    fn collect_draw(
        &self,
        root: ObjectId,
        items: &mut DrawList,
        visited: &mut HashSet<ObjectId>,
    ) -> SaccadeResult<()> {
        let mut stack: SmallVec<[(ObjectId, usize, Affine); 16]> = SmallVec::new();
        let mut path: SmallVec<[ObjectId; 8]> = SmallVec::new();
        stack.push((root, 0, Affine::IDENTITY));
        while let Some((id, depth, parent_world)) = stack.pop() {
            path.truncate(depth);
            if path.contains(&id) {
                return Err(SaccadeError::cycle(format!(
                    "child graph under {root} is cyclic at {id}"
                )));
            }
            if !visited.insert(id) {
                continue;
            }
            let Some(obj) = self.scene.get_opt(id) else {
                continue;
            };
            if !obj.visible {
                continue;
            }
            let world = Transform::compose(parent_world, &obj.local);
            if obj.is_group() {
                path.push(id);
                for &c in obj.children().iter().rev() {
                    stack.push((c, depth + 1, world));
                }
            } else {
                items.push(DrawItem {
                    object: id,
                    world,
                    priority: obj.priority(),
                });
            }
        }
        Ok(())
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn skipped_report(object: Option<ObjectId>, slot: &str) -> HookReport {
    HookReport {
        object,
        slot: slot.to_owned(),
        error: SaccadeError::hook_failure("skipped: tick hook budget exhausted"),
    }
}

fn check_budget(
    deadline: Option<Instant>,
    budget_spent: &mut bool,
    object: Option<ObjectId>,
    slot: &str,
    failures: &mut Vec<HookReport>,
) {
    if *budget_spent {
        return;
    }
    if let Some(d) = deadline
        && Instant::now() > d
    {
        *budget_spent = true;
        tracing::warn!(slot, "tick hook budget exhausted");
        failures.push(HookReport {
            object,
            slot: slot.to_owned(),
            error: SaccadeError::hook_failure("tick hook budget exhausted after this callback"),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/frame.rs"]
mod tests;
