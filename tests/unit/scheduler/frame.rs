use super::*;
use crate::animation::binding::{
    AnimKind, BlinkParams, BlinkRate, PositionParams, RotationParams,
};
use crate::foundation::core::Vec2;
use crate::scene::object::PropValue;
use crate::scheduler::clock::ManualClock;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

fn leaf(sched: &mut FrameScheduler, priority: f64) -> ObjectId {
    let id = sched.scene_mut().create();
    sched.scene_mut().set_priority(id, priority).unwrap();
    sched.scene_mut().display_list_mut().add(0, id).unwrap();
    id
}

fn spin(speed_deg_per_sec: f64) -> AnimKind {
    AnimKind::Rotation(RotationParams::Continuous { speed_deg_per_sec })
}

#[test]
fn an_empty_scene_ticks_cleanly() {
    let mut s = FrameScheduler::new();
    let out = s.tick(0.0).unwrap();
    assert!(out.draw_list.is_empty());
    assert!(out.failures.is_empty());
    assert_eq!(out.stats.frame_count, 1);
    assert_eq!(s.frame_count(), 1);
}

#[test]
fn tick_time_is_frozen_for_every_callback() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    let seen: Rc<RefCell<Vec<TickCtx>>> = Rc::default();

    let pre_seen = seen.clone();
    s.scene_mut()
        .add_pre_hook(
            a,
            "record",
            Box::new(move |_, _, ctx| {
                pre_seen.borrow_mut().push(ctx);
                Ok(())
            }),
        )
        .unwrap();
    let post_seen = seen.clone();
    s.add_post_hook(
        "record",
        Box::new(move |_, ctx| {
            post_seen.borrow_mut().push(ctx);
            Ok(())
        }),
    );

    s.tick(0.5).unwrap();
    s.tick(0.75).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(
        seen[0],
        TickCtx {
            now: 0.5,
            dt: 0.0,
            frame_count: 1
        }
    );
    assert_eq!(seen[2], seen[3]);
    assert_eq!(
        seen[2],
        TickCtx {
            now: 0.75,
            dt: 0.25,
            frame_count: 2
        }
    );
}

#[test]
fn pre_hooks_see_state_before_the_advance_and_post_hooks_after() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut().bind_animation(a, spin(90.0)).unwrap();

    let pre: Rc<RefCell<Vec<f64>>> = Rc::default();
    let post: Rc<RefCell<Vec<f64>>> = Rc::default();
    let pre_c = pre.clone();
    s.scene_mut()
        .add_pre_hook(
            a,
            "probe",
            Box::new(move |scene, id, _| {
                pre_c.borrow_mut().push(scene.local(id)?.rotation_deg());
                Ok(())
            }),
        )
        .unwrap();
    let post_c = post.clone();
    s.add_post_hook(
        "probe",
        Box::new(move |scene, _| {
            let id = scene.find("spinner")?;
            post_c.borrow_mut().push(scene.local(id)?.rotation_deg());
            Ok(())
        }),
    );
    s.scene_mut().set_name(a, "spinner").unwrap();

    s.tick(1.0).unwrap();
    s.tick(2.0).unwrap();

    let pre = pre.borrow();
    let post = post.borrow();
    assert_close(pre[0], 0.0);
    assert_close(post[0], 90.0);
    assert_close(pre[1], 90.0);
    assert_close(post[1], 180.0);
}

#[test]
fn a_faulting_hook_does_not_blank_the_frame() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    let b = leaf(&mut s, 0.0);
    let c = leaf(&mut s, 0.0);
    for id in [a, b, c] {
        s.scene_mut().bind_animation(id, spin(90.0)).unwrap();
    }
    s.scene_mut()
        .add_pre_hook(b, "bad", Box::new(|_, _, _| anyhow::bail!("scripted fault")))
        .unwrap();

    let out = s.tick(1.0).unwrap();
    assert_eq!(out.draw_list.len(), 3);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.stats.hook_failures, 1);
    assert!(matches!(
        out.failures[0].error,
        SaccadeError::HookFailure(_)
    ));
    assert_eq!(out.failures[0].object, Some(b));
    // The well-behaved objects' animations still advanced.
    assert_close(s.scene().local(a).unwrap().rotation_deg(), 90.0);
    assert_close(s.scene().local(c).unwrap().rotation_deg(), 90.0);
}

#[test]
fn the_draw_sort_is_stable() {
    let mut s = FrameScheduler::new();
    let p2 = leaf(&mut s, 2.0);
    let p1a = leaf(&mut s, 1.0);
    let p1b = leaf(&mut s, 1.0);
    let p0 = leaf(&mut s, 0.0);

    let out = s.tick(0.0).unwrap();
    let order: Vec<ObjectId> = out.draw_list.iter().map(|i| i.object).collect();
    assert_eq!(order, [p0, p1a, p1b, p2]);
}

#[test]
fn a_child_world_transform_is_its_group_composed_with_its_local() {
    let mut s = FrameScheduler::new();
    let g = s.scene_mut().create_group();
    let c = s.scene_mut().create();
    s.scene_mut().set_parent(c, Some(g)).unwrap();
    s.scene_mut().display_list_mut().add(0, g).unwrap();
    s.scene_mut().bind_animation(g, spin(30.0)).unwrap();
    s.scene_mut()
        .bind_animation(
            c,
            AnimKind::Position(PositionParams::Velocity {
                velocity: Vec2::new(2.0, 0.5),
            }),
        )
        .unwrap();

    let out = s.tick(1.5).unwrap();
    assert_eq!(out.draw_list.len(), 1);
    let item = &out.draw_list[0];
    assert_eq!(item.object, c);

    let expected = Transform::compose(
        s.scene().world_transform(g).unwrap(),
        &s.scene().local(c).unwrap(),
    );
    assert_eq!(item.world, expected);
}

#[test]
fn dynamic_slots_advance_even_when_not_drawn() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut().bind_animation(a, spin(90.0)).unwrap();
    s.scene_mut()
        .display_list_mut()
        .set_slot_visible(0, false)
        .unwrap();

    let out = s.tick(1.0).unwrap();
    assert!(out.draw_list.is_empty());
    assert_eq!(out.stats.animations_advanced, 1);
    assert_close(s.scene().local(a).unwrap().rotation_deg(), 90.0);
}

#[test]
fn static_slots_draw_without_advancing() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut().bind_animation(a, spin(90.0)).unwrap();
    let hits: Rc<RefCell<u32>> = Rc::default();
    let hits_c = hits.clone();
    s.scene_mut()
        .add_pre_hook(
            a,
            "count",
            Box::new(move |_, _, _| {
                *hits_c.borrow_mut() += 1;
                Ok(())
            }),
        )
        .unwrap();
    s.scene_mut()
        .display_list_mut()
        .set_slot_dynamic(0, false)
        .unwrap();

    let out = s.tick(1.0).unwrap();
    assert_eq!(out.draw_list.len(), 1);
    assert_eq!(out.stats.animations_advanced, 0);
    assert_eq!(out.stats.hooks_run, 0);
    assert_eq!(*hits.borrow(), 0);
    assert_close(s.scene().local(a).unwrap().rotation_deg(), 0.0);
}

#[test]
fn blink_gates_draw_membership_at_the_duty_cycle() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut()
        .bind_animation(
            a,
            AnimKind::Blink(BlinkParams {
                rate: BlinkRate::Hz(2.0),
                duty: 0.5,
            }),
        )
        .unwrap();

    assert_eq!(s.tick(0.0).unwrap().draw_list.len(), 1);
    assert_eq!(s.tick(0.26).unwrap().draw_list.len(), 0);
    assert_eq!(s.tick(0.51).unwrap().draw_list.len(), 1);
}

#[test]
fn frame_driven_blink_ignores_wall_clock() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.tick(100.0).unwrap();
    // Bound at frame 1; the first advance happens at frame 2.
    s.scene_mut()
        .bind_animation(
            a,
            AnimKind::Blink(BlinkParams {
                rate: BlinkRate::FramesPerCycle(4),
                duty: 0.5,
            }),
        )
        .unwrap();

    let mut pattern = Vec::new();
    for i in 0..8 {
        // Irregular wall-clock times; only the tick count matters.
        let out = s.tick(100.0 + (i as f64) * 0.37).unwrap();
        pattern.push(out.draw_list.len() == 1);
    }
    assert_eq!(
        pattern,
        [true, false, false, true, true, false, false, true]
    );
}

#[test]
fn custom_animations_can_mutate_properties() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut()
        .bind_custom(
            a,
            json!({ "gain": 2.0 }),
            Box::new(|scene, id, ctx, params| {
                let gain = params["gain"].as_f64().unwrap_or(1.0);
                scene
                    .get_mut(id)?
                    .properties
                    .insert("phase".to_owned(), PropValue::F64(ctx.now * gain));
                Ok(())
            }),
        )
        .unwrap();

    let out = s.tick(0.25).unwrap();
    assert!(out.failures.is_empty());
    assert_eq!(out.stats.customs_run, 1);
    assert_eq!(
        s.scene().get(a).unwrap().properties.get("phase"),
        Some(&PropValue::F64(0.5))
    );
    assert_eq!(
        s.scene().custom_params(a).unwrap(),
        Some(&json!({ "gain": 2.0 }))
    );
}

#[test]
fn destroy_drains_the_custom_animation() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    let hits: Rc<RefCell<u32>> = Rc::default();
    let hits_c = hits.clone();
    s.scene_mut()
        .bind_custom(
            a,
            json!(null),
            Box::new(move |_, _, _, _| {
                *hits_c.borrow_mut() += 1;
                Ok(())
            }),
        )
        .unwrap();

    assert!(s.tick(0.1).unwrap().failures.is_empty());
    assert_eq!(*hits.borrow(), 1);

    s.scene_mut().destroy(a).unwrap();
    for now in [0.2, 0.3] {
        let out = s.tick(now).unwrap();
        assert!(out.failures.is_empty());
        assert!(out.draw_list.is_empty());
    }
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn a_hook_cannot_destroy_its_own_object_mid_call() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    let observed: Rc<RefCell<Option<SaccadeError>>> = Rc::default();
    let observed_c = observed.clone();
    s.scene_mut()
        .add_pre_hook(
            a,
            "suicide",
            Box::new(move |scene, id, _| {
                *observed_c.borrow_mut() = Some(scene.destroy(id).unwrap_err());
                Ok(())
            }),
        )
        .unwrap();

    let out = s.tick(0.0).unwrap();
    assert!(out.failures.is_empty());
    assert!(matches!(
        observed.borrow().as_ref(),
        Some(SaccadeError::DanglingReference(_))
    ));
    // The object survived the rejected destroy and is gone after a clean one.
    assert!(s.scene().get(a).is_ok());
    s.scene_mut().destroy(a).unwrap();
    assert!(s.scene().get(a).is_err());
}

#[test]
fn a_hook_may_destroy_other_objects() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    let b = leaf(&mut s, 0.0);
    s.scene_mut().bind_animation(b, spin(90.0)).unwrap();
    s.scene_mut()
        .add_pre_hook(
            a,
            "reaper",
            Box::new(move |scene, _, _| {
                scene.destroy(b)?;
                Ok(())
            }),
        )
        .unwrap();

    let out = s.tick(1.0).unwrap();
    assert!(out.failures.is_empty());
    assert_eq!(out.draw_list.len(), 1);
    assert_eq!(out.draw_list[0].object, a);
    assert_eq!(out.stats.animations_advanced, 0);
    assert!(s.scene().get(b).is_err());
}

#[test]
fn budget_exhaustion_skips_callbacks_but_still_draws() {
    let mut s = FrameScheduler::with_opts(SchedulerOpts {
        hook_budget: Some(Duration::from_millis(1)),
    });
    let a = leaf(&mut s, 0.0);
    let b = leaf(&mut s, 0.0);
    s.scene_mut()
        .add_pre_hook(
            a,
            "runaway",
            Box::new(|_, _, _| {
                std::thread::sleep(Duration::from_millis(10));
                Ok(())
            }),
        )
        .unwrap();
    let hits: Rc<RefCell<u32>> = Rc::default();
    let hits_c = hits.clone();
    s.scene_mut()
        .add_pre_hook(
            b,
            "starved",
            Box::new(move |_, _, _| {
                *hits_c.borrow_mut() += 1;
                Ok(())
            }),
        )
        .unwrap();

    let out = s.tick(0.0).unwrap();
    // Both objects still made it into the frame.
    assert_eq!(out.draw_list.len(), 2);
    assert_eq!(out.stats.hooks_run, 1);
    assert_eq!(*hits.borrow(), 0);
    // One report for the offender, one for the skipped hook.
    assert_eq!(out.failures.len(), 2);
    assert_eq!(out.failures[0].slot, "runaway");
    assert_eq!(out.failures[1].slot, "starved");
}

#[test]
fn post_hooks_run_before_draw_list_assembly() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut().set_name(a, "probe").unwrap();
    s.add_post_hook(
        "hide",
        Box::new(|scene, _| {
            let id = scene.find("probe")?;
            scene.set_visible(id, false)?;
            Ok(())
        }),
    );

    let out = s.tick(0.0).unwrap();
    assert!(out.draw_list.is_empty());
}

#[test]
fn invisible_groups_hide_their_subtree() {
    let mut s = FrameScheduler::new();
    let g = s.scene_mut().create_group();
    let c1 = s.scene_mut().create();
    let c2 = s.scene_mut().create();
    s.scene_mut().set_parent(c1, Some(g)).unwrap();
    s.scene_mut().set_parent(c2, Some(g)).unwrap();
    s.scene_mut().display_list_mut().add(0, g).unwrap();

    s.scene_mut().set_visible(c2, false).unwrap();
    let out = s.tick(0.0).unwrap();
    assert_eq!(out.draw_list.len(), 1);
    assert_eq!(out.draw_list[0].object, c1);

    s.scene_mut().set_visible(g, false).unwrap();
    assert!(s.tick(0.1).unwrap().draw_list.is_empty());
}

#[test]
fn replaying_the_same_times_reproduces_the_same_transforms() {
    fn run() -> Vec<TickOutput> {
        let mut s = FrameScheduler::new();
        let g = s.scene_mut().create_group();
        let c = s.scene_mut().create();
        s.scene_mut().set_parent(c, Some(g)).unwrap();
        s.scene_mut().display_list_mut().add(0, g).unwrap();
        s.scene_mut()
            .bind_animation(
                g,
                AnimKind::Position(PositionParams::Orbit {
                    radius: 3.0,
                    speed_deg_per_sec: 120.0,
                    center: None,
                }),
            )
            .unwrap();
        s.scene_mut()
            .bind_animation(
                c,
                AnimKind::Rotation(RotationParams::Oscillate {
                    amplitude_deg: 15.0,
                    freq_hz: 2.0,
                }),
            )
            .unwrap();
        [0.0, 0.016, 0.033, 0.05]
            .iter()
            .map(|&t| s.tick(t).unwrap())
            .collect()
    }

    let a = run();
    let b = run();
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.draw_list, y.draw_list);
        assert_eq!(x.stats, y.stats);
    }
}

#[test]
fn rotation_replay_is_frame_rate_independent() {
    fn rot_after(times: &[f64]) -> f64 {
        let mut s = FrameScheduler::new();
        let a = leaf(&mut s, 0.0);
        s.scene_mut().bind_animation(a, spin(45.0)).unwrap();
        for &t in times {
            s.tick(t).unwrap();
        }
        s.scene().local(a).unwrap().rotation_deg()
    }

    let coarse = rot_after(&[2.0]);
    let fine = rot_after(&[0.5, 1.0, 1.5, 2.0]);
    assert_close(coarse, 90.0);
    assert_close(fine, 90.0);
}

#[test]
fn resetting_the_phase_re_anchors_elapsed_time() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut().bind_animation(a, spin(90.0)).unwrap();
    s.tick(1.0).unwrap();
    s.tick(2.0).unwrap();
    assert_close(s.scene().local(a).unwrap().rotation_deg(), 180.0);

    // Re-anchored at the last tick's frozen time (2.0).
    s.scene_mut().reset_animation_phase(a).unwrap();
    s.tick(3.0).unwrap();
    assert_close(s.scene().local(a).unwrap().rotation_deg(), 90.0);
}

#[test]
fn paused_custom_animations_do_not_run() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    let hits: Rc<RefCell<u32>> = Rc::default();
    let hits_c = hits.clone();
    s.scene_mut()
        .bind_custom(
            a,
            json!(null),
            Box::new(move |_, _, _, _| {
                *hits_c.borrow_mut() += 1;
                Ok(())
            }),
        )
        .unwrap();
    s.scene_mut().set_custom_active(a, false).unwrap();

    let out = s.tick(0.1).unwrap();
    assert_eq!(out.stats.customs_run, 0);
    assert_eq!(*hits.borrow(), 0);

    s.scene_mut().set_custom_active(a, true).unwrap();
    s.tick(0.2).unwrap();
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn manual_clock_drives_ticks() {
    let mut s = FrameScheduler::new();
    let a = leaf(&mut s, 0.0);
    s.scene_mut().bind_animation(a, spin(90.0)).unwrap();

    let mut clock = ManualClock::new();
    s.tick_with(&mut clock).unwrap();
    clock.advance(1.0);
    s.tick_with(&mut clock).unwrap();
    assert_close(s.scene().local(a).unwrap().rotation_deg(), 90.0);
}
