//! Minimal presentation loop: an orbiting grating with a blinking probe,
//! driven by the system clock for two seconds and printed frame by frame.
//!
//! ```sh
//! cargo run --example orbit_demo
//! ```

use saccade::{
    AnimKind, BlinkParams, BlinkRate, Clock, FrameScheduler, PositionParams, Scene,
    SystemClock, Vec2,
};

fn build(scene: &mut Scene) -> anyhow::Result<()> {
    let grating = scene.create();
    scene.set_name(grating, "grating")?;
    scene.display_list_mut().add(0, grating)?;
    scene.bind_animation(
        grating,
        AnimKind::Position(PositionParams::Orbit {
            radius: 5.0,
            speed_deg_per_sec: 90.0,
            center: Some(Vec2::ZERO),
        }),
    )?;

    let probe = scene.create();
    scene.set_name(probe, "probe")?;
    scene.set_priority(probe, 1.0)?;
    scene.display_list_mut().add(0, probe)?;
    scene.bind_animation(
        probe,
        AnimKind::Blink(BlinkParams {
            rate: BlinkRate::Hz(4.0),
            duty: 0.5,
        }),
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let mut sched = FrameScheduler::new();
    build(sched.scene_mut())?;

    let mut clock = SystemClock::new();
    while clock.now() < 2.0 {
        let out = sched.tick_with(&mut clock)?;
        let names: Vec<&str> = out
            .draw_list
            .iter()
            .filter_map(|item| sched.scene().get(item.object).ok())
            .filter_map(|obj| obj.name())
            .collect();
        println!(
            "frame {:>3} [{} items] {:?}",
            out.stats.frame_count,
            out.stats.draw_items,
            names
        );
        std::thread::sleep(std::time::Duration::from_millis(16));
    }
    Ok(())
}
