//! Emberhorde entry point
//!
//! Runs a headless demo: a scripted player kites in a circle while the
//! simulation advances on a fixed timestep, then prints a run summary and
//! writes a JSON snapshot of the final state.
//!
//! Usage: emberhorde [seed] [class-index] [duration-seconds]

use glam::Vec2;

use emberhorde::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use emberhorde::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(1337);
    let class_index: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(0);
    let duration: f32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(120.0);

    log::info!("Emberhorde headless demo (seed {seed}, class {class_index}, {duration}s)");

    let mut state = GameState::new(seed);
    state.start_run(class_index);
    if state.phase != GamePhase::Running {
        eprintln!("unknown class index {class_index} (0..3)");
        std::process::exit(1);
    }

    let mut kills: u64 = 0;
    let mut damage_dealt: f64 = 0.0;
    let mut crits: u64 = 0;

    // Feed the sim in wall-clock-sized frames through the same clamped
    // accumulator a rendering frontend would use
    let frame_dt: f32 = 1.0 / 30.0;
    let mut accumulator = 0.0;
    let mut simulated = 0.0;
    while simulated < duration && state.phase == GamePhase::Running {
        accumulator += frame_dt.min(MAX_FRAME_DT);
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = scripted_input(state.elapsed);
            tick(&mut state, &input, SIM_DT);
            accumulator -= SIM_DT;
            simulated += SIM_DT;
            substeps += 1;
        }
        // Anything left after the substep cap is dropped, not carried
        if substeps == MAX_SUBSTEPS {
            accumulator = 0.0;
        }

        for event in state.drain_events() {
            match event {
                GameEvent::EnemyKilled { .. } => kills += 1,
                GameEvent::DamageDealt { amount, crit, .. } => {
                    damage_dealt += amount as f64;
                    if crit {
                        crits += 1;
                    }
                }
                GameEvent::LevelUp { level } => println!("[{:6.1}s] level {level}", state.elapsed),
                GameEvent::WeaponEvolved { weapon } => {
                    println!("[{:6.1}s] {weapon:?} evolved", state.elapsed)
                }
                GameEvent::PlayerDied => println!("[{:6.1}s] player died", state.elapsed),
                GameEvent::CrystalCollected { .. } => {}
            }
        }
    }

    println!("\n--- run summary ---");
    println!("survived     {:.1}s", state.elapsed);
    println!("level        {}", state.player.level);
    println!("kills        {kills}");
    println!("damage dealt {damage_dealt:.0} ({crits} crits)");
    println!("enemies left {}", state.enemies.len());
    println!(
        "weapons      {:?}",
        state
            .player
            .weapons
            .iter()
            .map(|w| (w.kind, w.level, w.evolved))
            .collect::<Vec<_>>()
    );

    match serde_json::to_string_pretty(&state) {
        Ok(json) => {
            let path = "emberhorde-snapshot.json";
            if let Err(e) = std::fs::write(path, json) {
                log::error!("failed to write snapshot: {e}");
            } else {
                println!("snapshot     {path}");
            }
        }
        Err(e) => log::error!("failed to serialize snapshot: {e}"),
    }
}

/// Circle-strafe around the spawn point, the standard survival pattern
fn scripted_input(elapsed: f32) -> TickInput {
    let angle = elapsed * 0.6;
    TickInput {
        move_dir: Vec2::new(-angle.sin(), angle.cos()),
    }
}
