//! skirmish-harness: headless driver for SKIRMISH sessions.
//!
//! Usage:
//!   skirmish-harness run --config game.json --seconds 60 --auto
//!   skirmish-harness run --seconds 30 --save quick --save-dir saves
//!   skirmish-harness saves --save-dir saves
//!   skirmish-harness default-config

use std::path::{Path, PathBuf};
use std::process;

use glam::Vec2;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use skirmish_core::components::{ComponentKind, Transform};
use skirmish_core::events::GameEvent;
use skirmish_core::input::{ButtonAction, InputEvent};
use skirmish_sim::persistence::{list_saves, load_from_file, save_to_file};
use skirmish_sim::{GameConfig, Session};

/// Rendered frame time the harness simulates.
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "saves" => cmd_saves(&args[2..]),
        "default-config" => cmd_default_config(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "skirmish-harness: headless SKIRMISH session driver\n\
         \n\
         Commands:\n\
         \n\
         run             Run a session with scripted input\n\
         \n\
           --config <path>    JSON game config (default: built-in)\n\
           --seconds <N>      Simulated seconds to run (default: 60)\n\
           --auto             Start the next wave as soon as it is allowed\n\
           --load <slot>      Resume from a save slot\n\
           --save <slot>      Save the session to a slot when done\n\
           --save-dir <path>  Save directory (default: saves)\n\
         \n\
         saves           List save slots, newest first\n\
         \n\
           --save-dir <path>  Save directory (default: saves)\n\
         \n\
         default-config  Print the built-in config as JSON\n"
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn save_dir(args: &[String]) -> PathBuf {
    PathBuf::from(flag_value(args, "--save-dir").unwrap_or("saves"))
}

fn load_config(path: Option<&str>) -> GameConfig {
    let Some(path) = path else {
        return GameConfig::default();
    };
    match GameConfig::load(Path::new(path)) {
        Ok(config) => config,
        Err(e) => {
            error!(path, error = %e, "failed to load config");
            process::exit(1);
        }
    }
}

fn cmd_run(args: &[String]) {
    let config = load_config(flag_value(args, "--config"));
    let seconds: f32 = match flag_value(args, "--seconds").map(str::parse) {
        None => 60.0,
        Some(Ok(s)) if s > 0.0 => s,
        Some(_) => {
            eprintln!("Error: --seconds must be a positive number");
            process::exit(1);
        }
    };
    let auto = has_flag(args, "--auto");
    let dir = save_dir(args);

    let mut session = match flag_value(args, "--load") {
        Some(slot) => match load_from_file(&dir, slot) {
            Ok(save) => Session::from_save(config, &save),
            Err(e) => {
                error!(slot, error = %e, "failed to load save");
                process::exit(1);
            }
        },
        None => Session::new(config),
    };

    session.push_input(InputEvent::ActionStarted {
        action: ButtonAction::Fire,
    });

    let frames = (seconds / FRAME_DT).ceil() as u64;
    let mut defeated = false;
    for frame in 0..frames {
        if auto || frame == 0 {
            session.start_next_wave();
        }
        script_input(&mut session, frame);
        session.frame(FRAME_DT);

        for event in session.drain_events() {
            match event {
                GameEvent::WaveStarted { wave, enemy_count } => info!(wave, enemy_count, "wave started"),
                GameEvent::WaveCompleted { wave } => info!(wave, score = session.score().score, "wave completed"),
                GameEvent::PlayerDefeated { .. } => defeated = true,
                _ => {}
            }
        }
        if defeated {
            warn!(frame, "player defeated, stopping");
            break;
        }
    }

    let score = session.score();
    info!(
        score = score.score,
        kills = score.kills,
        waves_completed = score.waves_completed,
        ticks = session.world().time().tick,
        "run finished"
    );

    if let Some(slot) = flag_value(args, "--save") {
        let save = session.to_save(slot);
        match save_to_file(&dir, slot, &save) {
            Ok(()) => info!(slot, dir = %dir.display(), "session saved"),
            Err(e) => {
                error!(slot, error = %e, "failed to save session");
                process::exit(1);
            }
        }
    }
}

/// Circle the arena while aiming at the nearest enemy.
fn script_input(session: &mut Session, frame: u64) {
    if frame % 30 == 0 {
        let angle = frame as f32 * FRAME_DT * 0.5;
        session.push_input(InputEvent::movement(Vec2::from_angle(angle)));
    }

    let world = session.world();
    let Some(player) = world.player_position() else {
        return;
    };
    let nearest = world
        .entities()
        .iter()
        .filter(|e| e.has(ComponentKind::Enemy))
        .filter_map(|e| e.get::<Transform>())
        .map(|t| t.position)
        .min_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player)));
    if let Some(target) = nearest {
        session.push_input(InputEvent::aim(target - player));
    }
}

fn cmd_saves(args: &[String]) {
    let dir = save_dir(args);
    let saves = list_saves(&dir);
    if saves.is_empty() {
        println!("No saves in {}", dir.display());
        return;
    }
    for save in saves {
        println!(
            "{:<20} waves {:>3}  score {:>8}  at {}",
            save.slot_name, save.waves_completed, save.score, save.timestamp
        );
    }
}

fn cmd_default_config() {
    match GameConfig::default().to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
