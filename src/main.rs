//! Ashfall - Entry Point
//!
//! Headless driver: prints a generated floor and runs a short boss fight
//! with a simple autopilot standing in for the player.
//!
//! Usage:
//!   ashfall [floor|sim|export <dir>] [seed]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ashfall::entities::{BossKind, PlayerInput};
use ashfall::game::{Game, GameScreen};
use ashfall::world::generation::generate_floor;
use ashfall::{DataManager, Interactable, Position, Vec2};

/// Simulation step
const FRAME_TIME: f32 = 1.0 / 60.0;
/// Give up on the fight after this many frames
const MAX_FRAMES: u32 = 60 * 180;
/// Autopilot keeps its distance inside this band
const PREFERRED_RANGE: (f32, f32) = (160.0, 320.0);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Ashfall v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("floor");

    match command {
        "export" => {
            let dir = args.get(1).map(PathBuf::from).context("export needs a target directory")?;
            ashfall::data::export_default_data(&dir)
                .with_context(|| format!("failed to export data to {}", dir.display()))?;
            println!("Default data written to {}", dir.display());
        }
        "floor" => print_floor(parse_seed(args.get(1))?)?,
        "sim" => run_boss_fight(parse_seed(args.get(1))?)?,
        other => bail!("unknown command '{}', expected floor, sim or export", other),
    }
    Ok(())
}

fn parse_seed(arg: Option<&String>) -> Result<u64> {
    match arg {
        Some(text) => text.parse().with_context(|| format!("invalid seed '{}'", text)),
        None => Ok(rand::random()),
    }
}

fn load_data() -> Result<DataManager> {
    DataManager::new().context("failed to load game data")
}

/// Generate one floor and dump the grid and its stats
fn print_floor(seed: u64) -> Result<()> {
    let data = load_data()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let floor = generate_floor(&data.generation, &data.templates, &mut rng).context("floor generation failed")?;

    println!("{}", floor.grid.to_ascii());
    println!("seed: {}", seed);
    println!("{}", serde_json::to_string_pretty(&floor.stats)?);
    Ok(())
}

/// Fight the first boss until it drops the door, the player dies, or time runs out
fn run_boss_fight(seed: u64) -> Result<()> {
    let mut game = Game::new(load_data()?, seed).context("failed to start a run")?;
    game.enter_screen(GameScreen::BossArena { depth: 1, boss: BossKind::Boss1 })?;

    let mut hits_taken = 0;
    let mut hits_dealt = 0;
    for frame in 0..MAX_FRAMES {
        let input = autopilot(&game);
        let report = game.tick(FRAME_TIME, &input)?;

        for hit in &report.hits {
            if hit.target == game.player() {
                hits_taken += 1;
            } else {
                hits_dealt += 1;
            }
        }
        if let Some(line) = report.dialogue {
            log::debug!("NPC: {}", line);
        }
        if report.player_died {
            println!("Player died after {:.1}s", frame as f32 * FRAME_TIME);
            break;
        }
        if let Some(GameScreen::InBetween { .. }) = report.entered {
            println!("Boss defeated after {:.1}s", frame as f32 * FRAME_TIME);
            break;
        }
    }

    let health = game.player_health().map(|h| h.current).unwrap_or(0);
    println!("screen: {}", game.screen().name());
    println!("hits dealt: {}, hits taken: {}, health left: {}", hits_dealt, hits_taken, health);
    println!("{}", serde_json::to_string_pretty(game.goals())?);
    Ok(())
}

/// Strafe around the nearest enemy at range and keep firing at it
fn autopilot(game: &Game) -> PlayerInput {
    let Some(at) = game.player_position() else {
        return PlayerInput::default();
    };
    let nearest = game
        .enemy_positions()
        .into_iter()
        .min_by(|a, b| a.distance(at).total_cmp(&b.distance(at)));

    let Some(target) = nearest else {
        // Nothing left to shoot: walk to the door the boss dropped
        let door = game
            .world()
            .query::<(&Position, &Interactable)>()
            .iter()
            .find(|(_, (_, i))| matches!(i, Interactable::Door(_)))
            .map(|(_, (pos, _))| pos.0);
        return PlayerInput {
            movement: door.map(|d| d - at).unwrap_or(Vec2::ZERO),
            interact: true,
            ..PlayerInput::default()
        };
    };

    let to_target = target - at;
    let distance = to_target.length();
    let toward = to_target.normalize_or_zero();
    let strafe = Vec2::new(-toward.y, toward.x);
    let movement = if distance > PREFERRED_RANGE.1 {
        toward + strafe * 0.5
    } else if distance < PREFERRED_RANGE.0 {
        -toward + strafe * 0.5
    } else {
        strafe
    };

    PlayerInput {
        movement,
        aim: toward,
        cast_projectile: true,
        cast_movement: distance < PREFERRED_RANGE.0 * 0.5,
        interact: true,
        apply_to_movement: false,
    }
}
