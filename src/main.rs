// ============================================
// Headless Demo - Наблюдатель идёт через секторы
// ============================================

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use ultraviolet::Vec3;

use terrain_stream::{HeadlessPawn, HeadlessWorld, TerrainConfig, TerrainError, TerrainManager};

const FRAME: Duration = Duration::from_millis(16);
/// Скорость наблюдателя, мировых единиц в секунду
const WALK_SPEED: f32 = 2000.0;
const RUN_TIME: Duration = Duration::from_secs(8);

fn load_config() -> Result<TerrainConfig, TerrainError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading terrain config from {}", path);
            TerrainConfig::from_file(&path)?
        }
        None => TerrainConfig::builtin()?,
    };
    Ok(config)
}

fn run() -> Result<(), TerrainError> {
    let config = load_config()?;
    let mut manager = TerrainManager::new(HeadlessWorld::new(), config)?;
    manager.begin_play()?;

    let pawn = HeadlessPawn::new(Vec3::zero());
    let pawn_id = manager.add_pawn(pawn.clone());

    let start = Instant::now();
    let mut last_frame = start;
    let mut last_report = start;
    while start.elapsed() < RUN_TIME {
        let now = Instant::now();
        let dt = (now - last_frame).as_secs_f32();
        last_frame = now;

        let walked = start.elapsed().as_secs_f32() * WALK_SPEED;
        pawn.set_location(Vec3::new(walked, walked * 0.5, 0.0));
        manager.tick(dt);

        if now - last_report >= Duration::from_secs(1) {
            last_report = now;
            let stats = manager.stats();
            log::info!(
                "sector {:?}: live {} free {} spawned {}, pending {}, applied {}, discarded {}",
                manager.pawn_sector(pawn_id),
                stats.live_tiles,
                stats.free_tiles,
                stats.spawned_tiles,
                stats.pending_jobs,
                stats.applied_jobs,
                stats.discarded_jobs
            );
        }
        thread::sleep(FRAME);
    }

    let stats = manager.stats();
    println!("=== Terrain Stream ===");
    println!("Tiles spawned:   {}", manager.world().spawned());
    println!("Tiles live:      {}", stats.live_tiles);
    println!("Jobs applied:    {}", stats.applied_jobs);
    println!("Jobs discarded:  {}", stats.discarded_jobs);
    for (lod, pool) in stats.mesh_pools.iter().enumerate() {
        println!("LOD {} buffers:   {} free / {} in use", lod, pool.free, pool.in_use);
    }

    manager.end_play();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Terrain demo failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
