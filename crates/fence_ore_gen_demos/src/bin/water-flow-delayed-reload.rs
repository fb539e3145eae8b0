use std::collections::HashMap;
use std::fs;

use fence_ore_gen::prelude::*;
use fence_ore_gen_demos::{asset_path, init_tracing, render_slice, SliceView};
use glam::{IVec3, Vec3};
use uuid::Uuid;

/// Lets water flow toward fences with the asset's 20-tick delay, reloads a richer
/// configuration halfway through the delay, and shows that the pending spawns
/// resolve against the new snapshot.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let dir = std::env::temp_dir().join("fence_ore_gen_demo");
    fs::create_dir_all(&dir)?;
    let config_path = dir.join("generator.ron");
    fs::copy(asset_path("generator.ron"), &config_path)?;

    let registry = MaterialRegistry::new();
    let fence = registry
        .resolve("cherry_fence")
        .ok_or_else(|| anyhow::anyhow!("cherry_fence is not a known material"))?;
    let mut generator = FenceOreGen::new(registry, RonFileSource::new(&config_path))?
        .with_seed(7)
        .with_sink(VecSink::new());

    let miner = Uuid::from_u128(0xa11ce);
    let admin = Requester::admin(Uuid::from_u128(1), Dimension::Overworld);
    generator.set_level(
        &HashMap::from([("alice".to_owned(), miner)]),
        &admin,
        Some("alice"),
        3,
    )?;

    // a source pool at x = 0 flowing east into cells fenced from below
    let y = 70;
    let mut world = GridWorld::new();
    for z in -3..=3 {
        world.set_material(IVec3::new(0, y, z), Material::WATER);
        world.set_material(IVec3::new(1, y - 1, z), fence);
    }
    let players = [OnlinePlayer::new(miner, Vec3::new(2.0, y as f32, 0.0))];
    let info = WorldInfo::new("world", Dimension::Overworld);

    for z in -3..=3 {
        let decision = generator.on_water_flow(
            &mut world,
            info,
            IVec3::new(0, y, z),
            IVec3::new(1, y, z),
            &players,
        );
        tracing::info!("flow into z={} -> {:?}", z, decision);
    }

    let mut worlds = HashMap::from([(info.name.to_owned(), world)]);
    for _ in 0..10 {
        generator.tick(&mut worlds);
    }

    let richer = fs::read_to_string(&config_path)?.replace(
        r#""3": { "cobblestone": 45,"#,
        r#""3": { "cobblestone": 5,"#,
    );
    fs::write(&config_path, richer)?;
    println!("{}", generator.reload(&admin)?);

    while !generator.scheduler().is_empty() {
        generator.tick(&mut worlds);
    }

    let view = SliceView::around(IVec3::new(0, y, 0), 3);
    let world = &worlds[info.name];
    println!("{}", render_slice(world, generator.registry(), view));

    for event in generator.sink().as_slice() {
        if let GeneratorEvent::BlockGenerated { target, level, material, .. } = event {
            println!(
                "{target}: {} (level {level})",
                generator.registry().name(*material)
            );
        }
    }

    generator.shutdown()?;
    Ok(())
}
