use fence_ore_gen::prelude::*;
use fence_ore_gen_demos::{asset_path, init_tracing, render_slice, SliceView};
use glam::IVec3;
use uuid::Uuid;

/// Places a row of fences along a water channel with zero spawn delay and prints
/// the slice before and after.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let registry = MaterialRegistry::new();
    let fence = registry
        .resolve("oak_fence")
        .ok_or_else(|| anyhow::anyhow!("oak_fence is not a known material"))?;

    let raw = RonFileSource::new(asset_path("generator.ron")).load()?;
    let source = StaticSource::new(raw.with_spawn_delay(0));
    let mut generator = FenceOreGen::new(registry, source)?
        .with_seed(42)
        .with_sink(VecSink::new());

    let player = Uuid::from_u128(0x5eed);
    generator.on_player_join(player);

    // water channel along z = -1, fences along z = 0, targets land on z = 1
    let y = 64;
    let mut world = GridWorld::new();
    for x in -6..=6 {
        world.set_material(IVec3::new(x, y, -1), Material::WATER);
    }
    let view = SliceView::around(IVec3::new(0, y, 0), 6);
    println!("before:\n{}", render_slice(&world, generator.registry(), view));

    let info = WorldInfo::new("world", Dimension::Overworld);
    for x in -6..=6 {
        let pos = IVec3::new(x, y, 0);
        world.set_material(pos, fence);
        generator.on_fence_placed(&mut world, info, pos, player);
    }
    println!("after:\n{}", render_slice(&world, generator.registry(), view));

    let generated = generator
        .sink()
        .as_slice()
        .iter()
        .filter(|event| matches!(event, GeneratorEvent::BlockGenerated { .. }))
        .count();
    println!("{generated} blocks generated at level {}", generator.progression().get_level(player));

    generator.shutdown()?;
    Ok(())
}
