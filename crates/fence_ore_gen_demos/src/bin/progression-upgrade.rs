use fence_ore_gen::prelude::*;
use fence_ore_gen_demos::{asset_path, init_tracing};
use uuid::Uuid;

/// Buys levels against an in-memory economy until the player runs out of money or
/// reaches the top of the overworld table, persisting levels to a temp directory.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let data_dir = std::env::temp_dir().join("fence_ore_gen_demo_players");
    let player = Uuid::from_u128(0xb0b);

    // both legacy layouts, merged on first start and then renamed
    std::fs::create_dir_all(&data_dir)?;
    if !data_dir.join("levels_backup.yml").exists() {
        let friend = Uuid::from_u128(0xf00d);
        std::fs::write(
            data_dir.join("players.yml"),
            format!("levels:\n  {friend}: 2 # founding member\n"),
        )?;
        std::fs::write(
            data_dir.join("levels.yml"),
            format!("# legacy levels\n{player}: 1\nnot-a-uuid: 4\n"),
        )?;
    }

    let mut generator = FenceOreGen::new(
        MaterialRegistry::new(),
        RonFileSource::new(asset_path("generator.ron")),
    )?
    .with_player_data(PlayerDataFile::in_dir(&data_dir))?;

    let requester = Requester::player(player, Dimension::Overworld);
    let mut economy = InMemoryEconomy::new().with_balance(player, 4000.0);

    loop {
        match generator.upgrade(&requester, Some(&mut economy)) {
            Ok(reply) => println!("{reply} (balance {:.2})", economy.balance(player)),
            Err(err) => {
                println!("{err}");
                break;
            }
        }
    }

    println!("{}", generator.query_level(&(), &requester, None)?);
    match generator.upgrade(&requester, None) {
        Ok(reply) => println!("{reply}"),
        Err(err) => println!("without an economy: {err}"),
    }

    generator.shutdown()?;
    println!("player data saved to {}", data_dir.display());
    Ok(())
}
