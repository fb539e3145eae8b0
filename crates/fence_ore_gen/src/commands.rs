//! Player-facing commands: level query, admin level override, paid upgrade.
//!
//! Every command returns a [`CommandReply`] or a [`CommandError`]; both render the
//! text shown to the requester through `Display`. Reload lives on
//! [`crate::generator::FenceOreGen::reload`] because it needs the config source.
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::economy::{Economy, EconomyError};
use crate::progression::{ProgressionStore, DEFAULT_LEVEL};
use crate::world::Dimension;

/// Whoever issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: Uuid,
    /// Dimension the requester stands in; picks the category bounding levels.
    pub dimension: Dimension,
    pub admin: bool,
}

impl Requester {
    pub fn player(id: Uuid, dimension: Dimension) -> Self {
        Self {
            id,
            dimension,
            admin: false,
        }
    }

    pub fn admin(id: Uuid, dimension: Dimension) -> Self {
        Self {
            id,
            dimension,
            admin: true,
        }
    }

    pub fn category(&self) -> &'static str {
        self.dimension.category()
    }
}

/// Resolves player names to ids for commands that target someone else.
pub trait PlayerLookup {
    fn find_player(&self, name: &str) -> Option<Uuid>;
}

/// Case-insensitive name directory.
impl PlayerLookup for HashMap<String, Uuid> {
    fn find_player(&self, name: &str) -> Option<Uuid> {
        self.get(name).copied().or_else(|| {
            self.iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(name))
                .map(|(_, id)| *id)
        })
    }
}

/// Lookup that knows nobody.
impl PlayerLookup for () {
    fn find_player(&self, _name: &str) -> Option<Uuid> {
        None
    }
}

/// A level mutation made by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub player: Uuid,
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Level {
        /// `None` when the requester asked about themselves.
        player: Option<String>,
        level: u32,
    },
    LevelSet {
        player: Option<String>,
        level: u32,
    },
    Upgraded {
        level: u32,
        cost: f64,
    },
    Reloaded {
        warnings: usize,
    },
}

impl fmt::Display for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandReply::Level {
                player: None,
                level,
            } => write!(f, "Generator level: {level}"),
            CommandReply::Level {
                player: Some(name),
                level,
            } => write!(f, "Generator level of {name}: {level}"),
            CommandReply::LevelSet {
                player: None,
                level,
            } => write!(f, "Your generator level has been set to {level}"),
            CommandReply::LevelSet {
                player: Some(name),
                level,
            } => write!(f, "Generator level of {name} has been set to {level}"),
            CommandReply::Upgraded { level, cost } => {
                write!(f, "Upgraded to level {level} for {cost:.2}$")
            }
            CommandReply::Reloaded { warnings: 0 } => f.write_str("Configuration reloaded"),
            CommandReply::Reloaded { warnings } => {
                write!(f, "Configuration reloaded with {warnings} warnings, see the log")
            }
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("You don't have permission to use this command!")]
    NoPermission,

    #[error("Level must be between {min} and {max}")]
    InvalidLevel { min: u32, max: u32 },

    #[error("You have reached the maximum level ({max})!")]
    MaxLevel { max: u32 },

    #[error("You need {cost:.2}$ to upgrade")]
    InsufficientFunds { cost: f64 },

    #[error("The economy service is not available")]
    EconomyUnavailable,

    #[error("Player not found: {name}")]
    PlayerNotFound { name: String },

    #[error("Reload failed: {reason}")]
    ReloadFailed { reason: String },
}

fn resolve_target(
    lookup: &dyn PlayerLookup,
    requester: &Requester,
    target: Option<&str>,
) -> Result<(Uuid, Option<String>), CommandError> {
    let Some(name) = target else {
        return Ok((requester.id, None));
    };
    if !requester.admin {
        return Err(CommandError::NoPermission);
    }
    lookup
        .find_player(name)
        .map(|id| (id, Some(name.to_owned())))
        .ok_or_else(|| CommandError::PlayerNotFound {
            name: name.to_owned(),
        })
}

/// Level of the requester, or of `target` (admin only).
pub fn query_level(
    store: &ProgressionStore,
    lookup: &dyn PlayerLookup,
    requester: &Requester,
    target: Option<&str>,
) -> Result<CommandReply, CommandError> {
    let (id, player) = resolve_target(lookup, requester, target)?;
    Ok(CommandReply::Level {
        player,
        level: store.get_level(id),
    })
}

/// Admin override of the requester's or `target`'s level, bounded by the highest
/// level of the requester's category.
pub fn set_level(
    store: &mut ProgressionStore,
    config: &GeneratorConfig,
    lookup: &dyn PlayerLookup,
    requester: &Requester,
    target: Option<&str>,
    level: u32,
) -> Result<(LevelChange, CommandReply), CommandError> {
    if !requester.admin {
        return Err(CommandError::NoPermission);
    }
    let max = config.max_level(requester.category());
    if !(DEFAULT_LEVEL..=max).contains(&level) {
        return Err(CommandError::InvalidLevel {
            min: DEFAULT_LEVEL,
            max,
        });
    }
    let (id, player) = resolve_target(lookup, requester, target)?;
    let change = LevelChange {
        player: id,
        from: store.get_level(id),
        to: level,
    };
    store.set_level(id, level);
    Ok((change, CommandReply::LevelSet { player, level }))
}

/// Buys the next level for the requester. On success exactly one level is added
/// and the price is withdrawn.
pub fn upgrade(
    store: &mut ProgressionStore,
    config: &GeneratorConfig,
    requester: &Requester,
    economy: Option<&mut dyn Economy>,
) -> Result<CommandReply, CommandError> {
    let current = store.get_level(requester.id);
    let max = config.max_level(requester.category());
    if current >= max {
        return Err(CommandError::MaxLevel { max });
    }
    let next = current + 1;
    let cost = config.pricing.cost(next);

    let economy = economy.ok_or(CommandError::EconomyUnavailable)?;
    match economy.has(requester.id, cost) {
        Ok(true) => {}
        Ok(false) => return Err(CommandError::InsufficientFunds { cost }),
        Err(err) => return Err(err.into()),
    }
    economy.withdraw(requester.id, cost)?;

    store.set_level(requester.id, next);
    Ok(CommandReply::Upgraded { level: next, cost })
}

impl From<EconomyError> for CommandError {
    fn from(err: EconomyError) -> Self {
        match err {
            EconomyError::InsufficientFunds { amount, .. } => {
                CommandError::InsufficientFunds { cost: amount }
            }
            _ => CommandError::EconomyUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::InMemoryEconomy;
    use crate::material::Material;
    use crate::table::{ReplaceableSet, WeightTable};

    fn config(max: u32) -> GeneratorConfig {
        let mut table = WeightTable::new();
        for level in 1..=max {
            table.insert_level("overworld", level, [(Material::STONE, 1.0)].into_iter().collect());
        }
        table.insert_level("nether", 1, [(Material::STONE, 1.0)].into_iter().collect());
        GeneratorConfig::new(table, ReplaceableSet::new())
    }

    fn directory() -> HashMap<String, Uuid> {
        HashMap::from([("Steve".to_owned(), Uuid::from_u128(2))])
    }

    const ME: Uuid = Uuid::from_u128(1);

    #[test]
    fn query_self_and_others() {
        let mut store = ProgressionStore::new();
        store.set_level(Uuid::from_u128(2), 3);
        let player = Requester::player(ME, Dimension::Overworld);
        let admin = Requester::admin(ME, Dimension::Overworld);

        assert_eq!(
            query_level(&store, &directory(), &player, None),
            Ok(CommandReply::Level {
                player: None,
                level: 1
            })
        );
        assert_eq!(
            query_level(&store, &directory(), &player, Some("Steve")),
            Err(CommandError::NoPermission)
        );
        let reply = query_level(&store, &directory(), &admin, Some("steve")).unwrap();
        assert_eq!(reply.to_string(), "Generator level of steve: 3");
        assert_eq!(
            query_level(&store, &directory(), &admin, Some("Alex")),
            Err(CommandError::PlayerNotFound {
                name: "Alex".into()
            })
        );
    }

    #[test]
    fn set_level_is_admin_only_and_bounded() {
        let mut store = ProgressionStore::new();
        let config = config(4);
        let player = Requester::player(ME, Dimension::Overworld);
        let admin = Requester::admin(ME, Dimension::Overworld);

        assert_eq!(
            set_level(&mut store, &config, &(), &player, None, 2),
            Err(CommandError::NoPermission)
        );
        for bad in [0, 5] {
            assert_eq!(
                set_level(&mut store, &config, &(), &admin, None, bad),
                Err(CommandError::InvalidLevel { min: 1, max: 4 })
            );
        }
        let (change, reply) =
            set_level(&mut store, &config, &directory(), &admin, Some("Steve"), 4).unwrap();
        assert_eq!(
            change,
            LevelChange {
                player: Uuid::from_u128(2),
                from: 1,
                to: 4
            }
        );
        assert_eq!(store.get_level(change.player), 4);
        assert_eq!(reply.to_string(), "Generator level of Steve has been set to 4");
    }

    #[test]
    fn set_level_bounds_follow_requester_dimension() {
        let mut store = ProgressionStore::new();
        let admin = Requester::admin(ME, Dimension::Nether);
        assert_eq!(
            set_level(&mut store, &config(4), &(), &admin, None, 2),
            Err(CommandError::InvalidLevel { min: 1, max: 1 })
        );
    }

    #[test]
    fn upgrade_withdraws_cost_and_adds_one_level() {
        let mut store = ProgressionStore::new();
        let mut economy = InMemoryEconomy::new().with_balance(ME, 2600.0);
        let requester = Requester::player(ME, Dimension::Overworld);
        let config = config(3);

        let reply = upgrade(&mut store, &config, &requester, Some(&mut economy)).unwrap();
        assert_eq!(reply, CommandReply::Upgraded { level: 2, cost: 1000.0 });
        assert_eq!(reply.to_string(), "Upgraded to level 2 for 1000.00$");
        upgrade(&mut store, &config, &requester, Some(&mut economy)).unwrap();
        assert_eq!(store.get_level(ME), 3);
        assert_eq!(economy.balance(ME), 100.0);

        assert_eq!(
            upgrade(&mut store, &config, &requester, Some(&mut economy)),
            Err(CommandError::MaxLevel { max: 3 })
        );
    }

    #[test]
    fn upgrade_failures_leave_state_alone() {
        let mut store = ProgressionStore::new();
        let mut economy = InMemoryEconomy::new().with_balance(ME, 999.99);
        let requester = Requester::player(ME, Dimension::Overworld);
        let config = config(3);

        assert_eq!(
            upgrade(&mut store, &config, &requester, None),
            Err(CommandError::EconomyUnavailable)
        );
        let err = upgrade(&mut store, &config, &requester, Some(&mut economy)).unwrap_err();
        assert_eq!(err, CommandError::InsufficientFunds { cost: 1000.0 });
        assert_eq!(err.to_string(), "You need 1000.00$ to upgrade");
        assert_eq!(store.get_level(ME), 1);
        assert_eq!(economy.balance(ME), 999.99);
    }

    struct BrokenEconomy;

    impl Economy for BrokenEconomy {
        fn has(&self, _player: Uuid, _amount: f64) -> Result<bool, EconomyError> {
            Err(EconomyError::Unavailable)
        }

        fn withdraw(&mut self, _player: Uuid, _amount: f64) -> Result<(), EconomyError> {
            Err(EconomyError::Unavailable)
        }
    }

    #[test]
    fn economy_outage_is_reported_cleanly() {
        let mut store = ProgressionStore::new();
        let requester = Requester::player(ME, Dimension::Overworld);
        assert_eq!(
            upgrade(&mut store, &config(2), &requester, Some(&mut BrokenEconomy)),
            Err(CommandError::EconomyUnavailable)
        );
    }
}
