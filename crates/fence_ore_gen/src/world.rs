//! Block geometry and the world access seam.
//!
//! Positions are [`glam::IVec3`] block coordinates; hosts holding `mint` vectors can
//! convert with `IVec3::from`. The host exposes its block storage through
//! [`BlockAccess`]; [`GridWorld`] is a sparse in-memory implementation used by tests
//! and the demo binaries. Delayed spawns remember a [`BlockLocation`] and find their
//! world again through [`Worlds`] when they fire.
use std::collections::HashMap;
use std::fmt;

use glam::IVec3;

use crate::material::Material;

/// Category used when a world's dimension maps to nothing more specific.
pub const DEFAULT_CATEGORY: &str = "overworld";

/// Block faces the trigger detector inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Down,
}

impl Direction {
    /// Horizontal faces in scan order. The first water hit wins on fence placement.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit offset of this face. North is -Z, east is +X.
    pub fn offset(self) -> IVec3 {
        match self {
            Direction::North => IVec3::new(0, 0, -1),
            Direction::South => IVec3::new(0, 0, 1),
            Direction::East => IVec3::new(1, 0, 0),
            Direction::West => IVec3::new(-1, 0, 0),
            Direction::Down => IVec3::new(0, -1, 0),
        }
    }

    pub fn opposite(self) -> Option<Direction> {
        match self {
            Direction::North => Some(Direction::South),
            Direction::South => Some(Direction::North),
            Direction::East => Some(Direction::West),
            Direction::West => Some(Direction::East),
            Direction::Down => None,
        }
    }

    #[inline]
    pub fn step(self, pos: IVec3) -> IVec3 {
        pos + self.offset()
    }
}

/// Dimension of a host world, used to pick the weight-table category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    TheEnd,
}

impl Dimension {
    pub fn category(self) -> &'static str {
        match self {
            Dimension::Overworld => DEFAULT_CATEGORY,
            Dimension::Nether => "nether",
            Dimension::TheEnd => "the_end",
        }
    }
}

/// Identity of the world an event happened in.
#[derive(Clone, Copy, Debug)]
pub struct WorldInfo<'a> {
    pub name: &'a str,
    pub dimension: Dimension,
}

impl<'a> WorldInfo<'a> {
    pub fn new(name: &'a str, dimension: Dimension) -> Self {
        Self { name, dimension }
    }
}

/// A block position qualified by the name of its world.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockLocation {
    pub world: String,
    pub pos: IVec3,
}

impl BlockLocation {
    pub fn new(world: impl Into<String>, pos: impl Into<IVec3>) -> Self {
        Self {
            world: world.into(),
            pos: pos.into(),
        }
    }
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.world, self.pos)
    }
}

/// Read/write access to the host's blocks.
pub trait BlockAccess {
    fn material_at(&self, pos: IVec3) -> Material;

    fn set_material(&mut self, pos: IVec3, material: Material);
}

/// The host's loaded worlds, looked up by name.
pub trait Worlds {
    /// `None` when the world is not loaded.
    fn world_mut(&mut self, name: &str) -> Option<&mut dyn BlockAccess>;
}

impl<W: BlockAccess> Worlds for HashMap<String, W> {
    fn world_mut(&mut self, name: &str) -> Option<&mut dyn BlockAccess> {
        self.get_mut(name).map(|world| world as &mut dyn BlockAccess)
    }
}

/// Sparse block grid; every unset position reads as air.
#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    blocks: HashMap<IVec3, Material>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
        }
    }

    /// Sets a block and returns `self`, for building fixtures.
    pub fn with(mut self, pos: IVec3, material: Material) -> Self {
        self.set_material(pos, material);
        self
    }

    /// Number of non-air blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockAccess for GridWorld {
    fn material_at(&self, pos: IVec3) -> Material {
        self.blocks.get(&pos).copied().unwrap_or(Material::AIR)
    }

    fn set_material(&mut self, pos: IVec3, material: Material) {
        if material == Material::AIR {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, material);
        }
    }
}
