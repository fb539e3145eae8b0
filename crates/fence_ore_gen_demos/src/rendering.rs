use fence_ore_gen::prelude::{BlockAccess, Material, MaterialRegistry};
use glam::IVec3;
use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Horizontal rectangle of blocks at one height, inclusive on both corners.
#[derive(Debug, Clone, Copy)]
pub struct SliceView {
    pub y: i32,
    pub min: (i32, i32),
    pub max: (i32, i32),
}

impl SliceView {
    pub fn around(center: IVec3, radius: i32) -> Self {
        Self {
            y: center.y,
            min: (center.x - radius, center.z - radius),
            max: (center.x + radius, center.z + radius),
        }
    }
}

fn glyph(registry: &MaterialRegistry, material: Material) -> char {
    if registry.is_air(material) {
        return '.';
    }
    if registry.is_water(material) {
        return '~';
    }
    if registry.is_fence_like(material) {
        return '#';
    }
    let name = registry.name(material);
    if name.ends_with("_ore") || name == "ancient_debris" {
        return name
            .trim_start_matches("deepslate_")
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?');
    }
    match material {
        Material::STONE => 's',
        Material::COBBLESTONE => 'c',
        _ => '?',
    }
}

/// Renders `view` top-down, north up: one row per Z, one column per X.
pub fn render_slice<W: BlockAccess + ?Sized>(
    world: &W,
    registry: &MaterialRegistry,
    view: SliceView,
) -> String {
    let mut out = String::new();
    for z in view.min.1..=view.max.1 {
        for x in view.min.0..=view.max.0 {
            out.push(glyph(registry, world.material_at(IVec3::new(x, view.y, z))));
        }
        out.push('\n');
    }
    out
}
