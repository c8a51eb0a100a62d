use cityscape_common::{ConfigurationError, Fingerprint, SplitMix64};
use glam::{Vec3, Vec4};

use crate::config::CityConfiguration;
use crate::instance::{Aabb, BuildingInstance};
use crate::layout::{CellCoord, GridLayout};
use crate::mesh::BaseMesh;

/// Night-time facade tints: sodium, warm white, cool white, teal, pale gold.
const PALETTE: [[f32; 3]; 5] = [
    [1.0, 0.78, 0.55],
    [1.0, 0.93, 0.82],
    [0.82, 0.9, 1.0],
    [0.7, 0.95, 0.92],
    [1.0, 0.88, 0.6],
];

/// A complete, immutable city: shared mesh plus one instance per lot.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    config: CityConfiguration,
    texture_count: u32,
    layout: GridLayout,
    mesh: BaseMesh,
    instances: Vec<BuildingInstance>,
    bounds: Aabb,
}

impl City {
    pub fn config(&self) -> &CityConfiguration {
        &self.config
    }

    /// Texture count the indices were drawn against.
    pub fn texture_count(&self) -> u32 {
        self.texture_count
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn mesh(&self) -> &BaseMesh {
        &self.mesh
    }

    pub fn instances(&self) -> &[BuildingInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Union of every building's bounds plus the street grid at ground level.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Bit-level fingerprint of the instance list.
    pub fn fingerprint(&self) -> u64 {
        let mut fp = Fingerprint::new();
        for inst in &self.instances {
            for v in inst.model.to_cols_array() {
                fp.write_f32(v);
            }
            for v in inst.normal.to_cols_array() {
                fp.write_f32(v);
            }
            for v in inst.tint.to_array() {
                fp.write_f32(v);
            }
            fp.write_u64(inst.texture_index as u64);
        }
        fp.finish()
    }
}

/// Generate a city.
///
/// Fails with [`ConfigurationError`] for an invalid configuration or a zero
/// texture count; nothing is produced in that case.
pub fn generate(config: &CityConfiguration, texture_count: u32) -> Result<City, ConfigurationError> {
    config.validate()?;
    if texture_count == 0 {
        return Err(ConfigurationError::ZeroTextureCount);
    }

    let _span = tracing::info_span!(
        "generate_city",
        columns = config.columns,
        rows = config.rows,
        seed = config.seed
    )
    .entered();

    let layout = GridLayout::from_config(config);
    let instances: Vec<BuildingInstance> = layout
        .cells()
        .map(|coord| building_for_lot(config, &layout, coord, texture_count))
        .collect();

    let half = layout.extent() * 0.5;
    let ground = Aabb {
        min: Vec3::new(-half.x, 0.0, -half.y),
        max: Vec3::new(half.x, 0.0, half.y),
    };
    let bounds = instances
        .iter()
        .fold(ground, |acc, inst| acc.union(&inst.bounding_box()));

    tracing::info!(
        instances = instances.len(),
        height = bounds.max.y,
        "generated city"
    );

    Ok(City {
        config: config.clone(),
        texture_count,
        layout,
        mesh: BaseMesh::unit_block(),
        instances,
        bounds,
    })
}

/// Derive one building purely from (seed, lot).
fn building_for_lot(
    config: &CityConfiguration,
    layout: &GridLayout,
    coord: CellCoord,
    texture_count: u32,
) -> BuildingInstance {
    let mut rng = SplitMix64::keyed(config.seed, &[coord.column as u64, coord.row as u64]);

    let width = rng.range_f32(config.footprint.min, config.footprint.max);
    let depth = rng.range_f32(config.footprint.min, config.footprint.max);

    // Taller towards the centre: outer lots skew the draw towards `min`.
    let centrality = layout.centrality(coord);
    let skew = 1.0 + 3.0 * config.downtown_bias * centrality;
    let height = config.height.lerp(rng.next_f32().powf(skew));

    let quarter_turns = rng.below(4);
    let (extent_x, extent_z) = if quarter_turns % 2 == 0 {
        (width, depth)
    } else {
        (depth, width)
    };

    // Leftover lot space becomes a small offset so rows don't look ruled.
    let slack_x = (config.block_size - extent_x).max(0.0) * 0.5;
    let slack_z = (config.block_size - extent_z).max(0.0) * 0.5;
    let offset = Vec3::new(
        rng.range_f32(-slack_x, slack_x),
        0.0,
        rng.range_f32(-slack_z, slack_z),
    );

    let hue = PALETTE[rng.below(PALETTE.len() as u32) as usize];
    let brightness = rng.range_f32(0.7, 1.0);
    let tint = Vec4::new(
        hue[0] * brightness,
        hue[1] * brightness,
        hue[2] * brightness,
        1.0,
    );

    let texture_index = rng.below(texture_count);

    BuildingInstance::new(
        layout.cell_center(coord) + offset,
        Vec3::new(width, height, depth),
        quarter_turns,
        tint,
        texture_index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_inputs_give_bit_identical_cities() {
        let cfg = CityConfiguration::grid(6, 5, 1234);
        let a = generate(&cfg, 8).unwrap();
        let b = generate(&cfg, 8).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.instances(), b.instances());
    }

    #[test]
    fn different_seeds_give_different_cities() {
        let a = generate(&CityConfiguration::grid(4, 4, 1), 8).unwrap();
        let b = generate(&CityConfiguration::grid(4, 4, 2), 8).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn four_by_four_seed_42_has_sixteen_unique_lots() {
        let city = generate(&CityConfiguration::grid(4, 4, 42), 8).unwrap();
        assert_eq!(city.len(), 16);

        let positions: HashSet<(i64, i64)> = city
            .instances()
            .iter()
            .map(|i| {
                let p = i.position();
                ((p.x * 1000.0) as i64, (p.z * 1000.0) as i64)
            })
            .collect();
        assert_eq!(positions.len(), 16);

        // Each building stays inside its own lot.
        let layout = city.layout();
        for (coord, inst) in layout.cells().zip(city.instances()) {
            let d = inst.position() - layout.cell_center(coord);
            assert!(d.x.abs() <= layout.block_size * 0.5);
            assert!(d.z.abs() <= layout.block_size * 0.5);
        }
    }

    #[test]
    fn texture_indices_and_volumes_are_valid() {
        for texture_count in [1, 3, 8] {
            let city = generate(&CityConfiguration::grid(9, 7, 99), texture_count).unwrap();
            for inst in city.instances() {
                assert!(inst.texture_index < texture_count);
                assert!(inst.bounding_box().volume() > 0.0);
            }
        }
    }

    #[test]
    fn smallest_grid_is_not_empty() {
        let city = generate(&CityConfiguration::grid(1, 1, 0), 1).unwrap();
        assert_eq!(city.len(), 1);
        assert!(!city.is_empty());
    }

    #[test]
    fn zero_texture_count_is_rejected() {
        let err = generate(&CityConfiguration::default(), 0).unwrap_err();
        assert!(matches!(err, ConfigurationError::ZeroTextureCount));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(generate(&CityConfiguration::grid(0, 0, 1), 4).is_err());
    }

    #[test]
    fn heights_and_footprints_respect_ranges() {
        let cfg = CityConfiguration::grid(10, 10, 5);
        let city = generate(&cfg, 4).unwrap();
        for inst in city.instances() {
            let size = inst.bounding_box().size();
            assert!(size.y >= cfg.height.min - 1e-3 && size.y <= cfg.height.max + 1e-3);
            for edge in [size.x, size.z] {
                assert!(edge >= cfg.footprint.min - 1e-3 && edge <= cfg.footprint.max + 1e-3);
            }
        }
    }

    #[test]
    fn downtown_is_taller_on_average() {
        let cfg = CityConfiguration {
            downtown_bias: 1.0,
            ..CityConfiguration::grid(21, 21, 77)
        };
        let city = generate(&cfg, 4).unwrap();
        let layout = city.layout();
        let (mut inner, mut outer) = (Vec::new(), Vec::new());
        for (coord, inst) in layout.cells().zip(city.instances()) {
            let h = inst.bounding_box().size().y;
            if layout.centrality(coord) < 0.3 {
                inner.push(h);
            } else if layout.centrality(coord) > 0.7 {
                outer.push(h);
            }
        }
        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        assert!(mean(&inner) > mean(&outer));
    }

    #[test]
    fn bounds_cover_every_building() {
        let city = generate(&CityConfiguration::grid(5, 3, 8), 4).unwrap();
        for inst in city.instances() {
            let bb = inst.bounding_box();
            assert!(bb.min.cmpge(city.bounds().min - 1e-4).all());
            assert!(bb.max.cmple(city.bounds().max + 1e-4).all());
        }
    }
}
