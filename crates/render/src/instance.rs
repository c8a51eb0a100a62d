use bytemuck::{Pod, Zeroable};
use cityscape_citygen::{BuildingInstance, City};

/// GPU layout of one building instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub tint: [f32; 4],
    pub texture_index: u32,
}

impl InstanceRaw {
    /// Pack `inst`, clamping its texture index to `layers` atlas layers.
    pub fn pack(inst: &BuildingInstance, layers: u32) -> Self {
        Self {
            model: inst.model.to_cols_array_2d(),
            normal: inst.normal.to_cols_array_2d(),
            tint: inst.tint.to_array(),
            texture_index: inst.texture_index.min(layers.saturating_sub(1)),
        }
    }
}

/// Pack a whole city for upload.
pub fn pack_instances(city: &City, layers: u32) -> Vec<InstanceRaw> {
    city.instances()
        .iter()
        .map(|inst| InstanceRaw::pack(inst, layers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityscape_citygen::{CityConfiguration, generate};

    #[test]
    fn layout_has_no_padding() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 120);
    }

    #[test]
    fn indices_are_clamped_to_fewer_layers() {
        let city = generate(&CityConfiguration::grid(6, 6, 3), 8).unwrap();
        assert!(city.instances().iter().any(|i| i.texture_index >= 5));
        let packed = pack_instances(&city, 5);
        assert_eq!(packed.len(), city.len());
        assert!(packed.iter().all(|p| p.texture_index < 5));
    }

    #[test]
    fn indices_within_range_are_kept() {
        let city = generate(&CityConfiguration::grid(3, 3, 9), 4).unwrap();
        for (raw, inst) in pack_instances(&city, 4).iter().zip(city.instances()) {
            assert_eq!(raw.texture_index, inst.texture_index);
            assert_eq!(raw.model, inst.model.to_cols_array_2d());
        }
    }
}
