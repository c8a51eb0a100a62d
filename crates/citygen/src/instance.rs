use glam::{Mat3, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(mut self, other: &Aabb) -> Self {
        self.include(other.min);
        self.include(other.max);
        self
    }

    pub fn size(&self) -> Vec3 {
        (self.max - self.min).max(Vec3::ZERO)
    }

    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }
}

/// One building: a transformed, tinted, textured copy of the base mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingInstance {
    /// Unit block -> world.
    pub model: Mat4,
    /// Inverse-transpose of the model's upper-left 3x3.
    pub normal: Mat3,
    /// RGBA multiplier applied to the facade.
    pub tint: Vec4,
    /// Layer in the texture atlas.
    pub texture_index: u32,
}

impl BuildingInstance {
    /// Place a `size` (width, height, depth) block with its ground-level
    /// centre at `base`, turned by `quarter_turns` * 90 degrees about Y.
    pub fn new(base: Vec3, size: Vec3, quarter_turns: u32, tint: Vec4, texture_index: u32) -> Self {
        let rotation = Quat::from_rotation_y((quarter_turns % 4) as f32 * std::f32::consts::FRAC_PI_2);
        let model = Mat4::from_scale_rotation_translation(size, rotation, base);
        Self {
            model,
            normal: normal_matrix(&model),
            tint,
            texture_index,
        }
    }

    /// Ground-level centre of the building.
    pub fn position(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }

    /// World-space bounds of the transformed unit block.
    pub fn bounding_box(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for &x in &[-0.5, 0.5] {
            for &y in &[0.0, 1.0] {
                for &z in &[-0.5, 0.5] {
                    aabb.include(self.model.transform_point3(Vec3::new(x, y, z)));
                }
            }
        }
        aabb
    }
}

/// Matrix that keeps normals perpendicular to surfaces under non-uniform scale.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    Mat3::from_mat4(*model).inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_matrix_preserves_perpendicularity() {
        let inst = BuildingInstance::new(Vec3::ZERO, Vec3::new(4.0, 30.0, 2.0), 1, Vec4::ONE, 0);
        // A tangent on the +X face and that face's normal, both transformed.
        let tangent = Mat3::from_mat4(inst.model) * Vec3::new(0.0, 1.0, 1.0);
        let normal = inst.normal * Vec3::X;
        assert!(tangent.dot(normal).abs() < 1e-4);
    }

    #[test]
    fn bounding_box_matches_size_and_rotation() {
        let inst = BuildingInstance::new(
            Vec3::new(10.0, 0.0, -5.0),
            Vec3::new(4.0, 20.0, 2.0),
            1,
            Vec4::ONE,
            0,
        );
        let bb = inst.bounding_box();
        let size = bb.size();
        // A quarter turn swaps width and depth.
        assert!((size.x - 2.0).abs() < 1e-4);
        assert!((size.y - 20.0).abs() < 1e-4);
        assert!((size.z - 4.0).abs() < 1e-4);
        assert!(bb.min.y.abs() < 1e-5);
        assert_eq!(inst.position(), Vec3::new(10.0, 0.0, -5.0));
    }

    #[test]
    fn aabb_union_and_volume() {
        let a = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        let b = Aabb {
            min: Vec3::splat(2.0),
            max: Vec3::splat(3.0),
        };
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::ZERO);
        assert_eq!(u.max, Vec3::splat(3.0));
        assert_eq!(u.volume(), 27.0);
        assert_eq!(Aabb::empty().volume(), 0.0);
    }
}
