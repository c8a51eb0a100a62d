use bytemuck::{Pod, Zeroable};

/// Base-mesh vertex, laid out exactly as the vertex shader reads it.
///
/// `color.a` is the facade weight: 1 samples the instance's texture, 0 uses
/// the flat vertex colour (roofs and undersides).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub normal: [f32; 4],
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
}

/// Shared, immutable geometry instanced by every building.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl BaseMesh {
    /// Unit block: X and Z in `[-0.5, 0.5]`, Y in `[0, 1]`, so a building's
    /// scale is its size and its translation is its ground-level centre.
    pub fn unit_block() -> Self {
        const FACADE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
        const ROOF: [f32; 4] = [0.08, 0.08, 0.1, 0.0];

        // (normal, four corners counter-clockwise seen from outside)
        #[rustfmt::skip]
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0],  [[-0.5, 0.0,  0.5], [ 0.5, 0.0,  0.5], [ 0.5, 1.0,  0.5], [-0.5, 1.0,  0.5]]),
            ([0.0, 0.0, -1.0], [[ 0.5, 0.0, -0.5], [-0.5, 0.0, -0.5], [-0.5, 1.0, -0.5], [ 0.5, 1.0, -0.5]]),
            ([1.0, 0.0, 0.0],  [[ 0.5, 0.0,  0.5], [ 0.5, 0.0, -0.5], [ 0.5, 1.0, -0.5], [ 0.5, 1.0,  0.5]]),
            ([-1.0, 0.0, 0.0], [[-0.5, 0.0, -0.5], [-0.5, 0.0,  0.5], [-0.5, 1.0,  0.5], [-0.5, 1.0, -0.5]]),
            ([0.0, 1.0, 0.0],  [[-0.5, 1.0,  0.5], [ 0.5, 1.0,  0.5], [ 0.5, 1.0, -0.5], [-0.5, 1.0, -0.5]]),
            ([0.0, -1.0, 0.0], [[-0.5, 0.0, -0.5], [ 0.5, 0.0, -0.5], [ 0.5, 0.0,  0.5], [-0.5, 0.0,  0.5]]),
        ];
        // Side faces map v = 0 to the top edge so textures read top-down.
        const UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = vertices.len() as u16;
            let color = if normal[1] == 0.0 { FACADE } else { ROOF };
            for (corner, uv) in corners.iter().zip(UVS) {
                vertices.push(Vertex {
                    position: [corner[0], corner[1], corner[2], 1.0],
                    normal: [normal[0], normal[1], normal[2], 0.0],
                    color,
                    tex_coords: uv,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self { vertices, indices }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 56);
    }

    #[test]
    fn unit_block_has_six_quads() {
        let mesh = BaseMesh::unit_block();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn unit_block_sits_on_the_ground() {
        let mesh = BaseMesh::unit_block();
        let min_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!(min_y, 0.0);
        assert_eq!(max_y, 1.0);
    }

    #[test]
    fn triangles_wind_outwards() {
        let mesh = BaseMesh::unit_block();
        for tri in mesh.indices.chunks_exact(3) {
            let p = |i: u16| Vec3::from_slice(&mesh.vertices[i as usize].position[..3]);
            let n = Vec3::from_slice(&mesh.vertices[tri[0] as usize].normal[..3]);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(face.dot(n) > 0.0, "triangle {tri:?} faces inwards");
        }
    }

    #[test]
    fn only_side_faces_are_textured() {
        let mesh = BaseMesh::unit_block();
        for v in &mesh.vertices {
            let textured = v.color[3] > 0.5;
            assert_eq!(textured, v.normal[1] == 0.0);
        }
    }
}
