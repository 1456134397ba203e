use bytemuck::{Pod, Zeroable};
use volray_render::CUBE_VERTEX_COUNT;

/// One cube corner: object-space position, debug color, face UV.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

pub const CUBE_VERTEX_STRIDE: u64 = 40;
pub const POSITION_OFFSET: u64 = 0;
pub const UV_OFFSET: u64 = 32;

const _: () = assert!(std::mem::size_of::<CubeVertex>() as u64 == CUBE_VERTEX_STRIDE);
const _: () = assert!(std::mem::offset_of!(CubeVertex, uv) as u64 == UV_OFFSET);

// Outward normal followed by two tangents with u × v = normal.
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
];

/// The `[-1, 1]³` bounding cube as a non-indexed triangle list,
/// counter-clockwise when seen from outside.
pub fn cube_vertices() -> Vec<CubeVertex> {
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    const ORDER: [usize; 6] = [0, 1, 2, 2, 3, 0];

    let mut out = Vec::with_capacity(CUBE_VERTEX_COUNT as usize);
    for (n, u, v) in FACES {
        for &corner in &ORDER {
            let (a, b) = CORNERS[corner];
            let p = [
                n[0] + a * u[0] + b * v[0],
                n[1] + a * u[1] + b * v[1],
                n[2] + a * u[2] + b * v[2],
            ];
            out.push(CubeVertex {
                position: [p[0], p[1], p[2], 1.0],
                color: [p[0] * 0.5 + 0.5, p[1] * 0.5 + 0.5, p[2] * 0.5 + 0.5, 1.0],
                uv: [a * 0.5 + 0.5, b * 0.5 + 0.5],
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(a: [f32; 4], b: [f32; 4]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[test]
    fn has_36_vertices_on_the_unit_cube() {
        let verts = cube_vertices();
        assert_eq!(verts.len(), CUBE_VERTEX_COUNT as usize);
        for v in &verts {
            assert!(v.position[..3].iter().all(|c| c.abs() == 1.0));
            assert_eq!(v.position[3], 1.0);
            assert!(v.uv.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn triangles_wind_outward() {
        let verts = cube_vertices();
        for tri in verts.chunks(3) {
            let n = cross(
                sub(tri[1].position, tri[0].position),
                sub(tri[2].position, tri[0].position),
            );
            // The centroid lies on the face, so it points the same way as the normal.
            let c = [
                tri.iter().map(|v| v.position[0]).sum::<f32>(),
                tri.iter().map(|v| v.position[1]).sum::<f32>(),
                tri.iter().map(|v| v.position[2]).sum::<f32>(),
            ];
            let dot = n[0] * c[0] + n[1] * c[1] + n[2] * c[2];
            assert!(dot > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn byte_layout_matches_stride() {
        let verts = cube_vertices();
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len() as u64, 36 * CUBE_VERTEX_STRIDE);
        let uv0 = f32::from_le_bytes(bytes[32..36].try_into().unwrap());
        assert_eq!(uv0, verts[0].uv[0]);
    }
}
