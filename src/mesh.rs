//! Icosahedron-based meshes: the low-poly body shape and the subdivided sphere.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex with position and normal, as consumed by the body and sphere shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// Subdivided icosahedron projected onto a sphere.
#[derive(Clone, Debug)]
pub struct SphereMesh {
    /// Non-indexed triangle list; normals point radially outward.
    pub vertices: Vec<MeshVertex>,
    /// Line list over `vertices`, three edges per triangle.
    pub line_indices: Vec<u32>,
}

impl SphereMesh {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
    [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
    [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
];

/// The 12 icosahedron vertices on the unit sphere.
fn icosahedron_vertices() -> [Vec3; 12] {
    // Golden ratio
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    [
        Vec3::new(-1.0, phi, 0.0),
        Vec3::new(1.0, phi, 0.0),
        Vec3::new(-1.0, -phi, 0.0),
        Vec3::new(1.0, -phi, 0.0),
        Vec3::new(0.0, -1.0, phi),
        Vec3::new(0.0, 1.0, phi),
        Vec3::new(0.0, -1.0, -phi),
        Vec3::new(0.0, 1.0, -phi),
        Vec3::new(phi, 0.0, -1.0),
        Vec3::new(phi, 0.0, 1.0),
        Vec3::new(-phi, 0.0, -1.0),
        Vec3::new(-phi, 0.0, 1.0),
    ]
    .map(Vec3::normalize)
}

/// Split one face into `(detail + 1)^2` triangles, pushing corner triples.
fn subdivide_face(a: Vec3, b: Vec3, c: Vec3, detail: u32, out: &mut Vec<[Vec3; 3]>) {
    let cols = detail as usize + 1;

    // Row i runs from a→c and b→c blended by i / cols, with cols - i + 1 points.
    let grid: Vec<Vec<Vec3>> = (0..=cols)
        .map(|i| {
            let t = i as f32 / cols as f32;
            let aj = a.lerp(c, t);
            let bj = b.lerp(c, t);
            let rows = cols - i;
            (0..=rows)
                .map(|j| if rows == 0 { aj } else { aj.lerp(bj, j as f32 / rows as f32) })
                .collect()
        })
        .collect();

    for i in 0..cols {
        for j in 0..(2 * (cols - i) - 1) {
            let k = j / 2;
            if j % 2 == 0 {
                out.push([grid[i][k + 1], grid[i + 1][k], grid[i][k]]);
            } else {
                out.push([grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]);
            }
        }
    }
}

fn triangles(detail: u32) -> Vec<[Vec3; 3]> {
    let corners = icosahedron_vertices();
    let per_face = (detail as usize + 1).pow(2);
    let mut tris = Vec::with_capacity(ICOSAHEDRON_FACES.len() * per_face);
    for [a, b, c] in ICOSAHEDRON_FACES {
        subdivide_face(corners[a], corners[b], corners[c], detail, &mut tris);
    }
    tris
}

/// Sphere of `radius` built from an icosahedron subdivided `detail` times per edge.
pub fn icosphere(radius: f32, detail: u32) -> SphereMesh {
    let tris = triangles(detail);
    let mut vertices = Vec::with_capacity(tris.len() * 3);
    let mut line_indices = Vec::with_capacity(tris.len() * 6);
    for tri in &tris {
        let base = vertices.len() as u32;
        for corner in tri {
            let normal = corner.normalize();
            vertices.push(MeshVertex::new(normal * radius, normal));
        }
        line_indices.extend_from_slice(&[base, base + 1, base + 1, base + 2, base + 2, base]);
    }
    SphereMesh {
        vertices,
        line_indices,
    }
}

/// The 20-face icosahedron with per-face normals, for flat shading.
pub fn flat_icosahedron(radius: f32) -> Vec<MeshVertex> {
    let corners = icosahedron_vertices();
    let mut vertices = Vec::with_capacity(ICOSAHEDRON_FACES.len() * 3);
    for [a, b, c] in ICOSAHEDRON_FACES {
        let (a, b, c) = (corners[a] * radius, corners[b] * radius, corners[c] * radius);
        let normal = (b - a).cross(c - a).normalize();
        for p in [a, b, c] {
            vertices.push(MeshVertex::new(p, normal));
        }
    }
    vertices
}
