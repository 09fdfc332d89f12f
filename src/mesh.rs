//! CPU-side mesh data and the procedural generators used by the labs.
//!
//! Vertices are interleaved as position, normal, texture coordinate and
//! colour. Triangle meshes wind counter-clockwise; line meshes hold index
//! pairs.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::Color;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
            color: [1.0; 4],
        }
    }

    /// Position-only vertex for line meshes.
    pub fn line(position: Vec3, color: Color) -> Self {
        Self {
            position: position.into(),
            normal: [0.0; 3],
            uv: [0.0; 2],
            color: color.to_linear().into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    Triangles,
    Lines,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl MeshData {
    fn triangles() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology: Topology::Triangles,
        }
    }

    fn lines() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology: Topology::Lines,
        }
    }

    fn push_segment(&mut self, a: Vec3, b: Vec3, color: Color) {
        let base = self.vertices.len() as u32;
        self.vertices.push(Vertex::line(a, color));
        self.vertices.push(Vertex::line(b, color));
        self.indices.extend_from_slice(&[base, base + 1]);
    }

    /// Axis-aligned box centred on the origin with per-face normals.
    pub fn cube(width: f32, height: f32, length: f32) -> Self {
        let half = Vec3::new(width, height, length) / 2.0;
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        ];

        let mut mesh = Self::triangles();
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            let center = normal * half;
            let du = u * half;
            let dv = v * half;
            for (su, sv, uv) in [
                (-1.0, -1.0, Vec2::new(0.0, 1.0)),
                (1.0, -1.0, Vec2::new(1.0, 1.0)),
                (1.0, 1.0, Vec2::new(1.0, 0.0)),
                (-1.0, 1.0, Vec2::new(0.0, 0.0)),
            ] {
                mesh.vertices
                    .push(Vertex::new(center + du * su + dv * sv, normal, uv));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Flat plane in XZ facing +Y, subdivided `res_x` by `res_z` times.
    pub fn plane(width: f32, length: f32, res_x: u32, res_z: u32) -> Self {
        let res_x = res_x.max(1);
        let res_z = res_z.max(1);
        let mut mesh = Self::triangles();
        for z in 0..=res_z {
            let tz = z as f32 / res_z as f32;
            for x in 0..=res_x {
                let tx = x as f32 / res_x as f32;
                let position = Vec3::new((tx - 0.5) * width, 0.0, (tz - 0.5) * length);
                mesh.vertices
                    .push(Vertex::new(position, Vec3::Y, Vec2::new(tx, tz)));
            }
        }
        let row = res_x + 1;
        for z in 0..res_z {
            for x in 0..res_x {
                let i = z * row + x;
                mesh.indices
                    .extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
            }
        }
        mesh
    }

    /// UV sphere with `rings` latitude bands and `slices` longitude segments.
    pub fn sphere(radius: f32, rings: u32, slices: u32) -> Self {
        let rings = rings.max(2);
        let slices = slices.max(3);
        let mut mesh = Self::triangles();
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * PI;
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let phi = u * TAU;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                mesh.vertices
                    .push(Vertex::new(normal * radius, normal, Vec2::new(u, v)));
            }
        }
        let row = slices + 1;
        for ring in 0..rings {
            for slice in 0..slices {
                let i = ring * row + slice;
                mesh.indices
                    .extend_from_slice(&[i, i + 1, i + row, i + 1, i + row + 1, i + row]);
            }
        }
        mesh
    }

    /// Quad in XZ facing +Y whose texture coordinates run to `uv_repeat`,
    /// so a repeating sampler tiles the texture.
    pub fn textured_quad(width: f32, length: f32, uv_repeat: f32) -> Self {
        let hw = width / 2.0;
        let hl = length / 2.0;
        let mut mesh = Self::triangles();
        for (position, uv) in [
            (Vec3::new(-hw, 0.0, hl), Vec2::new(0.0, 0.0)),
            (Vec3::new(hw, 0.0, hl), Vec2::new(uv_repeat, 0.0)),
            (Vec3::new(hw, 0.0, -hl), Vec2::new(uv_repeat, uv_repeat)),
            (Vec3::new(-hw, 0.0, -hl), Vec2::new(0.0, uv_repeat)),
        ] {
            mesh.vertices.push(Vertex::new(position, Vec3::Y, uv));
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        mesh
    }

    /// The twelve edges of a box centred on the origin.
    pub fn cube_wires(width: f32, height: f32, length: f32) -> Self {
        let h = Vec3::new(width, height, length) / 2.0;
        let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);
        let mut mesh = Self::lines();
        for (a, b) in [
            // front
            (corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0)),
            (corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0)),
            (corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)),
            (corner(-1.0, 1.0, 1.0), corner(-1.0, -1.0, 1.0)),
            // back
            (corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0)),
            (corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0)),
            (corner(1.0, 1.0, -1.0), corner(-1.0, 1.0, -1.0)),
            (corner(-1.0, 1.0, -1.0), corner(-1.0, -1.0, -1.0)),
            // connecting
            (corner(-1.0, -1.0, 1.0), corner(-1.0, -1.0, -1.0)),
            (corner(1.0, -1.0, 1.0), corner(1.0, -1.0, -1.0)),
            (corner(1.0, 1.0, 1.0), corner(1.0, 1.0, -1.0)),
            (corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0)),
        ] {
            mesh.push_segment(a, b, Color::WHITE);
        }
        mesh
    }

    /// Latitude rings and longitude meridians of a sphere.
    pub fn sphere_wires(radius: f32, rings: u32, slices: u32) -> Self {
        let rings = rings.max(2);
        let slices = slices.max(3);
        let point = |theta: f32, phi: f32| {
            Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()) * radius
        };
        let mut mesh = Self::lines();
        for ring in 1..rings {
            let theta = ring as f32 / rings as f32 * PI;
            for slice in 0..slices {
                let a = slice as f32 / slices as f32 * TAU;
                let b = (slice + 1) as f32 / slices as f32 * TAU;
                mesh.push_segment(point(theta, a), point(theta, b), Color::WHITE);
            }
        }
        for slice in 0..slices {
            let phi = slice as f32 / slices as f32 * TAU;
            for ring in 0..rings {
                let a = ring as f32 / rings as f32 * PI;
                let b = (ring + 1) as f32 / rings as f32 * PI;
                mesh.push_segment(point(a, phi), point(b, phi), Color::WHITE);
            }
        }
        mesh
    }

    /// Ground grid of `slices` cells per side, centred on the origin. The
    /// two centre lines are darker.
    pub fn grid(slices: u32, spacing: f32) -> Self {
        let half = slices as i32 / 2;
        let extent = half as f32 * spacing;
        let mut mesh = Self::lines();
        for i in -half..=half {
            let color = if i == 0 {
                Color::rgba(128, 128, 128, 255)
            } else {
                Color::rgba(191, 191, 191, 255)
            };
            let offset = i as f32 * spacing;
            mesh.push_segment(
                Vec3::new(offset, 0.0, -extent),
                Vec3::new(offset, 0.0, extent),
                color,
            );
            mesh.push_segment(
                Vec3::new(-extent, 0.0, offset),
                Vec3::new(extent, 0.0, offset),
                color,
            );
        }
        mesh
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_bounds(mesh: &MeshData) -> bool {
        mesh.indices
            .iter()
            .all(|&index| (index as usize) < mesh.vertices.len())
    }

    #[test]
    fn cube_has_four_vertices_per_face() {
        let cube = MeshData::cube(5.0, 5.0, 5.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(indices_in_bounds(&cube));
        for vertex in &cube.vertices {
            let p = Vec3::from(vertex.position);
            assert!((p.abs().max_element() - 2.5).abs() < 1e-6);
        }
    }

    #[test]
    fn cube_triangles_face_outwards() {
        let cube = MeshData::cube(2.0, 4.0, 2.0);
        for tri in cube.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(cube.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            let normal = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face_normal.dot(normal) > 0.0);
        }
    }

    #[test]
    fn sphere_triangles_face_outwards() {
        let sphere = MeshData::sphere(1.0, 16, 12);
        let mut checked = 0;
        for tri in sphere.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(sphere.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            // Pole rows collapse to a point.
            if face_normal.length_squared() < 1e-10 {
                continue;
            }
            assert!(face_normal.dot(a + b + c) > 0.0);
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn quad_faces_up() {
        let quad = MeshData::textured_quad(4.0, 2.0, 1.0);
        for tri in quad.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(quad.vertices[i as usize].position));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn plane_subdivisions() {
        let plane = MeshData::plane(40.0, 40.0, 5, 5);
        assert_eq!(plane.vertices.len(), 36);
        assert_eq!(plane.indices.len(), 5 * 5 * 6);
        assert!(indices_in_bounds(&plane));
        assert!(plane.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn plane_faces_up() {
        let plane = MeshData::plane(10.0, 10.0, 3, 3);
        for tri in plane.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(plane.vertices[i as usize].position));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn sphere_normals_are_unit_and_radius_scaled() {
        let sphere = MeshData::sphere(2.0, 16, 16);
        assert_eq!(sphere.vertices.len(), 17 * 17);
        assert!(indices_in_bounds(&sphere));
        for vertex in &sphere.vertices {
            let n = Vec3::from(vertex.normal);
            assert!((n.length() - 1.0).abs() < 1e-4);
            assert!((Vec3::from(vertex.position).length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn quad_uv_repeats() {
        let quad = MeshData::textured_quad(100.0, 100.0, 2.0);
        let max_uv = quad
            .vertices
            .iter()
            .map(|v| v.uv[0].max(v.uv[1]))
            .fold(0.0_f32, f32::max);
        assert_eq!(max_uv, 2.0);
    }

    #[test]
    fn wire_meshes_are_line_lists() {
        let wires = MeshData::cube_wires(1.0, 1.0, 1.0);
        assert_eq!(wires.topology, Topology::Lines);
        assert_eq!(wires.indices.len(), 24);

        let sphere = MeshData::sphere_wires(1.0, 20, 10);
        assert_eq!(sphere.indices.len() % 2, 0);
        assert!(indices_in_bounds(&sphere));
    }

    #[test]
    fn grid_spans_slices_times_spacing() {
        let grid = MeshData::grid(20, 5.0);
        // 21 lines per axis
        assert_eq!(grid.indices.len(), 21 * 2 * 2);
        let max = grid
            .vertices
            .iter()
            .map(|v| v.position[0].abs())
            .fold(0.0_f32, f32::max);
        assert_eq!(max, 50.0);
    }
}
