//! Mesh geometry representation.

use lumen_math::{Aabb, Vec2, Vec3};

use crate::material::Material;

/// A single mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// A vertex with only a position; normal defaults to +Y.
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Vec3::Y, Vec2::ZERO)
    }
}

/// A triangle mesh with indexed vertices and a single material.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Triangle indices into `vertices`
    pub triangles: Vec<[u32; 3]>,
    pub material: Material,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<[u32; 3]>, material: Material) -> Self {
        Self {
            vertices,
            triangles,
            material,
        }
    }

    /// Build a single-triangle mesh with a flat normal.
    pub fn triangle(v0: Vec3, v1: Vec3, v2: Vec3, material: Material) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize();
        let vertices = vec![
            Vertex::new(v0, normal, Vec2::ZERO),
            Vertex::new(v1, normal, Vec2::new(1.0, 0.0)),
            Vertex::new(v2, normal, Vec2::new(0.0, 1.0)),
        ];
        Self::new(vertices, vec![[0, 1, 2]], material)
    }

    /// Build a two-triangle quad from a corner and two edge vectors.
    pub fn quad(origin: Vec3, edge_u: Vec3, edge_v: Vec3, material: Material) -> Self {
        let normal = edge_u.cross(edge_v).normalize();
        let vertices = vec![
            Vertex::new(origin, normal, Vec2::ZERO),
            Vertex::new(origin + edge_u, normal, Vec2::new(1.0, 0.0)),
            Vertex::new(origin + edge_u + edge_v, normal, Vec2::new(1.0, 1.0)),
            Vertex::new(origin + edge_v, normal, Vec2::new(0.0, 1.0)),
        ];
        Self::new(vertices, vec![[0, 1, 2], [0, 2, 3]], material)
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Each vertex normal becomes the normalized average of the face normals
    /// of every triangle sharing that vertex.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for tri in &self.triangles {
            let p0 = self.vertices[tri[0] as usize].position;
            let p1 = self.vertices[tri[1] as usize].position;
            let p2 = self.vertices[tri[2] as usize].position;
            let face_normal = (p1 - p0).cross(p2 - p0);

            for &idx in tri {
                normals[idx as usize] += face_normal;
            }
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            if normal.length_squared() > 0.0 {
                vertex.normal = normal.normalize();
            }
        }
    }

    /// Axis-aligned bounds over all vertex positions.
    pub fn bounding_box(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for vertex in &self.vertices {
            bounds.grow(vertex.position);
        }
        bounds
    }
}
