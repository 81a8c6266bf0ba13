//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes and primitives live in flat arrays addressed by index - an arena,
//! never a pointer tree. A node packs either two child indices or a
//! (primitive offset, primitive count) pair, distinguished by a reserved bit.

use lumen_core::{Material, Scene, Sphere, Vertex};
use lumen_math::{
    barycentric, interpolate_normal, interpolate_tex_coord, Aabb, Ray, Vec3,
};

use crate::intersect::{
    intersect_ray_with_aabb, intersect_ray_with_sphere, intersect_ray_with_triangle, HitInfo,
};

/// Maximum primitives per leaf node before splitting.
const LEAF_SIZE: usize = 4;

/// Anything that can answer closest-hit ray queries against a scene.
///
/// `ray.t` carries the query bound in and the closest hit distance out.
pub trait Intersector: Sync {
    fn intersect(&self, ray: &mut Ray, hit: &mut HitInfo) -> bool;
}

/// A triangle stored inside the BVH's leaf nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Primitive {
    /// Index of the scene mesh the vertices are sourced from
    pub mesh_id: u32,
    pub v0: Vertex,
    pub v1: Vertex,
    pub v2: Vertex,
}

impl Primitive {
    pub fn centroid(&self) -> Vec3 {
        (self.v0.position + self.v1.position + self.v2.position) / 3.0
    }

    pub fn bounding_box(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        bounds.grow(self.v0.position);
        bounds.grow(self.v1.position);
        bounds.grow(self.v2.position);
        bounds
    }
}

/// Packed BVH node; either an interior node with two children or a leaf
/// referring to a primitive range.
///
/// Layout of `data`, with the most significant bit of `data[0]` reserved as
/// the leaf flag:
/// - interior: `[left child index, right child index]`
/// - leaf:     `[offset into the primitive array | LEAF_BIT, primitive count]`
#[derive(Clone, Copy, Debug)]
pub struct Node {
    pub aabb: Aabb,
    data: [u32; 2],
}

impl Node {
    const LEAF_BIT: u32 = 1 << 31;

    fn leaf(aabb: Aabb, offset: u32, count: u32) -> Self {
        Self {
            aabb,
            data: [offset | Self::LEAF_BIT, count],
        }
    }

    fn interior(aabb: Aabb, left: u32, right: u32) -> Self {
        Self {
            aabb,
            data: [left, right],
        }
    }

    pub fn is_leaf(&self) -> bool {
        (self.data[0] & Self::LEAF_BIT) == Self::LEAF_BIT
    }

    pub fn primitive_offset(&self) -> u32 {
        self.data[0] & !Self::LEAF_BIT
    }

    pub fn primitive_count(&self) -> u32 {
        self.data[1]
    }

    pub fn left_child(&self) -> u32 {
        self.data[0]
    }

    pub fn right_child(&self) -> u32 {
        self.data[1]
    }
}

/// The scene intersector: a BVH over all mesh triangles, unified with a
/// linear sphere list. Built once per scene and immutable afterward.
pub struct Bvh {
    nodes: Vec<Node>,
    primitives: Vec<Primitive>,
    leaf_indices: Vec<u32>,
    root_idx: u32,
    num_levels: u32,
    /// Per-mesh materials, indexed by `Primitive::mesh_id`
    materials: Vec<Material>,
    spheres: Vec<Sphere>,
    use_accel: bool,
    smooth_normals: bool,
    texture_mapping: bool,
}

impl Bvh {
    /// Build the hierarchy over every triangle of every mesh in the scene.
    pub fn new(scene: &Scene, use_accel: bool) -> Self {
        let mut bvh = Self {
            nodes: Vec::new(),
            primitives: Vec::new(),
            leaf_indices: Vec::new(),
            root_idx: 0,
            num_levels: 0,
            materials: scene.meshes.iter().map(|m| m.material.clone()).collect(),
            spheres: scene.spheres.clone(),
            use_accel,
            smooth_normals: true,
            texture_mapping: true,
        };

        let mut all_primitives = Self::build_primitives(scene);
        bvh.primitives.reserve(all_primitives.len());
        bvh.root_idx = bvh.construct_recursive(&mut all_primitives, 0);
        log::debug!(
            "built BVH: {} primitives, {} nodes, {} leaves, {} levels",
            bvh.primitives.len(),
            bvh.nodes.len(),
            bvh.leaf_indices.len(),
            bvh.num_levels
        );
        bvh
    }

    /// Control smooth-normal and texture-coordinate interpolation; with both
    /// disabled, hits carry the flat plane normal and no texture coordinate.
    pub fn with_interpolation(mut self, smooth_normals: bool, texture_mapping: bool) -> Self {
        self.smooth_normals = smooth_normals;
        self.texture_mapping = texture_mapping;
        self
    }

    /// Number of levels in the constructed tree.
    pub fn num_levels(&self) -> u32 {
        self.num_levels
    }

    /// Number of leaf nodes in the constructed tree.
    pub fn num_leaves(&self) -> usize {
        self.leaf_indices.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn leaf_indices(&self) -> &[u32] {
        &self.leaf_indices
    }

    /// Gather all mesh triangles as primitives.
    fn build_primitives(scene: &Scene) -> Vec<Primitive> {
        let num_triangles: usize = scene.meshes.iter().map(|m| m.triangles.len()).sum();
        let mut primitives = Vec::with_capacity(num_triangles);
        for (mesh_id, mesh) in scene.meshes.iter().enumerate() {
            for tri in &mesh.triangles {
                primitives.push(Primitive {
                    mesh_id: mesh_id as u32,
                    v0: mesh.vertices[tri[0] as usize],
                    v1: mesh.vertices[tri[1] as usize],
                    v2: mesh.vertices[tri[2] as usize],
                });
            }
        }
        primitives
    }

    fn bounding_box(primitives: &[Primitive]) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for primitive in primitives {
            bounds = Aabb::surrounding(&bounds, &primitive.bounding_box());
        }
        bounds
    }

    /// Recursively construct the subtree covering `primitives`, returning the
    /// index of its root node.
    ///
    /// Leaf primitives are appended to the flat primitive array in visitation
    /// order; interior nodes sort their sub-range by centroid along the
    /// longest axis of the node bounds and split at the median.
    fn construct_recursive(&mut self, primitives: &mut [Primitive], level: u32) -> u32 {
        self.num_levels = self.num_levels.max(level + 1);
        let bounds = Self::bounding_box(primitives);

        if primitives.len() <= LEAF_SIZE {
            let node = Node::leaf(bounds, self.primitives.len() as u32, primitives.len() as u32);
            let node_index = self.nodes.len() as u32;
            self.primitives.extend_from_slice(primitives);
            self.leaf_indices.push(node_index);
            self.nodes.push(node);
            return node_index;
        }

        let axis = bounds.longest_axis();
        primitives.sort_unstable_by(|a, b| {
            a.centroid()[axis]
                .partial_cmp(&b.centroid()[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = primitives.len() / 2;
        let (left_half, right_half) = primitives.split_at_mut(mid);
        let left_child = self.construct_recursive(left_half, level + 1);
        let right_child = self.construct_recursive(right_half, level + 1);

        let node_index = self.nodes.len() as u32;
        self.nodes.push(Node::interior(bounds, left_child, right_child));
        node_index
    }

    /// Test one stored primitive, filling in interpolated surface data on a hit.
    fn intersect_primitive(&self, primitive: &Primitive, ray: &mut Ray, hit: &mut HitInfo) -> bool {
        if !intersect_ray_with_triangle(
            primitive.v0.position,
            primitive.v1.position,
            primitive.v2.position,
            ray,
            hit,
        ) {
            return false;
        }

        let bary = barycentric(
            primitive.v0.position,
            primitive.v1.position,
            primitive.v2.position,
            ray.hit_position(),
        );
        hit.barycentric = bary;
        if self.smooth_normals {
            hit.normal = interpolate_normal(
                primitive.v0.normal,
                primitive.v1.normal,
                primitive.v2.normal,
                bary,
            );
        }
        if self.texture_mapping {
            hit.tex_coord = interpolate_tex_coord(
                primitive.v0.tex_coord,
                primitive.v1.tex_coord,
                primitive.v2.tex_coord,
                bary,
            );
        }
        hit.material = self.materials[primitive.mesh_id as usize].clone();
        true
    }

    fn intersect_recursive(&self, node: &Node, ray: &mut Ray, hit: &mut HitInfo) -> bool {
        // The box test alone must not tighten the hit bound; restore t no
        // matter what it reported.
        let t_original = ray.t;
        let hit_box = intersect_ray_with_aabb(node.aabb.lower, node.aabb.upper, ray);
        ray.t = t_original;
        if !hit_box {
            return false;
        }

        if node.is_leaf() {
            let first = node.primitive_offset() as usize;
            let last = first + node.primitive_count() as usize;
            let mut any_hit = false;
            for primitive in &self.primitives[first..last] {
                any_hit |= self.intersect_primitive(primitive, ray, hit);
            }
            any_hit
        } else {
            // Both children unconditionally; every triangle test re-checks
            // against the live t, so traversal order cannot affect the result.
            let hit_left =
                self.intersect_recursive(&self.nodes[node.left_child() as usize], ray, hit);
            let hit_right =
                self.intersect_recursive(&self.nodes[node.right_child() as usize], ray, hit);
            hit_left || hit_right
        }
    }

    fn intersect_accelerated(&self, ray: &mut Ray, hit: &mut HitInfo) -> bool {
        let mut any_hit =
            self.intersect_recursive(&self.nodes[self.root_idx as usize], ray, hit);
        for sphere in &self.spheres {
            any_hit |= intersect_ray_with_sphere(sphere, ray, hit);
        }
        any_hit
    }

    /// Linear scan of every triangle and sphere; functionally equivalent to
    /// the accelerated path and kept for correctness testing.
    pub fn intersect_naive(&self, ray: &mut Ray, hit: &mut HitInfo) -> bool {
        let mut any_hit = false;
        for primitive in &self.primitives {
            any_hit |= self.intersect_primitive(primitive, ray, hit);
        }
        for sphere in &self.spheres {
            any_hit |= intersect_ray_with_sphere(sphere, ray, hit);
        }
        any_hit
    }
}

impl Intersector for Bvh {
    fn intersect(&self, ray: &mut Ray, hit: &mut HitInfo) -> bool {
        if self.use_accel {
            self.intersect_accelerated(ray, hit)
        } else {
            self.intersect_naive(ray, hit)
        }
    }
}
