//! Scene aggregate and procedural builders.

use lumen_math::{Aabb, Vec3};

use crate::light::Light;
use crate::material::Material;
use crate::mesh::Mesh;

/// An analytic sphere primitive.
#[derive(Clone, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(
            self.center - Vec3::splat(self.radius),
            self.center + Vec3::splat(self.radius),
        )
    }
}

/// A renderable scene: triangle meshes, analytic spheres, and lights.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub spheres: Vec<Sphere>,
    pub lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> &mut Self {
        self.meshes.push(mesh);
        self
    }

    pub fn add_sphere(&mut self, sphere: Sphere) -> &mut Self {
        self.spheres.push(sphere);
        self
    }

    pub fn add_light(&mut self, light: Light) -> &mut Self {
        self.lights.push(light);
        self
    }

    /// Bounds over all geometry (lights excluded).
    pub fn bounding_box(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for mesh in &self.meshes {
            bounds = Aabb::surrounding(&bounds, &mesh.bounding_box());
        }
        for sphere in &self.spheres {
            bounds = Aabb::surrounding(&bounds, &sphere.bounding_box());
        }
        bounds
    }

    /// A single unit triangle in the XY plane, lit by one point light.
    pub fn single_triangle() -> Self {
        let mut scene = Scene::new();
        scene.add_mesh(Mesh::triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Material::diffuse(Vec3::splat(0.8)),
        ));
        scene.add_light(Light::Point {
            position: Vec3::new(0.3, 0.3, -2.0),
            color: Vec3::ONE,
        });
        scene
    }

    /// The classic Cornell box: five walls, two inner blocks reduced to a
    /// short box, and a parallelogram light just under the ceiling.
    pub fn cornell_box() -> Self {
        let white = Material::diffuse(Vec3::splat(0.73));
        let red = Material::diffuse(Vec3::new(0.65, 0.05, 0.05));
        let green = Material::diffuse(Vec3::new(0.12, 0.45, 0.15));

        let mut scene = Scene::new();
        // Floor, ceiling, back wall
        scene.add_mesh(Mesh::quad(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            white.clone(),
        ));
        scene.add_mesh(Mesh::quad(
            Vec3::new(-1.0, 2.0, -1.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(2.0, 0.0, 0.0),
            white.clone(),
        ));
        scene.add_mesh(Mesh::quad(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            white.clone(),
        ));
        // Left (red) and right (green) walls
        scene.add_mesh(Mesh::quad(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 2.0, 0.0),
            red,
        ));
        scene.add_mesh(Mesh::quad(
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            green,
        ));
        // Short box stand-in
        scene.add_sphere(Sphere::new(
            Vec3::new(-0.35, 0.35, -0.3),
            0.35,
            Material::specular(Vec3::splat(0.6), Vec3::splat(0.3), 32.0),
        ));

        scene.add_light(Light::parallelogram_uniform(
            Vec3::new(-0.25, 1.98, -0.25),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::splat(4.0),
        ));
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_bounding_box_spans_all_geometry() {
        let mut scene = Scene::new();
        scene.add_mesh(Mesh::triangle(
            Vec3::new(-2.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Material::default(),
        ));
        scene.add_sphere(Sphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0, Material::default()));

        let bounds = scene.bounding_box();
        assert_eq!(bounds.lower.x, -2.0);
        assert_eq!(bounds.upper.x, 4.0);
    }

    #[test]
    fn test_cornell_box_has_light() {
        let scene = Scene::cornell_box();
        assert!(!scene.lights.is_empty());
        assert!(!scene.meshes.is_empty());
        assert!(!scene.spheres.is_empty());
    }
}
