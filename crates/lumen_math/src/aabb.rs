use crate::Vec3;

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Stored as two corner points; `lower` is componentwise <= `upper` for any
/// box produced by the constructors below.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub lower: Vec3,
    pub upper: Vec3,
}

impl Aabb {
    /// Create an AABB from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            lower: box0.lower.min(box1.lower),
            upper: box0.upper.max(box1.upper),
        }
    }

    /// Grow the box to contain the given point.
    pub fn grow(&mut self, p: Vec3) {
        self.lower = self.lower.min(p);
        self.upper = self.upper.max(p);
    }

    /// Returns true if the point lies inside or on the boundary of the box.
    pub fn contains(&self, p: Vec3) -> bool {
        self.lower.cmple(p).all() && p.cmple(self.upper).all()
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &Aabb) -> bool {
        self.contains(other.lower) && self.contains(other.upper)
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.lower + self.upper) * 0.5
    }

    /// Per-axis extent of the box.
    pub fn size(&self) -> Vec3 {
        self.upper - self.lower
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// An empty AABB (contains nothing; grows from any union).
    pub const EMPTY: Aabb = Aabb {
        lower: Vec3::splat(f32::INFINITY),
        upper: Vec3::splat(f32::NEG_INFINITY),
    };
}
